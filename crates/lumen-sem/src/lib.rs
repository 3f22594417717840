//! Elaboration: the semantic-analysis phase between parsing and codegen.
//!
//! Consumes the [`lumen_ast::Program`] the parser built (types already
//! threaded through a shared [`lumen_ast::Environment`], but declaration
//! sites and conversions not yet checked), and returns the same shape
//! with every expression's type slot filled and every implicit
//! conversion materialized as an explicit `TypeConv` node.

mod elaborator;
pub mod error;

pub use elaborator::{elaborate_program, Elaborator};
pub use error::{SemError, SemResult};

#[cfg(test)]
mod tests {
    use lumen_ast::Program;
    use lumen_par::Parser;
    use lumen_types::TypeContext;
    use lumen_util::{DefIdGenerator, FileId, Handler};

    use super::*;

    /// Runs the full parse → elaborate pipeline on one source snippet in
    /// `PROGRAM` mode, returning the elaborated globals.
    fn elaborate_source(src: &str) -> SemResult<Program> {
        let types = TypeContext::new();
        let mut ids = DefIdGenerator::new();
        let mut parser = Parser::new(src, FileId::ROOT, &types, &mut ids).expect("lexes");
        let program = parser.parse_program().expect("parses");
        let handler = Handler::new();
        elaborate_program(&types, &handler, program)
    }

    fn only_global_ty(program: &Program) -> String {
        use lumen_ast::StmtKind;
        match &program.globals.last().expect("one global").kind {
            StmtKind::Declaration { declared_ty: Some(t), .. } => t.to_string(),
            other => panic!("expected a declaration, found {other:?}"),
        }
    }

    #[test]
    fn let_with_declared_float_type_converts_int_literal() {
        let program = elaborate_source("let x: float = 3;").expect("elaborates");
        assert_eq!(only_global_ty(&program), "float");
    }

    #[test]
    fn mixed_int_float_arithmetic_settles_on_float() {
        let program = elaborate_source("let x = 1 + 2.0;").expect("elaborates");
        assert_eq!(only_global_ty(&program), "float");
    }

    #[test]
    fn double_negation_of_int_stays_int() {
        let program = elaborate_source("let x = -(-7);").expect("elaborates");
        assert_eq!(only_global_ty(&program), "int");
    }

    #[test]
    fn if_without_else_branch_yields_optional() {
        let program = elaborate_source("let x = if true 1 else 2.0;").expect("elaborates");
        assert_eq!(only_global_ty(&program), "float");
    }

    #[test]
    fn if_with_void_else_yields_optional() {
        let program = elaborate_source("let x = if true 1 else void;").expect("elaborates");
        assert_eq!(only_global_ty(&program), "optional[int]");
    }

    #[test]
    fn type_alias_tracks_underlying_convertibility() {
        let program = elaborate_source("type Id = int; let y: Id = 97;").expect("elaborates");
        assert_eq!(only_global_ty(&program), "Id");
    }

    #[test]
    fn class_call_produces_its_struct_type() {
        let program = elaborate_source("class P { x: int; y: int; } let p = P(1, 2);").expect("elaborates");
        assert_eq!(only_global_ty(&program), "struct{x: int, y: int}");
    }

    #[test]
    fn self_inside_a_class_field_default_resolves_to_the_class_struct() {
        let program = elaborate_source(
            "class P { x: int = 0; y: int = self.x; }",
        )
        .expect("elaborates");
        use lumen_ast::StmtKind;
        match &program.globals[0].kind {
            StmtKind::Class { fields, .. } => {
                let y = &fields[1];
                let default = y.default.as_ref().expect("y has a default");
                assert_eq!(default.ty().expect("typed").to_string(), "int");
            }
            other => panic!("expected a class, found {other:?}"),
        }
    }

    #[test]
    fn self_inside_an_impl_for_member_resolves_against_the_target_class() {
        let program = elaborate_source(
            "class P { x: int = 0; } impl Getter { getx: fn() -> int; } impl Getter for P { getx: fn() -> int = fn() -> int { yield self.x; }; }",
        )
        .expect("elaborates");
        use lumen_ast::StmtKind;
        match &program.globals[2].kind {
            StmtKind::Impl { members, .. } => {
                let getx = &members[0];
                let default = getx.default.as_ref().expect("getx has a default");
                assert_eq!(default.ty().expect("typed").to_string(), "fn() -> int");
            }
            other => panic!("expected an impl, found {other:?}"),
        }
    }

    #[test]
    fn non_bool_condition_is_rejected() {
        let err = elaborate_source("let x = if 1 2 else 3;").unwrap_err();
        assert!(matches!(err, SemError::NonBoolCondition { .. }));
    }

    #[test]
    fn undeclared_name_is_rejected() {
        let err = elaborate_source("let x = y + 1;").unwrap_err();
        assert!(matches!(err, SemError::Undeclared { .. }));
    }

    #[test]
    fn recursive_function_binding_resolves_its_own_name() {
        let program = elaborate_source(
            "let fact = fn(n: int) -> int { yield if n <= 1 1 else n * fact(n - 1); };",
        )
        .expect("elaborates");
        assert_eq!(only_global_ty(&program), "fn(int) -> int");
    }

    #[test]
    fn reelaborating_an_already_elaborated_program_is_idempotent() {
        let program = elaborate_source("let x: float = 3;").expect("elaborates");
        let types = TypeContext::new();
        let handler = Handler::new();
        let program = elaborate_program(&types, &handler, program).expect("re-elaborates");
        assert_eq!(only_global_ty(&program), "float");
    }
}

//! The recursive-descent parser: token stream to typed AST, built inside a
//! lexically scoped [`lumen_ast::Environment`] tree.
//!
//! Three entry modes per `spec.md` §4.1: [`Parser::parse_program`] (zero
//! or more globals), [`Parser::parse_expr_entry`] (one expression), and
//! [`Parser::parse_type_entry`] (one type). Semantic type work (name
//! resolution beyond syntactic lookup, convertibility, conversion
//! insertion) is deferred entirely to `lumen-sem`.

mod expr;
mod items;
mod stmt;
mod types;

pub mod error;
pub mod parser;

pub use error::{ParseError, ParseResult};
pub use parser::{ImplClassContext, Parser};

/// Parse-then-print round-trip property (`spec.md` §8): for every
/// expression without comments, `parse` followed by [`lumen_ast::print_expr`]
/// produces text that re-parses to a structurally identical tree.
#[cfg(test)]
mod roundtrip_tests {
    use lumen_ast::{expr_structurally_eq, print_expr};
    use lumen_types::TypeContext;
    use lumen_util::{DefIdGenerator, FileId};

    use crate::Parser;

    fn parse_one(src: &str) -> lumen_ast::Expr {
        let types = TypeContext::new();
        let mut ids = DefIdGenerator::new();
        let mut parser = Parser::new(src, FileId::ROOT, &types, &mut ids).expect("lexes");
        parser.parse_expr_entry().expect("parses")
    }

    fn assert_round_trips(src: &str) {
        let first = parse_one(src);
        let printed = print_expr(&first);
        let second = parse_one(&printed);
        assert!(
            expr_structurally_eq(&first, &second),
            "round-trip mismatch for `{src}`: printed as `{printed}`"
        );
    }

    #[test]
    fn arithmetic_expression_round_trips() {
        assert_round_trips("1 + 2 * 3 - 4 / 2");
    }

    #[test]
    fn comparison_and_logic_round_trip() {
        assert_round_trips("1 < 2 && 3 >= 4 || !true");
    }

    #[test]
    fn unary_and_bitwise_round_trip() {
        assert_round_trips("-x + (!y) | z ^ w & 1");
    }

    #[test]
    fn nested_calls_and_member_access_round_trip() {
        assert_round_trips("a.b(c, d.e(1, 2)).f");
    }

    #[test]
    fn if_else_round_trips() {
        assert_round_trips("if x 1 else 2");
    }

    #[test]
    fn if_without_else_round_trips() {
        assert_round_trips("if x 1");
    }

    #[test]
    fn while_loop_round_trips() {
        assert_round_trips("while x x");
    }

    #[test]
    fn block_with_statements_round_trips() {
        assert_round_trips("{ let a = 1; let b = 2; a + b; }");
    }

    #[test]
    fn function_literal_round_trips() {
        assert_round_trips("fn(x: int, y: int) -> int { yield x + y; }");
    }

    #[test]
    fn string_and_char_literals_round_trip() {
        assert_round_trips("\"ab\"");
        assert_round_trips("'a'");
    }

    #[test]
    fn float_and_assignment_round_trip() {
        assert_round_trips("x = 3.5");
    }

    #[test]
    fn convert_call_round_trips() {
        assert_round_trips("convert(float, 1)");
    }
}

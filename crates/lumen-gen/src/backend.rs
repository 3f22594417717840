//! The codegen contract (`spec.md` §6's "Codegen contract", expanded in
//! `SPEC_FULL.md` §6.3 into an actual Rust trait): what the elaborated-AST
//! walker in [`crate::codegen`] asks of an IR builder, without committing
//! this crate to any one backend. `lumen-drv` wires a concrete
//! implementation in; this crate ships none (see `DESIGN.md`).

use lumen_ast::BinOp;
use lumen_types::Bottom;

/// An IR builder capable of emitting the exact shapes `spec.md` §6 lists.
/// `Value`/`Block` are opaque handles the backend defines; the walker
/// never inspects them, only threads them between calls.
pub trait CodegenBackend {
    type Value: Clone;
    type Block: Clone;

    fn const_int(&mut self, value: i32) -> Self::Value;
    fn const_float(&mut self, value: f64) -> Self::Value;
    fn const_bool(&mut self, value: bool) -> Self::Value;
    fn const_char(&mut self, value: u8) -> Self::Value;
    /// A null-terminated byte array with global storage.
    fn const_string(&mut self, bytes: &[u8]) -> Self::Value;

    /// The natural IR instruction for `op` over two `Int`-typed operands
    /// (signed arithmetic/comparison).
    fn binary_int(&mut self, op: BinOp, lhs: Self::Value, rhs: Self::Value) -> Self::Value;
    /// The natural IR instruction for `op` over two `Float`-typed operands
    /// (IEEE arithmetic/comparison).
    fn binary_float(&mut self, op: BinOp, lhs: Self::Value, rhs: Self::Value) -> Self::Value;
    /// The natural IR instruction for `op` over two `Bool`-typed operands
    /// (bitwise `and`/`or`/`xor`).
    fn binary_bool(&mut self, op: BinOp, lhs: Self::Value, rhs: Self::Value) -> Self::Value;

    /// Prefix `-` on an `Int`: multiplication by -1 of the integer kind.
    fn neg_int(&mut self, value: Self::Value) -> Self::Value;
    /// Prefix `-` on a `Float`: multiplication by -1 of the float kind.
    fn neg_float(&mut self, value: Self::Value) -> Self::Value;
    /// Prefix `!` on an `Int`: XOR with all-ones.
    fn not_int(&mut self, value: Self::Value) -> Self::Value;
    /// Prefix `!` on a `Bool`: logical NOT.
    fn not_bool(&mut self, value: Self::Value) -> Self::Value;

    /// An implicit or explicit numeric `TypeConv` between two `Bottom`
    /// kinds; `Int -> Float` is signed-int-to-float, everything else maps
    /// to the natural IR coercion the backend knows for that pair.
    fn convert_numeric(&mut self, from: Bottom, to: Bottom, value: Self::Value) -> Self::Value;

    fn current_block(&mut self) -> Self::Block;
    fn new_block(&mut self, label: &str) -> Self::Block;
    fn switch_to_block(&mut self, block: &Self::Block);
    fn branch(&mut self, target: &Self::Block);
    fn cond_branch(&mut self, cond: Self::Value, then_block: &Self::Block, else_block: &Self::Block);
    /// A phi node joining `incoming` values at the current block — used
    /// for `If`-as-expression when both branches yield a value.
    fn phi(&mut self, incoming: &[(Self::Value, Self::Block)]) -> Self::Value;

    /// A stack slot for a `Declaration`.
    fn alloca(&mut self, name: &str) -> Self::Value;
    fn store(&mut self, slot: &Self::Value, value: Self::Value);
    fn load(&mut self, slot: &Self::Value) -> Self::Value;

    fn call_function(&mut self, callee: Self::Value, args: &[Self::Value]) -> Self::Value;
    fn call_struct_ctor(&mut self, struct_name: &str, args: &[Self::Value]) -> Self::Value;
    fn call_list_index(&mut self, list: Self::Value, index: Self::Value) -> Self::Value;

    fn ret(&mut self, value: Option<Self::Value>);
}

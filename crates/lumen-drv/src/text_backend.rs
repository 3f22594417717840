//! A textual stand-in for the real LLVM-backed [`CodegenBackend`]
//! (`lumen-gen`'s trait has no concrete implementation shipped — see
//! `DESIGN.md`). Grounded on the teacher's `faxc-gen::AsmGenerator`
//! pattern of accumulating a `String` of emitted instructions and handing
//! it back through `output()`/`into_output()` for the driver to write to
//! disk verbatim; here the "assembly" is one line per IR operation rather
//! than a real target's mnemonics, since no target machine is wired in.

use lumen_ast::BinOp;
use lumen_gen::CodegenBackend;
use lumen_types::Bottom;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reg(String);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Label(String);

pub struct TextBackend {
    buf: String,
    next_reg: u32,
    next_block: u32,
    current: Label,
}

impl TextBackend {
    pub fn new() -> Self {
        TextBackend {
            buf: String::new(),
            next_reg: 0,
            next_block: 0,
            current: Label("entry".to_string()),
        }
    }

    pub fn into_output(self) -> String {
        self.buf
    }

    fn fresh_reg(&mut self) -> Reg {
        let reg = Reg(format!("%{}", self.next_reg));
        self.next_reg += 1;
        reg
    }

    fn emit(&mut self, line: impl AsRef<str>) {
        self.buf.push_str(line.as_ref());
        self.buf.push('\n');
    }
}

impl Default for TextBackend {
    fn default() -> Self {
        TextBackend::new()
    }
}

impl CodegenBackend for TextBackend {
    type Value = Reg;
    type Block = Label;

    fn const_int(&mut self, value: i32) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = const.i32 {value}", r.0));
        r
    }

    fn const_float(&mut self, value: f64) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = const.f32 {value}", r.0));
        r
    }

    fn const_bool(&mut self, value: bool) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = const.i1 {}", r.0, value as u8));
        r
    }

    fn const_char(&mut self, value: u8) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = const.i8 {value}", r.0));
        r
    }

    fn const_string(&mut self, bytes: &[u8]) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = const.str.global {} bytes", r.0, bytes.len() + 1));
        r
    }

    fn binary_int(&mut self, op: BinOp, lhs: Reg, rhs: Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = i32.{op:?} {}, {}", r.0, lhs.0, rhs.0));
        r
    }

    fn binary_float(&mut self, op: BinOp, lhs: Reg, rhs: Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = f32.{op:?} {}, {}", r.0, lhs.0, rhs.0));
        r
    }

    fn binary_bool(&mut self, op: BinOp, lhs: Reg, rhs: Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = i1.{op:?} {}, {}", r.0, lhs.0, rhs.0));
        r
    }

    fn neg_int(&mut self, value: Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = i32.mul {}, -1", r.0, value.0));
        r
    }

    fn neg_float(&mut self, value: Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = f32.mul {}, -1.0", r.0, value.0));
        r
    }

    fn not_int(&mut self, value: Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = i32.xor {}, -1", r.0, value.0));
        r
    }

    fn not_bool(&mut self, value: Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = i1.not {}", r.0, value.0));
        r
    }

    fn convert_numeric(&mut self, from: Bottom, to: Bottom, value: Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = convert.{from:?}.{to:?} {}", r.0, value.0));
        r
    }

    fn current_block(&mut self) -> Label {
        self.current.clone()
    }

    fn new_block(&mut self, label: &str) -> Label {
        let l = Label(format!("{label}.{}", self.next_block));
        self.next_block += 1;
        l
    }

    fn switch_to_block(&mut self, block: &Label) {
        self.current = block.clone();
        self.emit(format!("{}:", block.0));
    }

    fn branch(&mut self, target: &Label) {
        self.emit(format!("br {}", target.0));
    }

    fn cond_branch(&mut self, cond: Reg, then_block: &Label, else_block: &Label) {
        self.emit(format!("br.cond {}, {}, {}", cond.0, then_block.0, else_block.0));
    }

    fn phi(&mut self, incoming: &[(Reg, Label)]) -> Reg {
        let r = self.fresh_reg();
        let joined = incoming
            .iter()
            .map(|(v, b)| format!("[{}, {}]", v.0, b.0))
            .collect::<Vec<_>>()
            .join(", ");
        self.emit(format!("{} = phi {joined}", r.0));
        r
    }

    fn alloca(&mut self, name: &str) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = alloca {name}", r.0));
        r
    }

    fn store(&mut self, slot: &Reg, value: Reg) {
        self.emit(format!("store {}, {}", value.0, slot.0));
    }

    fn load(&mut self, slot: &Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = load {}", r.0, slot.0));
        r
    }

    fn call_function(&mut self, callee: Reg, args: &[Reg]) -> Reg {
        let r = self.fresh_reg();
        let joined = args.iter().map(|a| a.0.clone()).collect::<Vec<_>>().join(", ");
        self.emit(format!("{} = call {}({joined})", r.0, callee.0));
        r
    }

    fn call_struct_ctor(&mut self, struct_name: &str, args: &[Reg]) -> Reg {
        let r = self.fresh_reg();
        let joined = args.iter().map(|a| a.0.clone()).collect::<Vec<_>>().join(", ");
        self.emit(format!("{} = struct.new {struct_name}({joined})", r.0));
        r
    }

    fn call_list_index(&mut self, list: Reg, index: Reg) -> Reg {
        let r = self.fresh_reg();
        self.emit(format!("{} = list.index {}, {}", r.0, list.0, index.0));
        r
    }

    fn ret(&mut self, value: Option<Reg>) {
        match value {
            Some(v) => self.emit(format!("ret {}", v.0)),
            None => self.emit("ret void"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn const_int_emits_one_line_and_returns_a_fresh_register() {
        let mut backend = TextBackend::new();
        let r = backend.const_int(42);
        assert_eq!(r.0, "%0");
        assert_eq!(backend.into_output(), "%0 = const.i32 42\n");
    }

    #[test]
    fn registers_are_distinct_across_calls() {
        let mut backend = TextBackend::new();
        let a = backend.const_int(1);
        let b = backend.const_int(2);
        assert_ne!(a.0, b.0);
    }
}

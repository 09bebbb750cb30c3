//! Opcode catalog.
//!
//! Every opcode carries its operand signature: the number of operands and
//! the syntactic classes accepted at each position. The verifier checks
//! instructions against [`Opcode::signature`] before anything executes.

use crate::operand::OperandClass::{self, Bool, Int, Label, String, Type, Var};
use crate::operand::SYMBOL;

/// Operand signature: one slice of accepted classes per position.
pub type Signature = &'static [&'static [OperandClass]];

const NONE: Signature = &[];
const VAR: Signature = &[&[Var]];
const LABEL: Signature = &[&[Label]];
const SYMB: Signature = &[SYMBOL];
const VAR_SYMB: Signature = &[&[Var], SYMBOL];
const ARITH: Signature = &[&[Var], &[Var, Int], &[Var, Int]];
const RELATIONAL: Signature = &[&[Var], SYMBOL, SYMBOL];
const LOGIC: Signature = &[&[Var], &[Var, Bool], &[Var, Bool]];
const CONDITIONAL_JUMP: Signature = &[&[Label], SYMBOL, SYMBOL];

/// Identifies the operation to perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    // Frames, calls
    /// `MOVE ⟨var⟩ ⟨symb⟩`: copy a value into a variable.
    Move,
    /// Install a fresh, empty temporary frame.
    CreateFrame,
    /// Move the temporary frame onto the local-frame stack.
    PushFrame,
    /// Move the top local frame back into the temporary slot.
    PopFrame,
    /// `DEFVAR ⟨var⟩`: declare an unassigned variable.
    DefVar,
    /// `CALL ⟨label⟩`: save the counter and jump.
    Call,
    /// Restore the counter saved by the matching CALL.
    Return,

    // Operand stack
    /// `PUSHS ⟨symb⟩`
    Pushs,
    /// `POPS ⟨var⟩`
    Pops,

    // Arithmetic, relational, boolean
    Add,
    Sub,
    Mul,
    /// Integer division, truncating toward zero.
    Idiv,
    Lt,
    Gt,
    Eq,
    And,
    Or,
    Not,

    // Conversions
    /// Codepoint to one-character string.
    Int2Char,
    /// Codepoint of the character at an index.
    Stri2Int,

    // I/O
    /// `READ ⟨var⟩ ⟨type⟩`
    Read,
    /// `WRITE ⟨symb⟩`
    Write,

    // Strings
    Concat,
    Strlen,
    GetChar,
    SetChar,

    // Types
    /// Runtime type name of a symbol.
    Type,

    // Control flow
    /// Jump target; no-op when executed.
    Label,
    Jump,
    JumpIfEq,
    JumpIfNeq,
    /// `EXIT ⟨symb⟩`: halt with a code in 0..=9.
    Exit,

    // Debugging
    /// Print a raw value to the diagnostic stream.
    Dprint,
    /// Dump machine state to the diagnostic stream.
    Break,
}

/// All opcodes, in definition order. Useful for exhaustive testing.
pub const ALL_OPCODES: [Opcode; 35] = [
    Opcode::Move,
    Opcode::CreateFrame,
    Opcode::PushFrame,
    Opcode::PopFrame,
    Opcode::DefVar,
    Opcode::Call,
    Opcode::Return,
    Opcode::Pushs,
    Opcode::Pops,
    Opcode::Add,
    Opcode::Sub,
    Opcode::Mul,
    Opcode::Idiv,
    Opcode::Lt,
    Opcode::Gt,
    Opcode::Eq,
    Opcode::And,
    Opcode::Or,
    Opcode::Not,
    Opcode::Int2Char,
    Opcode::Stri2Int,
    Opcode::Read,
    Opcode::Write,
    Opcode::Concat,
    Opcode::Strlen,
    Opcode::GetChar,
    Opcode::SetChar,
    Opcode::Type,
    Opcode::Label,
    Opcode::Jump,
    Opcode::JumpIfEq,
    Opcode::JumpIfNeq,
    Opcode::Exit,
    Opcode::Dprint,
    Opcode::Break,
];

impl Opcode {
    /// Returns the source mnemonic for this opcode.
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Opcode::Move => "MOVE",
            Opcode::CreateFrame => "CREATEFRAME",
            Opcode::PushFrame => "PUSHFRAME",
            Opcode::PopFrame => "POPFRAME",
            Opcode::DefVar => "DEFVAR",
            Opcode::Call => "CALL",
            Opcode::Return => "RETURN",
            Opcode::Pushs => "PUSHS",
            Opcode::Pops => "POPS",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Idiv => "IDIV",
            Opcode::Lt => "LT",
            Opcode::Gt => "GT",
            Opcode::Eq => "EQ",
            Opcode::And => "AND",
            Opcode::Or => "OR",
            Opcode::Not => "NOT",
            Opcode::Int2Char => "INT2CHAR",
            Opcode::Stri2Int => "STRI2INT",
            Opcode::Read => "READ",
            Opcode::Write => "WRITE",
            Opcode::Concat => "CONCAT",
            Opcode::Strlen => "STRLEN",
            Opcode::GetChar => "GETCHAR",
            Opcode::SetChar => "SETCHAR",
            Opcode::Type => "TYPE",
            Opcode::Label => "LABEL",
            Opcode::Jump => "JUMP",
            Opcode::JumpIfEq => "JUMPIFEQ",
            Opcode::JumpIfNeq => "JUMPIFNEQ",
            Opcode::Exit => "EXIT",
            Opcode::Dprint => "DPRINT",
            Opcode::Break => "BREAK",
        }
    }

    /// Look up an opcode by mnemonic, ignoring ASCII case.
    pub fn from_mnemonic(mnemonic: &str) -> Option<Opcode> {
        ALL_OPCODES
            .iter()
            .find(|op| op.mnemonic().eq_ignore_ascii_case(mnemonic))
            .copied()
    }

    /// Accepted operand classes per position. The slice length is the
    /// exact operand count.
    pub fn signature(&self) -> Signature {
        match self {
            Opcode::CreateFrame
            | Opcode::PushFrame
            | Opcode::PopFrame
            | Opcode::Return
            | Opcode::Break => NONE,

            Opcode::DefVar | Opcode::Pops => VAR,

            Opcode::Call | Opcode::Label | Opcode::Jump => LABEL,

            Opcode::Pushs | Opcode::Write | Opcode::Dprint => SYMB,

            Opcode::Move | Opcode::Type => VAR_SYMB,

            Opcode::Add | Opcode::Sub | Opcode::Mul | Opcode::Idiv => ARITH,

            Opcode::Lt | Opcode::Gt | Opcode::Eq => RELATIONAL,

            Opcode::And | Opcode::Or => LOGIC,
            Opcode::Not => &[&[Var], &[Var, Bool]],

            Opcode::Int2Char => &[&[Var], &[Var, Int]],
            Opcode::Stri2Int | Opcode::GetChar => &[&[Var], &[Var, String], &[Var, Int]],
            Opcode::SetChar => &[&[Var], &[Var, Int], &[Var, String]],
            Opcode::Concat => &[&[Var], &[Var, String], &[Var, String]],
            Opcode::Strlen => &[&[Var], &[Var, String]],

            Opcode::Read => &[&[Var], &[Type]],

            Opcode::JumpIfEq | Opcode::JumpIfNeq => CONDITIONAL_JUMP,

            Opcode::Exit => &[&[Var, Int]],
        }
    }

    /// Number of operands this opcode takes.
    pub fn arity(&self) -> usize {
        self.signature().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_opcodes_count() {
        assert_eq!(ALL_OPCODES.len(), 35);
    }

    #[test]
    fn mnemonic_roundtrip() {
        for &op in &ALL_OPCODES {
            assert_eq!(
                Opcode::from_mnemonic(op.mnemonic()),
                Some(op),
                "roundtrip failed for {op:?}"
            );
        }
    }

    #[test]
    fn mnemonic_case_insensitive() {
        assert_eq!(Opcode::from_mnemonic("createframe"), Some(Opcode::CreateFrame));
        assert_eq!(Opcode::from_mnemonic("JumpIfEq"), Some(Opcode::JumpIfEq));
    }

    #[test]
    fn unknown_mnemonic() {
        assert_eq!(Opcode::from_mnemonic("HALT"), None);
        assert_eq!(Opcode::from_mnemonic(""), None);
    }

    #[test]
    fn arities() {
        assert_eq!(Opcode::CreateFrame.arity(), 0);
        assert_eq!(Opcode::Break.arity(), 0);
        assert_eq!(Opcode::DefVar.arity(), 1);
        assert_eq!(Opcode::Exit.arity(), 1);
        assert_eq!(Opcode::Move.arity(), 2);
        assert_eq!(Opcode::Read.arity(), 2);
        assert_eq!(Opcode::Add.arity(), 3);
        assert_eq!(Opcode::JumpIfNeq.arity(), 3);
    }

    #[test]
    fn arithmetic_target_must_be_variable() {
        for op in [Opcode::Add, Opcode::Sub, Opcode::Mul, Opcode::Idiv] {
            let sig = op.signature();
            assert_eq!(sig[0], &[Var]);
            assert!(sig[1].contains(&Int));
            assert!(!sig[1].contains(&String));
        }
    }

    #[test]
    fn only_jumps_take_labels() {
        for &op in &ALL_OPCODES {
            let takes_label = op.signature().iter().any(|slot| slot.contains(&Label));
            let is_jump = matches!(
                op,
                Opcode::Call | Opcode::Label | Opcode::Jump | Opcode::JumpIfEq | Opcode::JumpIfNeq
            );
            assert_eq!(takes_label, is_jump, "{op:?}");
        }
    }
}

//! Instruction records and decoded instructions.
//!
//! An [`InstructionRecord`] is what an external loader produces: an order
//! number, an opcode name and raw operand records. The verifier turns each
//! record into an [`Instruction`] with a resolved [`Opcode`] and decoded
//! [`Operand`]s.

use std::fmt;

use crate::opcode::Opcode;
use crate::operand::{Operand, OperandClass, OperandRecord};

/// One instruction as delivered by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionRecord {
    /// Execution order. Must be positive and unique within a program.
    pub order: i64,
    /// Opcode mnemonic, matched case-insensitively.
    pub opcode: String,
    /// Operands in position order.
    pub operands: Vec<OperandRecord>,
}

impl InstructionRecord {
    /// Create a record with no operands.
    pub fn new(order: i64, opcode: impl Into<String>) -> Self {
        Self {
            order,
            opcode: opcode.into(),
            operands: Vec::new(),
        }
    }

    /// Append an operand.
    pub fn operand(mut self, class: OperandClass, text: impl Into<String>) -> Self {
        self.operands.push(OperandRecord::new(class, text));
        self
    }

    pub fn var(self, text: impl Into<String>) -> Self {
        self.operand(OperandClass::Var, text)
    }

    pub fn int(self, n: i64) -> Self {
        self.operand(OperandClass::Int, n.to_string())
    }

    pub fn bool(self, b: bool) -> Self {
        self.operand(OperandClass::Bool, b.to_string())
    }

    pub fn string(self, raw: impl Into<String>) -> Self {
        self.operand(OperandClass::String, raw)
    }

    pub fn nil(self) -> Self {
        self.operand(OperandClass::Nil, "nil")
    }

    pub fn label(self, name: impl Into<String>) -> Self {
        self.operand(OperandClass::Label, name)
    }

    pub fn type_name(self, name: impl Into<String>) -> Self {
        self.operand(OperandClass::Type, name)
    }
}

/// A validated instruction, ready to execute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// Execution order (always at least 1).
    pub order: u64,
    /// The operation to perform.
    pub opcode: Opcode,
    /// Decoded operands. Count and classes match [`Opcode::signature`].
    pub operands: Vec<Operand>,
}

impl Instruction {
    pub fn new(order: u64, opcode: Opcode, operands: Vec<Operand>) -> Self {
        Self {
            order,
            opcode,
            operands,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.order, self.opcode.mnemonic())?;
        for operand in &self.operands {
            write!(f, " {operand}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operand::VarRef;
    use crate::value::Value;

    #[test]
    fn record_builder() {
        let record = InstructionRecord::new(3, "add")
            .var("GF@x")
            .int(-2)
            .var("LF@y");

        assert_eq!(record.order, 3);
        assert_eq!(record.opcode, "add");
        assert_eq!(
            record.operands,
            vec![
                OperandRecord::new(OperandClass::Var, "GF@x"),
                OperandRecord::new(OperandClass::Int, "-2"),
                OperandRecord::new(OperandClass::Var, "LF@y"),
            ]
        );
    }

    #[test]
    fn record_literal_helpers() {
        let record = InstructionRecord::new(1, "X")
            .bool(true)
            .nil()
            .string("a\\032b")
            .label("end")
            .type_name("int");
        let classes: Vec<_> = record.operands.iter().map(|o| o.class).collect();
        assert_eq!(
            classes,
            vec![
                OperandClass::Bool,
                OperandClass::Nil,
                OperandClass::String,
                OperandClass::Label,
                OperandClass::Type,
            ]
        );
        assert_eq!(record.operands[0].text, "true");
    }

    #[test]
    fn instruction_display() {
        let instr = Instruction::new(
            7,
            Opcode::Move,
            vec![
                Operand::Var(VarRef::parse("GF@a").unwrap()),
                Operand::Const(Value::Int(5)),
            ],
        );
        assert_eq!(instr.to_string(), "7: MOVE GF@a int@5");
    }

    #[test]
    fn instruction_display_no_operands() {
        let instr = Instruction::new(1, Opcode::CreateFrame, vec![]);
        assert_eq!(instr.to_string(), "1: CREATEFRAME");
    }
}

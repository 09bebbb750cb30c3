//! Operand resolution: turning decoded operands into runtime values.

use tac_common::{Instruction, Operand, TypeTag, Value, VarRef};

use crate::error::RuntimeError;
use crate::io::Io;
use crate::machine::Machine;

/// Position (0-based) of an operand within its instruction.
pub(crate) fn operand(instr: &Instruction, position: usize) -> Result<&Operand, RuntimeError> {
    instr
        .operands
        .get(position)
        .ok_or(RuntimeError::MalformedOperand {
            at: instr.order,
            position: position + 1,
        })
}

impl<I: Io> Machine<'_, I> {
    /// The variable named by operand `position`, checked to be declared.
    pub(crate) fn target<'i>(
        &self,
        instr: &'i Instruction,
        position: usize,
    ) -> Result<&'i VarRef, RuntimeError> {
        let var = self.variable(instr, position)?;
        self.frames
            .ensure_declared(var)
            .map_err(|source| RuntimeError::Frame {
                at: instr.order,
                source,
            })?;
        Ok(var)
    }

    /// The variable named by operand `position`, unchecked.
    pub(crate) fn variable<'i>(
        &self,
        instr: &'i Instruction,
        position: usize,
    ) -> Result<&'i VarRef, RuntimeError> {
        match operand(instr, position)? {
            Operand::Var(var) => Ok(var),
            _ => Err(RuntimeError::MalformedOperand {
                at: instr.order,
                position: position + 1,
            }),
        }
    }

    /// The label name in operand `position`.
    pub(crate) fn label<'i>(
        &self,
        instr: &'i Instruction,
        position: usize,
    ) -> Result<&'i str, RuntimeError> {
        match operand(instr, position)? {
            Operand::Label(name) => Ok(name),
            _ => Err(RuntimeError::MalformedOperand {
                at: instr.order,
                position: position + 1,
            }),
        }
    }

    /// Order of the LABEL instruction named by operand `position`.
    pub(crate) fn label_order(
        &self,
        instr: &Instruction,
        position: usize,
    ) -> Result<u64, RuntimeError> {
        let name = self.label(instr, position)?;
        self.program
            .label(name)
            .ok_or_else(|| RuntimeError::UndefinedLabel {
                at: instr.order,
                label: name.to_string(),
            })
    }

    /// Value of a symbol operand: a literal, or an assigned variable.
    pub(crate) fn value(&self, instr: &Instruction, position: usize) -> Result<Value, RuntimeError> {
        match operand(instr, position)? {
            Operand::Const(value) => Ok(value.clone()),
            Operand::Var(var) => self.read(instr.order, var),
            Operand::Label(_) | Operand::Type(_) => Err(RuntimeError::MalformedOperand {
                at: instr.order,
                position: position + 1,
            }),
        }
    }

    pub(crate) fn read(&self, at: u64, var: &VarRef) -> Result<Value, RuntimeError> {
        self.frames
            .read(var)
            .cloned()
            .map_err(|source| RuntimeError::Frame { at, source })
    }

    pub(crate) fn write(&mut self, at: u64, var: &VarRef, value: Value) -> Result<(), RuntimeError> {
        self.frames
            .write(var, value)
            .map_err(|source| RuntimeError::Frame { at, source })
    }

    pub(crate) fn int(&self, instr: &Instruction, position: usize) -> Result<i64, RuntimeError> {
        match self.value(instr, position)? {
            Value::Int(n) => Ok(n),
            other => Err(mismatch(instr, TypeTag::Int, &other)),
        }
    }

    pub(crate) fn bool(&self, instr: &Instruction, position: usize) -> Result<bool, RuntimeError> {
        match self.value(instr, position)? {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch(instr, TypeTag::Bool, &other)),
        }
    }

    pub(crate) fn string(&self, instr: &Instruction, position: usize) -> Result<String, RuntimeError> {
        match self.value(instr, position)? {
            Value::Str(s) => Ok(s),
            other => Err(mismatch(instr, TypeTag::String, &other)),
        }
    }
}

pub(crate) fn mismatch(instr: &Instruction, expected: TypeTag, found: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        at: instr.order,
        expected,
        found: found.type_tag(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryIo;
    use tac_common::{ErrorKind, FrameKind, InstructionRecord, Opcode, Program};
    use tac_verifier::verify;

    fn single(record: InstructionRecord) -> Program {
        verify(&[record]).unwrap()
    }

    #[test]
    fn literal_value() {
        let program = single(InstructionRecord::new(1, "PUSHS").string("ab"));
        let mut io = MemoryIo::new();
        let machine = Machine::new(&program, &mut io);
        let instr = program.get(1).unwrap();
        assert_eq!(machine.value(instr, 0), Ok(Value::string("ab")));
        assert_eq!(machine.string(instr, 0), Ok("ab".to_string()));
    }

    #[test]
    fn wrong_runtime_type() {
        let program = single(InstructionRecord::new(1, "PUSHS").bool(true));
        let mut io = MemoryIo::new();
        let machine = Machine::new(&program, &mut io);
        let instr = program.get(1).unwrap();
        let err = machine.int(instr, 0).unwrap_err();
        assert_eq!(
            err,
            RuntimeError::TypeMismatch {
                at: 1,
                expected: TypeTag::Int,
                found: TypeTag::Bool,
            }
        );
        assert_eq!(err.kind(), ErrorKind::OperandType);
    }

    #[test]
    fn variable_reads_go_through_frames() {
        let program = single(InstructionRecord::new(1, "PUSHS").var("GF@x"));
        let mut io = MemoryIo::new();
        let mut machine = Machine::new(&program, &mut io);
        let instr = program.get(1).unwrap();
        let x = VarRef::new(FrameKind::Global, "x");

        assert_eq!(machine.value(instr, 0).unwrap_err().kind(), ErrorKind::VariableAccess);
        machine.frames.declare(&x).unwrap();
        assert_eq!(machine.value(instr, 0).unwrap_err().kind(), ErrorKind::Value);
        machine.write(1, &x, Value::Int(8)).unwrap();
        assert_eq!(machine.int(instr, 0), Ok(8));
    }

    #[test]
    fn missing_operand_is_malformed() {
        let program = Program::new(
            vec![Instruction::new(1, Opcode::Pushs, vec![])],
            Default::default(),
        );
        let mut io = MemoryIo::new();
        let machine = Machine::new(&program, &mut io);
        let instr = program.get(1).unwrap();
        assert_eq!(
            machine.value(instr, 0),
            Err(RuntimeError::MalformedOperand { at: 1, position: 1 })
        );
    }

    #[test]
    fn undefined_label() {
        let program = single(InstructionRecord::new(1, "JUMP").label("gone"));
        let mut io = MemoryIo::new();
        let machine = Machine::new(&program, &mut io);
        let instr = program.get(1).unwrap();
        assert_eq!(machine.label_order(instr, 0).unwrap_err().kind(), ErrorKind::Redefinition);
    }
}

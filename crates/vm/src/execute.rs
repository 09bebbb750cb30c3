//! Opcode dispatch and instruction semantics.

use std::cmp::Ordering;

use log::{debug, trace};
use tac_common::{decode_escapes, Instruction, Opcode, Operand, TypeTag, Value};

use crate::error::RuntimeError;
use crate::io::Io;
use crate::machine::{Machine, EXIT_CODES};
use crate::resolve::{mismatch, operand};

impl<I: Io> Machine<'_, I> {
    /// Execute a single instruction. The caller advances the counter.
    pub(crate) fn execute(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        trace!("{instr}");
        let at = instr.order;

        match instr.opcode {
            // Frames, calls
            Opcode::Move => {
                let value = self.value(instr, 1)?;
                let target = self.variable(instr, 0)?;
                self.write(at, target, value)?;
            }
            Opcode::CreateFrame => {
                self.frames.create_temporary();
                debug!("{at}: temporary frame created");
            }
            Opcode::PushFrame => {
                self.frames.push().map_err(|source| RuntimeError::Frame { at, source })?;
                debug!("{at}: local depth {}", self.frames.local_depth());
            }
            Opcode::PopFrame => {
                self.frames.pop().map_err(|source| RuntimeError::Frame { at, source })?;
                debug!("{at}: local depth {}", self.frames.local_depth());
            }
            Opcode::DefVar => {
                let var = self.variable(instr, 0)?;
                self.frames
                    .declare(var)
                    .map_err(|source| RuntimeError::Frame { at, source })?;
            }
            Opcode::Call => {
                let target = self.label_order(instr, 0)?;
                self.call_stack.push(at);
                debug!("{at}: call to {target}, depth {}", self.call_stack.len());
                self.pc = target;
            }
            Opcode::Return => {
                let back = self
                    .call_stack
                    .pop()
                    .ok_or(RuntimeError::EmptyCallStack { at })?;
                debug!("{at}: return to {back}");
                self.pc = back;
            }

            // Operand stack
            Opcode::Pushs => {
                let value = self.value(instr, 0)?;
                self.push(value);
            }
            Opcode::Pops => {
                let value = self.pop(at)?;
                let target = self.variable(instr, 0)?;
                self.write(at, target, value)?;
            }

            // Arithmetic
            Opcode::Add => self.exec_arith(instr, |a, b| Some(a.wrapping_add(b)))?,
            Opcode::Sub => self.exec_arith(instr, |a, b| Some(a.wrapping_sub(b)))?,
            Opcode::Mul => self.exec_arith(instr, |a, b| Some(a.wrapping_mul(b)))?,
            Opcode::Idiv => self.exec_arith(instr, |a, b| (b != 0).then(|| a.wrapping_div(b)))?,

            // Relational
            Opcode::Lt => self.exec_relational(instr, |o| o == Ordering::Less)?,
            Opcode::Gt => self.exec_relational(instr, |o| o == Ordering::Greater)?,
            Opcode::Eq => {
                let target = self.target(instr, 0)?;
                let a = self.value(instr, 1)?;
                let b = self.value(instr, 2)?;
                let equal = equals(instr, &a, &b)?;
                self.write(at, target, Value::Bool(equal))?;
            }

            // Boolean
            Opcode::And => self.exec_logic(instr, |a, b| a && b)?,
            Opcode::Or => self.exec_logic(instr, |a, b| a || b)?,
            Opcode::Not => {
                let target = self.target(instr, 0)?;
                let a = self.bool(instr, 1)?;
                self.write(at, target, Value::Bool(!a))?;
            }

            // Conversions
            Opcode::Int2Char => {
                let target = self.target(instr, 0)?;
                let code = self.int(instr, 1)?;
                let c = u32::try_from(code)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(RuntimeError::InvalidCodepoint { at, code })?;
                self.write(at, target, Value::Str(c.to_string()))?;
            }
            Opcode::Stri2Int => {
                let target = self.target(instr, 0)?;
                let s = self.string(instr, 1)?;
                let index = self.int(instr, 2)?;
                let c = char_at(at, &s, index)?;
                self.write(at, target, Value::Int(i64::from(u32::from(c))))?;
            }

            // I/O
            Opcode::Read => self.exec_read(instr)?,
            Opcode::Write => {
                let value = self.value(instr, 0)?;
                let written = match &value {
                    Value::Int(n) => self.io.write_int(*n),
                    Value::Bool(b) => self.io.write_bool(*b),
                    Value::Str(s) => self.io.write_string(&decode_escapes(s)),
                    Value::Nil => self.io.write_string(""),
                };
                written.map_err(|e| RuntimeError::Output {
                    at,
                    message: e.to_string(),
                })?;
            }

            // Strings
            Opcode::Concat => {
                let target = self.target(instr, 0)?;
                let mut s = self.string(instr, 1)?;
                s.push_str(&self.string(instr, 2)?);
                self.write(at, target, Value::Str(s))?;
            }
            Opcode::Strlen => {
                let target = self.target(instr, 0)?;
                let s = self.string(instr, 1)?;
                let length = s.chars().count() as i64;
                self.write(at, target, Value::Int(length))?;
            }
            Opcode::GetChar => {
                let target = self.target(instr, 0)?;
                let s = self.string(instr, 1)?;
                let index = self.int(instr, 2)?;
                let c = char_at(at, &s, index)?;
                self.write(at, target, Value::Str(c.to_string()))?;
            }
            Opcode::SetChar => self.exec_setchar(instr)?,

            // Types
            Opcode::Type => {
                let target = self.target(instr, 0)?;
                let name = match operand(instr, 1)? {
                    Operand::Var(var) => self
                        .frames
                        .lookup(var)
                        .map_err(|source| RuntimeError::Frame { at, source })?
                        .map_or("", |value| value.type_tag().name()),
                    Operand::Const(value) => value.type_tag().name(),
                    Operand::Label(_) | Operand::Type(_) => {
                        return Err(RuntimeError::MalformedOperand { at, position: 2 })
                    }
                };
                self.write(at, target, Value::string(name))?;
            }

            // Control flow
            Opcode::Label => {}
            Opcode::Jump => {
                self.pc = self.label_order(instr, 0)?;
            }
            Opcode::JumpIfEq => self.exec_conditional_jump(instr, true)?,
            Opcode::JumpIfNeq => self.exec_conditional_jump(instr, false)?,
            Opcode::Exit => {
                let code = self.int(instr, 0)?;
                if !EXIT_CODES.contains(&code) {
                    return Err(RuntimeError::InvalidExitCode { at, code });
                }
                self.halt(code as u8);
            }

            // Debugging
            Opcode::Dprint => {
                let value = self.value(instr, 0)?;
                self.diagnostic(at, &format!("{value}\n"))?;
            }
            Opcode::Break => {
                let dump = self.dump(at);
                self.diagnostic(at, &dump)?;
            }
        }

        Ok(())
    }

    /// Integer arithmetic: target, two int operands, int result.
    /// `op` returns `None` only for a zero divisor.
    fn exec_arith(
        &mut self,
        instr: &Instruction,
        op: fn(i64, i64) -> Option<i64>,
    ) -> Result<(), RuntimeError> {
        let at = instr.order;
        let target = self.target(instr, 0)?;
        let a = self.int(instr, 1)?;
        let b = self.int(instr, 2)?;
        let result = op(a, b).ok_or(RuntimeError::DivisionByZero { at })?;
        self.write(at, target, Value::Int(result))
    }

    /// LT/GT: same non-nil type on both sides.
    fn exec_relational(
        &mut self,
        instr: &Instruction,
        accept: fn(Ordering) -> bool,
    ) -> Result<(), RuntimeError> {
        let target = self.target(instr, 0)?;
        let a = self.value(instr, 1)?;
        let b = self.value(instr, 2)?;
        let ordering = compare(instr, &a, &b)?;
        self.write(instr.order, target, Value::Bool(accept(ordering)))
    }

    /// AND/OR: two bools.
    fn exec_logic(&mut self, instr: &Instruction, op: fn(bool, bool) -> bool) -> Result<(), RuntimeError> {
        let target = self.target(instr, 0)?;
        let a = self.bool(instr, 1)?;
        let b = self.bool(instr, 2)?;
        self.write(instr.order, target, Value::Bool(op(a, b)))
    }

    /// READ: bad input and end of input both store nil.
    fn exec_read(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let target = self.variable(instr, 0)?;
        let tag = match operand(instr, 1)? {
            Operand::Type(tag) => *tag,
            _ => {
                return Err(RuntimeError::MalformedOperand {
                    at: instr.order,
                    position: 2,
                })
            }
        };

        let value = match tag {
            TypeTag::Int => self.io.read_int().map(Value::Int),
            TypeTag::Bool => self.io.read_bool().map(Value::Bool),
            TypeTag::String => self.io.read_string().map(Value::Str),
            TypeTag::Nil => None,
        }
        .unwrap_or(Value::Nil);

        self.write(instr.order, target, value)
    }

    /// SETCHAR: the target must already hold a string.
    fn exec_setchar(&mut self, instr: &Instruction) -> Result<(), RuntimeError> {
        let at = instr.order;
        let target = self.target(instr, 0)?;
        let current = match self.read(at, target)? {
            Value::Str(s) => s,
            other => return Err(mismatch(instr, TypeTag::String, &other)),
        };
        let index = self.int(instr, 1)?;
        let replacement = self.string(instr, 2)?;

        let mut chars: Vec<char> = current.chars().collect();
        let length = chars.len();
        let slot = usize::try_from(index)
            .ok()
            .filter(|&i| i < length)
            .ok_or(RuntimeError::IndexOutOfRange { at, index, length })?;
        chars[slot] = replacement
            .chars()
            .next()
            .ok_or(RuntimeError::EmptyReplacement { at })?;

        self.write(at, target, Value::Str(chars.into_iter().collect()))
    }

    /// JUMPIFEQ/JUMPIFNEQ: operands are compared and the label resolved
    /// whether or not the branch is taken.
    fn exec_conditional_jump(&mut self, instr: &Instruction, when_equal: bool) -> Result<(), RuntimeError> {
        let a = self.value(instr, 1)?;
        let b = self.value(instr, 2)?;
        let equal = equals(instr, &a, &b)?;
        let target = self.label_order(instr, 0)?;
        if equal == when_equal {
            self.pc = target;
        }
        Ok(())
    }

    fn diagnostic(&mut self, at: u64, text: &str) -> Result<(), RuntimeError> {
        self.io
            .write_diagnostic(text)
            .map_err(|e| RuntimeError::Output {
                at,
                message: e.to_string(),
            })
    }

    /// Machine state as BREAK prints it.
    fn dump(&self, at: u64) -> String {
        let globals = self.frames.globals();
        let temporary = if self.frames.has_temporary() {
            "defined"
        } else {
            "undefined"
        };

        let mut lines = vec![
            format!("BREAK at instruction {at}"),
            format!("  pc: {}", self.pc),
            format!("  local frames: {}", self.frames.local_depth()),
            format!("  temporary frame: {temporary}"),
            format!("  data stack: {}", self.data_stack.len()),
            format!("  call stack: {}", self.call_stack.len()),
            format!("  global frame: {} variable(s)", globals.len()),
        ];
        for (name, cell) in globals {
            lines.push(match cell {
                Some(value) => format!("    GF@{name} = {}@{value}", value.type_tag()),
                None => format!("    GF@{name} = (unassigned)"),
            });
        }

        let mut out = lines.join("\n");
        out.push('\n');
        out
    }
}

/// Ordering for LT/GT. Ints numerically, bools false before true,
/// strings bytewise on their raw text.
fn compare(instr: &Instruction, a: &Value, b: &Value) -> Result<Ordering, RuntimeError> {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => Ok(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Ok(x.cmp(y)),
        (Value::Str(x), Value::Str(y)) => Ok(x.as_bytes().cmp(y.as_bytes())),
        _ => Err(incompatible(instr, a, b)),
    }
}

/// Equality for EQ and the conditional jumps. Either side may be nil;
/// nil equals only nil.
fn equals(instr: &Instruction, a: &Value, b: &Value) -> Result<bool, RuntimeError> {
    if matches!(a, Value::Nil) || matches!(b, Value::Nil) || a.type_tag() == b.type_tag() {
        Ok(a == b)
    } else {
        Err(incompatible(instr, a, b))
    }
}

fn incompatible(instr: &Instruction, a: &Value, b: &Value) -> RuntimeError {
    RuntimeError::IncompatibleTypes {
        at: instr.order,
        opcode: instr.opcode,
        left: a.type_tag(),
        right: b.type_tag(),
    }
}

/// Character at `index` of the raw text.
fn char_at(at: u64, s: &str, index: i64) -> Result<char, RuntimeError> {
    usize::try_from(index)
        .ok()
        .and_then(|i| s.chars().nth(i))
        .ok_or_else(|| RuntimeError::IndexOutOfRange {
            at,
            index,
            length: s.chars().count(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tac_common::{OperandClass, OperandRecord};

    fn instr(opcode: Opcode) -> Instruction {
        Instruction::new(1, opcode, vec![])
    }

    #[test]
    fn compare_same_types() {
        let lt = instr(Opcode::Lt);
        assert_eq!(compare(&lt, &Value::Int(-1), &Value::Int(2)), Ok(Ordering::Less));
        assert_eq!(compare(&lt, &Value::Bool(false), &Value::Bool(true)), Ok(Ordering::Less));
        assert_eq!(
            compare(&lt, &Value::string("b"), &Value::string("a")),
            Ok(Ordering::Greater)
        );
    }

    #[test]
    fn compare_uses_raw_text() {
        // "\065" decodes to "A", but the raw backslash sorts after 'A'.
        let lt = instr(Opcode::Lt);
        assert_eq!(
            compare(&lt, &Value::string("\\065"), &Value::string("A")),
            Ok(Ordering::Greater)
        );
        assert_eq!(
            compare(&lt, &Value::string("\\065"), &Value::string("a")),
            Ok(Ordering::Less)
        );
    }

    #[test]
    fn compare_rejects_nil_and_mixed() {
        let gt = instr(Opcode::Gt);
        assert!(compare(&gt, &Value::Nil, &Value::Nil).is_err());
        assert!(compare(&gt, &Value::Int(1), &Value::string("1")).is_err());
    }

    #[test]
    fn equality_rules() {
        let eq = instr(Opcode::Eq);
        assert_eq!(equals(&eq, &Value::Nil, &Value::Nil), Ok(true));
        assert_eq!(equals(&eq, &Value::Int(0), &Value::Nil), Ok(false));
        assert_eq!(equals(&eq, &Value::Nil, &Value::string("")), Ok(false));
        assert_eq!(equals(&eq, &Value::Bool(true), &Value::Bool(true)), Ok(true));
        assert_eq!(
            equals(&eq, &Value::Int(1), &Value::Bool(true)),
            Err(RuntimeError::IncompatibleTypes {
                at: 1,
                opcode: Opcode::Eq,
                left: TypeTag::Int,
                right: TypeTag::Bool,
            })
        );
    }

    #[test]
    fn char_indexing_counts_characters() {
        assert_eq!(char_at(1, "žluť", 1), Ok('l'));
        assert_eq!(char_at(1, "a\\032", 1), Ok('\\'));
        assert!(char_at(1, "abc", 3).is_err());
        assert!(char_at(1, "abc", -1).is_err());
    }

    #[test]
    fn decoded_operand_display_in_trace() {
        let operand = Operand::decode(&OperandRecord::new(OperandClass::Int, "3")).unwrap();
        let i = Instruction::new(2, Opcode::Exit, vec![operand]);
        assert_eq!(i.to_string(), "2: EXIT int@3");
    }
}

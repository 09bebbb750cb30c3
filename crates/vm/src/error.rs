//! Runtime errors for the VM.
//!
//! Every error includes the order of the instruction that raised it (`at`).
//! All runtime errors are fatal; [`RuntimeError::kind`] classifies them.

use tac_common::{ErrorKind, Opcode, TypeTag};
use thiserror::Error;

use crate::frames::FrameError;

/// Errors that occur during program execution.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    /// Frame or variable access failed.
    #[error("instruction {at}: {source}")]
    Frame { at: u64, source: FrameError },

    /// JUMP, CALL or a conditional jump names a label that was never defined.
    #[error("undefined label '{label}' at instruction {at}")]
    UndefinedLabel { at: u64, label: String },

    /// Operand has the wrong runtime type.
    #[error("type mismatch at instruction {at}: expected {expected}, found {found}")]
    TypeMismatch {
        at: u64,
        expected: TypeTag,
        found: TypeTag,
    },

    /// Comparison between values of incompatible types.
    #[error("{} at instruction {at} cannot compare {left} with {right}", .opcode.mnemonic())]
    IncompatibleTypes {
        at: u64,
        opcode: Opcode,
        left: TypeTag,
        right: TypeTag,
    },

    /// POPS on an empty operand stack.
    #[error("operand stack empty at instruction {at}")]
    EmptyDataStack { at: u64 },

    /// RETURN with no saved position.
    #[error("call stack empty at instruction {at}")]
    EmptyCallStack { at: u64 },

    /// IDIV with a zero divisor.
    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: u64 },

    /// EXIT code outside 0..=9.
    #[error("exit code {code} out of range at instruction {at}")]
    InvalidExitCode { at: u64, code: i64 },

    /// INT2CHAR argument is not a Unicode scalar value.
    #[error("invalid codepoint {code} at instruction {at}")]
    InvalidCodepoint { at: u64, code: i64 },

    /// String index outside the string.
    #[error("string index {index} out of bounds (length {length}) at instruction {at}")]
    IndexOutOfRange { at: u64, index: i64, length: usize },

    /// SETCHAR with an empty replacement string.
    #[error("empty replacement string at instruction {at}")]
    EmptyReplacement { at: u64 },

    /// Operand missing or of a class the opcode does not take.
    #[error("malformed operand {position} at instruction {at}")]
    MalformedOperand { at: u64, position: usize },

    /// The output stream failed.
    #[error("output failed at instruction {at}: {message}")]
    Output { at: u64, message: String },
}

impl RuntimeError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RuntimeError::Frame { source, .. } => source.kind(),
            RuntimeError::UndefinedLabel { .. } => ErrorKind::Redefinition,
            RuntimeError::TypeMismatch { .. } | RuntimeError::IncompatibleTypes { .. } => {
                ErrorKind::OperandType
            }
            RuntimeError::EmptyDataStack { .. } | RuntimeError::EmptyCallStack { .. } => {
                ErrorKind::Value
            }
            RuntimeError::DivisionByZero { .. } | RuntimeError::InvalidExitCode { .. } => {
                ErrorKind::OperandValue
            }
            RuntimeError::InvalidCodepoint { .. }
            | RuntimeError::IndexOutOfRange { .. }
            | RuntimeError::EmptyReplacement { .. } => ErrorKind::StringOperation,
            RuntimeError::MalformedOperand { .. } => ErrorKind::SourceStructure,
            RuntimeError::Output { .. } => ErrorKind::Internal,
        }
    }

    /// Order of the instruction that failed.
    pub fn at(&self) -> u64 {
        match self {
            RuntimeError::Frame { at, .. }
            | RuntimeError::UndefinedLabel { at, .. }
            | RuntimeError::TypeMismatch { at, .. }
            | RuntimeError::IncompatibleTypes { at, .. }
            | RuntimeError::EmptyDataStack { at }
            | RuntimeError::EmptyCallStack { at }
            | RuntimeError::DivisionByZero { at }
            | RuntimeError::InvalidExitCode { at, .. }
            | RuntimeError::InvalidCodepoint { at, .. }
            | RuntimeError::IndexOutOfRange { at, .. }
            | RuntimeError::EmptyReplacement { at }
            | RuntimeError::MalformedOperand { at, .. }
            | RuntimeError::Output { at, .. } => *at,
        }
    }
}

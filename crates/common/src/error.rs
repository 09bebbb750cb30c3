//! Failure classification shared by the verifier and the VM.
//!
//! Every error raised while loading or executing a program maps to exactly
//! one [`ErrorKind`]. Translating a kind into a process exit status is the
//! caller's job; [`ErrorKind::code`] provides the stable numeric mapping.

use std::fmt;

use thiserror::Error;

use crate::operand::OperandClass;

/// The class of a fatal failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed program shape: wrong operand count, unknown opcode,
    /// invalid or duplicate order numbers, malformed literal text.
    SourceStructure,
    /// Duplicate label definition, or a jump/call to an undefined label.
    Redefinition,
    /// An operand has a class or runtime type the instruction does not accept.
    OperandType,
    /// Access to an undeclared variable.
    VariableAccess,
    /// Operation on a local or temporary frame that does not exist.
    FrameNotAvailable,
    /// Read of a declared-but-unassigned variable, or a pop from an empty
    /// operand/call stack.
    Value,
    /// Malformed variable reference, or a number outside an
    /// instruction-specific range (EXIT code, IDIV by zero).
    OperandValue,
    /// String index out of bounds, or codepoint outside Unicode.
    StringOperation,
    /// The output collaborator failed.
    Internal,
}

/// All error kinds, in code order.
pub const ALL_ERROR_KINDS: [ErrorKind; 9] = [
    ErrorKind::SourceStructure,
    ErrorKind::Redefinition,
    ErrorKind::OperandType,
    ErrorKind::VariableAccess,
    ErrorKind::FrameNotAvailable,
    ErrorKind::Value,
    ErrorKind::OperandValue,
    ErrorKind::StringOperation,
    ErrorKind::Internal,
];

impl ErrorKind {
    /// Suggested process exit code for this kind.
    pub fn code(&self) -> i32 {
        match self {
            ErrorKind::SourceStructure => 32,
            ErrorKind::Redefinition => 52,
            ErrorKind::OperandType => 53,
            ErrorKind::VariableAccess => 54,
            ErrorKind::FrameNotAvailable => 55,
            ErrorKind::Value => 56,
            ErrorKind::OperandValue => 57,
            ErrorKind::StringOperation => 58,
            ErrorKind::Internal => 99,
        }
    }

    /// Short human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::SourceStructure => "source structure error",
            ErrorKind::Redefinition => "semantic error",
            ErrorKind::OperandType => "operand type error",
            ErrorKind::VariableAccess => "variable access error",
            ErrorKind::FrameNotAvailable => "frame not available",
            ErrorKind::Value => "missing value",
            ErrorKind::OperandValue => "operand value error",
            ErrorKind::StringOperation => "string operation error",
            ErrorKind::Internal => "internal error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name(), self.code())
    }
}

/// Errors from decoding a single operand's raw text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OperandError {
    /// Literal text does not match the syntax of its declared class.
    #[error("invalid {class} literal '{text}'")]
    InvalidLiteral { class: OperandClass, text: String },

    /// Variable reference is not of the form `GF|LF|TF@name`.
    #[error("invalid variable reference '{text}'")]
    InvalidVariable { text: String },
}

impl OperandError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OperandError::InvalidLiteral { .. } => ErrorKind::SourceStructure,
            OperandError::InvalidVariable { .. } => ErrorKind::OperandValue,
        }
    }
}

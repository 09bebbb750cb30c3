//! Verification errors.
//!
//! Every error raised for a specific record carries that record's order
//! number (`at`). The verifier collects all errors, not just the first.

use tac_common::{ErrorKind, Opcode, OperandClass, OperandError};
use thiserror::Error;

/// Errors found while turning loader records into a [`tac_common::Program`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifyError {
    // --- Program shape ---
    /// The record list is empty.
    #[error("program has no instructions")]
    EmptyProgram,

    /// Order number is zero or negative.
    #[error("invalid order {at}: must be positive")]
    InvalidOrder { at: i64 },

    /// Two records share an order number.
    #[error("duplicate order {at}")]
    DuplicateOrder { at: i64 },

    // --- Per-instruction ---
    /// Opcode name does not match any known mnemonic.
    #[error("unknown opcode '{name}' at instruction {at}")]
    UnknownOpcode { at: i64, name: String },

    /// Wrong number of operands for the opcode.
    #[error("{} at instruction {at} takes {expected} operand(s), found {found}", .opcode.mnemonic())]
    OperandCount {
        at: i64,
        opcode: Opcode,
        expected: usize,
        found: usize,
    },

    /// Operand class not accepted at this position.
    #[error("{} at instruction {at}: operand {position} cannot be {found}", .opcode.mnemonic())]
    OperandClass {
        at: i64,
        opcode: Opcode,
        position: usize,
        found: OperandClass,
    },

    /// Operand text failed to decode.
    #[error("instruction {at}: {source}")]
    Operand { at: i64, source: OperandError },

    // --- Labels ---
    /// The same label is defined twice.
    #[error("label '{label}' at instruction {at} already defined at {first}")]
    DuplicateLabel { at: i64, label: String, first: u64 },
}

impl VerifyError {
    /// Classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::EmptyProgram
            | VerifyError::InvalidOrder { .. }
            | VerifyError::DuplicateOrder { .. }
            | VerifyError::UnknownOpcode { .. }
            | VerifyError::OperandCount { .. } => ErrorKind::SourceStructure,
            VerifyError::OperandClass { .. } => ErrorKind::OperandType,
            VerifyError::Operand { source, .. } => source.kind(),
            VerifyError::DuplicateLabel { .. } => ErrorKind::Redefinition,
        }
    }

    /// Order of the offending record, if the error belongs to one.
    pub fn at(&self) -> Option<i64> {
        match self {
            VerifyError::EmptyProgram => None,
            VerifyError::InvalidOrder { at }
            | VerifyError::DuplicateOrder { at }
            | VerifyError::UnknownOpcode { at, .. }
            | VerifyError::OperandCount { at, .. }
            | VerifyError::OperandClass { at, .. }
            | VerifyError::Operand { at, .. }
            | VerifyError::DuplicateLabel { at, .. } => Some(*at),
        }
    }
}

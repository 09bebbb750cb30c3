//! Load-time verification for the three-address instruction VM.
//!
//! The verifier turns loader records into a [`Program`]. It collects ALL
//! errors (not just the first) and returns them in record order.
//!
//! # Usage
//!
//! ```
//! use tac_common::InstructionRecord;
//! use tac_verifier::verify;
//!
//! let records = vec![
//!     InstructionRecord::new(1, "DEFVAR").var("GF@x"),
//!     InstructionRecord::new(2, "MOVE").var("GF@x").int(42),
//!     InstructionRecord::new(3, "WRITE").var("GF@x"),
//! ];
//!
//! let program = verify(&records).unwrap();
//! assert_eq!(program.len(), 3);
//! ```
//!
//! # Checks
//!
//! 1. **Orders**: positive and unique, over the whole program. Any order
//!    error stops verification before the other checks run.
//! 2. **Structural**: opcode lookup, operand decoding, count and classes
//! 3. **Labels**: unique label names
//!
//! Labels referenced by jumps are resolved when the jump executes, not here.

pub mod error;
pub mod labels;
pub mod structural;

pub use error::VerifyError;

use std::collections::HashSet;

use log::debug;
use tac_common::{InstructionRecord, Program};

use labels::LabelTable;

/// Verify loader records and build a program.
///
/// Returns the program if every record passes, or `Err(Vec<VerifyError>)`
/// with all errors found, in record order. A record contributes at most
/// one error. When any order is invalid or repeated, only order errors
/// are returned.
pub fn verify(records: &[InstructionRecord]) -> Result<Program, Vec<VerifyError>> {
    if records.is_empty() {
        return Err(vec![VerifyError::EmptyProgram]);
    }

    // Orders first: per-record checks only run on a well-ordered program.
    let mut seen = HashSet::new();
    let mut orders = Vec::with_capacity(records.len());
    let mut errors = Vec::new();
    for record in records {
        match structural::check_order(record.order, &mut seen) {
            Ok(order) => orders.push(order),
            Err(e) => errors.push(e),
        }
    }
    if !errors.is_empty() {
        debug!("order check failed with {} error(s)", errors.len());
        return Err(errors);
    }

    let mut labels = LabelTable::new();
    let mut instructions = Vec::with_capacity(records.len());
    for (record, order) in records.iter().zip(orders) {
        let result = structural::check_record(record, order)
            .and_then(|instr| labels.define(&instr).map(|()| instr));

        match result {
            Ok(instr) => instructions.push(instr),
            Err(e) => errors.push(e),
        }
    }

    if !errors.is_empty() {
        debug!("verification failed with {} error(s)", errors.len());
        return Err(errors);
    }

    debug!(
        "verified {} instruction(s), {} label(s)",
        instructions.len(),
        labels.len()
    );
    Ok(Program::new(instructions, labels.into_map()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tac_common::ErrorKind;

    #[test]
    fn minimal_valid_program() {
        let program = verify(&[InstructionRecord::new(1, "CREATEFRAME")]).unwrap();
        assert_eq!(program.len(), 1);
        assert_eq!(program.max_order(), 1);
    }

    #[test]
    fn empty_program() {
        let errors = verify(&[]).unwrap_err();
        assert_eq!(errors, vec![VerifyError::EmptyProgram]);
    }

    #[test]
    fn multiple_errors_collected() {
        let records = vec![
            InstructionRecord::new(1, "NOPE"),
            InstructionRecord::new(3, "CREATEFRAME"),
            InstructionRecord::new(2, "MOVE"),
        ];
        let errors = verify(&records).unwrap_err();
        assert_eq!(errors.len(), 2, "got: {errors:?}");
        assert!(matches!(errors[0], VerifyError::UnknownOpcode { at: 1, .. }));
        assert!(matches!(errors[1], VerifyError::OperandCount { at: 2, .. }));
    }

    #[test]
    fn order_errors_come_before_record_errors() {
        let records = vec![
            InstructionRecord::new(1, "NOPE"),
            InstructionRecord::new(1, "CREATEFRAME"),
            InstructionRecord::new(0, "MOVE"),
        ];
        let errors = verify(&records).unwrap_err();
        assert_eq!(
            errors,
            vec![
                VerifyError::DuplicateOrder { at: 1 },
                VerifyError::InvalidOrder { at: 0 },
            ]
        );
        assert!(errors.iter().all(|e| e.kind() == ErrorKind::SourceStructure));
    }

    #[test]
    fn labels_registered() {
        let records = vec![
            InstructionRecord::new(5, "LABEL").label("end"),
            InstructionRecord::new(2, "JUMP").label("end"),
        ];
        let program = verify(&records).unwrap();
        assert_eq!(program.label("end"), Some(5));
    }

    #[test]
    fn undefined_jump_target_is_not_a_load_error() {
        let records = vec![InstructionRecord::new(1, "JUMP").label("nowhere")];
        assert!(verify(&records).is_ok());
    }

    #[test]
    fn duplicate_label() {
        let records = vec![
            InstructionRecord::new(1, "LABEL").label("x"),
            InstructionRecord::new(2, "LABEL").label("x"),
        ];
        let errors = verify(&records).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind(), ErrorKind::Redefinition);
    }
}

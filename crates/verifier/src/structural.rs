//! Structural validation of single records.
//!
//! Checks the order number, resolves the opcode, decodes every operand and
//! matches operand count and classes against the opcode's signature.

use std::collections::HashSet;

use crate::error::VerifyError;
use tac_common::{Instruction, InstructionRecord, Opcode, Operand};

/// Check a record's order number against the orders seen so far.
///
/// Returns the order as `u64` on success and records it in `seen`.
pub fn check_order(order: i64, seen: &mut HashSet<u64>) -> Result<u64, VerifyError> {
    let order = u64::try_from(order)
        .ok()
        .filter(|&o| o >= 1)
        .ok_or(VerifyError::InvalidOrder { at: order })?;

    if !seen.insert(order) {
        return Err(VerifyError::DuplicateOrder { at: order as i64 });
    }
    Ok(order)
}

/// Validate one record and build its [`Instruction`].
///
/// The order number must already have been checked with [`check_order`].
/// Checks run in this sequence, stopping at the first failure: opcode
/// lookup, operand decoding, operand count, operand classes.
pub fn check_record(record: &InstructionRecord, order: u64) -> Result<Instruction, VerifyError> {
    let at = record.order;

    let opcode = Opcode::from_mnemonic(&record.opcode).ok_or_else(|| VerifyError::UnknownOpcode {
        at,
        name: record.opcode.clone(),
    })?;

    let operands = record
        .operands
        .iter()
        .map(Operand::decode)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| VerifyError::Operand { at, source })?;

    let signature = opcode.signature();
    if operands.len() != signature.len() {
        return Err(VerifyError::OperandCount {
            at,
            opcode,
            expected: signature.len(),
            found: operands.len(),
        });
    }

    for (position, (operand, accepted)) in operands.iter().zip(signature).enumerate() {
        let class = operand.class();
        if !accepted.contains(&class) {
            return Err(VerifyError::OperandClass {
                at,
                opcode,
                position: position + 1,
                found: class,
            });
        }
    }

    Ok(Instruction::new(order, opcode, operands))
}

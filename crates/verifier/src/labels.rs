//! Label table construction.

use std::collections::HashMap;

use crate::error::VerifyError;
use tac_common::{Instruction, Opcode, Operand};

/// Label name to the order of its LABEL instruction.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: HashMap<String, u64>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the label defined by `instr`, if it is a LABEL.
    ///
    /// A second definition of the same name is rejected; the first one
    /// stays in the table.
    pub fn define(&mut self, instr: &Instruction) -> Result<(), VerifyError> {
        if instr.opcode != Opcode::Label {
            return Ok(());
        }
        let Some(Operand::Label(name)) = instr.operands.first() else {
            return Ok(());
        };

        if let Some(&first) = self.labels.get(name) {
            return Err(VerifyError::DuplicateLabel {
                at: instr.order as i64,
                label: name.clone(),
                first,
            });
        }
        self.labels.insert(name.clone(), instr.order);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn into_map(self) -> HashMap<String, u64> {
        self.labels
    }
}

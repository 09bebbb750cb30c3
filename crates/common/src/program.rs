//! Program representation.
//!
//! A program maps order numbers to instructions. Order numbers are positive
//! and unique but need not be contiguous, so the instruction map is keyed
//! by order and kept sorted. Labels map to the order of their LABEL
//! instruction.

use std::collections::{BTreeMap, HashMap};

use crate::instruction::Instruction;

/// A validated program plus its label table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    instructions: BTreeMap<u64, Instruction>,
    labels: HashMap<String, u64>,
}

impl Program {
    /// Build a program from already-validated parts.
    ///
    /// Callers are responsible for order uniqueness and label consistency;
    /// `tac_verifier::verify` is the checked way to construct one.
    pub fn new(instructions: Vec<Instruction>, labels: HashMap<String, u64>) -> Self {
        let instructions = instructions
            .into_iter()
            .map(|instr| (instr.order, instr))
            .collect();
        Self {
            instructions,
            labels,
        }
    }

    /// The instruction with exactly this order, if any.
    pub fn get(&self, order: u64) -> Option<&Instruction> {
        self.instructions.get(&order)
    }

    /// The first instruction whose order is `>= pc`.
    ///
    /// Stepping the counter one by one across a gap lands on the same
    /// instruction, so the engine uses this to skip gaps in one lookup.
    pub fn next_from(&self, pc: u64) -> Option<&Instruction> {
        self.instructions.range(pc..).next().map(|(_, instr)| instr)
    }

    /// Highest order number, or 0 for an empty program.
    pub fn max_order(&self) -> u64 {
        self.instructions.keys().next_back().copied().unwrap_or(0)
    }

    /// Order of the LABEL instruction defining `name`.
    pub fn label(&self, name: &str) -> Option<u64> {
        self.labels.get(name).copied()
    }

    /// Instructions in execution order.
    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.values()
    }

    /// Number of labels defined.
    pub fn label_count(&self) -> usize {
        self.labels.len()
    }

    /// Number of instructions in the program.
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// Returns true if the program has no instructions.
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

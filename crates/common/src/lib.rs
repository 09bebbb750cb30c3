//! Common types for the three-address instruction VM.
//!
//! This crate provides the data structures shared by the verifier and the
//! VM:
//!
//! - [`Opcode`]: the 35 opcodes and their operand signatures
//! - [`TypeTag`] and [`Value`]: runtime types and values
//! - [`Operand`], [`VarRef`], [`OperandClass`]: the operand model
//! - [`InstructionRecord`] and [`Instruction`]: loader input and its
//!   validated form
//! - [`Program`]: instructions keyed by order plus the label table
//! - [`ErrorKind`]: the failure taxonomy and its stable exit codes
//!
//! # Dependencies
//!
//! This crate uses `thiserror` and has no other dependencies.

pub mod error;
pub mod instruction;
pub mod opcode;
pub mod operand;
pub mod program;
pub mod type_tag;
pub mod value;

// Re-export commonly used types at the crate root.
pub use error::{ErrorKind, OperandError};
pub use instruction::{Instruction, InstructionRecord};
pub use opcode::Opcode;
pub use operand::{FrameKind, Operand, OperandClass, OperandRecord, VarRef};
pub use program::Program;
pub use type_tag::TypeTag;
pub use value::{decode_escapes, Value};

//! Virtual machine for three-address instruction programs.
//!
//! The VM is a frame-based machine with:
//! - A global frame, a stack of local frames and an optional temporary frame
//! - An operand stack for PUSHS/POPS
//! - A call stack of saved positions for CALL/RETURN
//! - A program counter over order numbers, starting at 1
//!
//! # Usage
//!
//! ```
//! use tac_common::InstructionRecord;
//! use tac_vm::{load_and_run, MemoryIo};
//!
//! let records = vec![
//!     InstructionRecord::new(1, "DEFVAR").var("GF@a"),
//!     InstructionRecord::new(2, "ADD").var("GF@a").int(5).int(3),
//!     InstructionRecord::new(3, "WRITE").var("GF@a"),
//! ];
//!
//! let mut io = MemoryIo::new();
//! let code = load_and_run(&records, &mut io).unwrap();
//! assert_eq!(code, 0);
//! assert_eq!(io.stdout(), "8");
//! ```

pub mod error;
pub mod execute;
pub mod frames;
pub mod io;
pub mod machine;
pub mod resolve;

pub use error::RuntimeError;
pub use frames::{FrameError, Frames};
pub use io::{Io, MemoryIo, StdIo};
pub use machine::{Machine, State};

use tac_common::{ErrorKind, InstructionRecord, Program};
use tac_verifier::VerifyError;
use thiserror::Error;

/// Any failure from loading or running a program.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// The records did not form a valid program.
    #[error("verification failed with {} error(s)", .0.len())]
    Verify(Vec<VerifyError>),

    /// Execution stopped on an error.
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl Error {
    /// Classification of this failure. For verification failures, the
    /// first error in record order decides.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Verify(errors) => errors
                .first()
                .map_or(ErrorKind::SourceStructure, VerifyError::kind),
            Error::Runtime(e) => e.kind(),
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> i32 {
        self.kind().code()
    }
}

/// Execute a verified program and return its exit code.
///
/// # Errors
///
/// Returns [`RuntimeError`] for the first failing instruction.
pub fn run<I: Io>(program: &Program, io: &mut I) -> Result<u8, RuntimeError> {
    Machine::new(program, io).run()
}

/// Verify loader records, then run the resulting program.
pub fn load_and_run<I: Io>(records: &[InstructionRecord], io: &mut I) -> Result<u8, Error> {
    let program = tac_verifier::verify(records).map_err(Error::Verify)?;
    Ok(run(&program, io)?)
}

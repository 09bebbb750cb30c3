//! Frame manager: the global frame, the local-frame stack and the
//! temporary frame.
//!
//! A variable cell is either absent (undeclared), `None` (declared but
//! unassigned) or `Some(value)`.

use std::collections::HashMap;

use tac_common::{ErrorKind, FrameKind, Value, VarRef};
use thiserror::Error;

type Frame = HashMap<String, Option<Value>>;

/// Errors from frame and variable operations.
///
/// These carry no instruction order; the machine attaches one when it
/// wraps them into a [`crate::RuntimeError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// LF with an empty local stack, or TF with no temporary frame.
    #[error("frame {0} does not exist")]
    NotAvailable(FrameKind),

    /// DEFVAR of a name already present in the frame.
    #[error("variable {0} already defined")]
    Redefinition(VarRef),

    /// Access to a name not declared in the frame.
    #[error("variable {0} is not defined")]
    Undefined(VarRef),

    /// Read of a declared variable that was never assigned.
    #[error("variable {0} has no value")]
    Uninitialized(VarRef),
}

impl FrameError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FrameError::NotAvailable(_) => ErrorKind::FrameNotAvailable,
            FrameError::Redefinition(_) => ErrorKind::Redefinition,
            FrameError::Undefined(_) => ErrorKind::VariableAccess,
            FrameError::Uninitialized(_) => ErrorKind::Value,
        }
    }
}

/// All frames owned by one machine.
#[derive(Debug, Clone, Default)]
pub struct Frames {
    global: Frame,
    locals: Vec<Frame>,
    temporary: Option<Frame>,
}

impl Frames {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame(&self, kind: FrameKind) -> Result<&Frame, FrameError> {
        match kind {
            FrameKind::Global => Some(&self.global),
            FrameKind::Local => self.locals.last(),
            FrameKind::Temporary => self.temporary.as_ref(),
        }
        .ok_or(FrameError::NotAvailable(kind))
    }

    fn frame_mut(&mut self, kind: FrameKind) -> Result<&mut Frame, FrameError> {
        match kind {
            FrameKind::Global => Some(&mut self.global),
            FrameKind::Local => self.locals.last_mut(),
            FrameKind::Temporary => self.temporary.as_mut(),
        }
        .ok_or(FrameError::NotAvailable(kind))
    }

    /// Declare `var` as unassigned. The frame is checked before the name.
    pub fn declare(&mut self, var: &VarRef) -> Result<(), FrameError> {
        let frame = self.frame_mut(var.frame)?;
        if frame.contains_key(&var.name) {
            return Err(FrameError::Redefinition(var.clone()));
        }
        frame.insert(var.name.clone(), None);
        Ok(())
    }

    /// The cell of a declared variable: `None` if it was never assigned.
    pub fn lookup(&self, var: &VarRef) -> Result<Option<&Value>, FrameError> {
        self.frame(var.frame)?
            .get(&var.name)
            .map(Option::as_ref)
            .ok_or_else(|| FrameError::Undefined(var.clone()))
    }

    /// The value of an assigned variable.
    pub fn read(&self, var: &VarRef) -> Result<&Value, FrameError> {
        self.lookup(var)?
            .ok_or_else(|| FrameError::Uninitialized(var.clone()))
    }

    /// Overwrite a declared variable.
    pub fn write(&mut self, var: &VarRef, value: Value) -> Result<(), FrameError> {
        let cell = self
            .frame_mut(var.frame)?
            .get_mut(&var.name)
            .ok_or_else(|| FrameError::Undefined(var.clone()))?;
        *cell = Some(value);
        Ok(())
    }

    /// Check that the frame exists and `var` is declared in it.
    pub fn ensure_declared(&self, var: &VarRef) -> Result<(), FrameError> {
        self.lookup(var).map(|_| ())
    }

    /// Install a fresh temporary frame, discarding any pending one.
    pub fn create_temporary(&mut self) {
        self.temporary = Some(Frame::new());
    }

    /// Move the temporary frame onto the local-frame stack.
    pub fn push(&mut self) -> Result<(), FrameError> {
        let frame = self
            .temporary
            .take()
            .ok_or(FrameError::NotAvailable(FrameKind::Temporary))?;
        self.locals.push(frame);
        Ok(())
    }

    /// Move the top local frame into the temporary slot.
    pub fn pop(&mut self) -> Result<(), FrameError> {
        let frame = self
            .locals
            .pop()
            .ok_or(FrameError::NotAvailable(FrameKind::Local))?;
        self.temporary = Some(frame);
        Ok(())
    }

    /// Number of frames on the local stack.
    pub fn local_depth(&self) -> usize {
        self.locals.len()
    }

    pub fn has_temporary(&self) -> bool {
        self.temporary.is_some()
    }

    /// Global variables sorted by name.
    pub fn globals(&self) -> Vec<(&str, Option<&Value>)> {
        let mut vars: Vec<_> = self
            .global
            .iter()
            .map(|(name, cell)| (name.as_str(), cell.as_ref()))
            .collect();
        vars.sort_by_key(|&(name, _)| name);
        vars
    }
}

//! GL error codes
//!
//! The drawing API reports failures through a single sticky error slot, the
//! same way `glGetError` works: state-mutation calls never return a value, a
//! failure is recorded and the caller polls for it.
//!
//! # Error Categories
//! - **Resource exhaustion**: vertex buffer growth, matrix stack overflow
//! - **Stack misuse**: popping an empty matrix stack
//! - **Call ordering**: `begin` inside `begin`, `end` without `begin`
//!
//! Requests for features the hardware cannot express (unsupported blend
//! factors, texture-env modes, tex-gen modes) are *not* errors: they are
//! ignored and traced through the diagnostics channel instead.

use thiserror::Error;

/// Errors recorded in the sticky error slot.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlError {
    /// An enumerated argument is out of range.
    #[error("invalid enum")]
    InvalidEnum,

    /// A numeric argument is out of range.
    #[error("invalid value")]
    InvalidValue,

    /// The operation is not allowed in the current state.
    #[error("invalid operation")]
    InvalidOperation,

    /// `push_matrix` on a full stack.
    #[error("matrix stack overflow")]
    StackOverflow,

    /// `pop_matrix` on an empty stack.
    #[error("matrix stack underflow")]
    StackUnderflow,

    /// Not enough memory left to execute the command.
    #[error("out of memory")]
    OutOfMemory,
}

impl GlError {
    /// The GL numeric code (`GL_INVALID_ENUM`, ...).
    pub const fn code(self) -> u32 {
        match self {
            GlError::InvalidEnum => 0x0500,
            GlError::InvalidValue => 0x0501,
            GlError::InvalidOperation => 0x0502,
            GlError::StackOverflow => 0x0503,
            GlError::StackUnderflow => 0x0504,
            GlError::OutOfMemory => 0x0505,
        }
    }
}

/// `GL_NO_ERROR`.
pub const NO_ERROR: u32 = 0;

/// Single-slot sticky error register.
///
/// Only the first error is kept; later errors are dropped until the slot is
/// read with [`ErrorSlot::take`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ErrorSlot {
    pending: Option<GlError>,
}

impl ErrorSlot {
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Record `error` unless one is already pending.
    #[cold]
    pub fn record(&mut self, error: GlError) {
        if self.pending.is_none() {
            self.pending = Some(error);
        } else {
            log::trace!(target: "ogx::warning", "dropping {error}: slot already holds an error");
        }
    }

    /// Read and clear the slot.
    pub fn take(&mut self) -> Option<GlError> {
        self.pending.take()
    }
}

/// Convenience alias for internal fallible helpers.
pub type GlResult<T> = Result<T, GlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_error_wins() {
        let mut slot = ErrorSlot::new();
        slot.record(GlError::StackOverflow);
        slot.record(GlError::OutOfMemory);
        assert_eq!(slot.take(), Some(GlError::StackOverflow));
        assert_eq!(slot.take(), None);
    }

    #[test]
    fn codes_match_gl() {
        assert_eq!(GlError::StackOverflow.code(), 0x0503);
        assert_eq!(GlError::StackUnderflow.code(), 0x0504);
        assert_eq!(GlError::OutOfMemory.code(), 0x0505);
    }
}

//! Status codes reported by backends across the plugin boundary.

use serde::{Deserialize, Serialize};

/// Status of one backend execution.
///
/// The raw values are part of the plugin ABI and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    Success,
    /// Generic failure.
    Failure,
    /// Execution requested an unwind with output.
    Revert,
    OutOfGas,
    /// The designated invalid instruction was executed.
    InvalidInstruction,
    /// An opcode not defined in the active revision was executed.
    UndefinedInstruction,
    StackOverflow,
    StackUnderflow,
    BadJumpDestination,
    InvalidMemoryAccess,
    CallDepthExceeded,
    /// State modification attempted in a static frame.
    StaticModeViolation,
    /// Backend internal error.
    InternalError,
    /// The backend declines to execute this call.
    Rejected,
    /// A code this host does not know about.
    Other(i32),
}

impl StatusCode {
    /// Returns the ABI value.
    pub fn as_raw(&self) -> i32 {
        match self {
            StatusCode::Success => 0,
            StatusCode::Failure => 1,
            StatusCode::Revert => 2,
            StatusCode::OutOfGas => 3,
            StatusCode::InvalidInstruction => 4,
            StatusCode::UndefinedInstruction => 5,
            StatusCode::StackOverflow => 6,
            StatusCode::StackUnderflow => 7,
            StatusCode::BadJumpDestination => 8,
            StatusCode::InvalidMemoryAccess => 9,
            StatusCode::CallDepthExceeded => 10,
            StatusCode::StaticModeViolation => 11,
            StatusCode::InternalError => -1,
            StatusCode::Rejected => -2,
            StatusCode::Other(code) => *code,
        }
    }

    /// Decodes an ABI value; unknown values become [`StatusCode::Other`].
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => StatusCode::Success,
            1 => StatusCode::Failure,
            2 => StatusCode::Revert,
            3 => StatusCode::OutOfGas,
            4 => StatusCode::InvalidInstruction,
            5 => StatusCode::UndefinedInstruction,
            6 => StatusCode::StackOverflow,
            7 => StatusCode::StackUnderflow,
            8 => StatusCode::BadJumpDestination,
            9 => StatusCode::InvalidMemoryAccess,
            10 => StatusCode::CallDepthExceeded,
            11 => StatusCode::StaticModeViolation,
            -1 => StatusCode::InternalError,
            -2 => StatusCode::Rejected,
            other => StatusCode::Other(other),
        }
    }
}

impl std::fmt::Display for StatusCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_raw())
    }
}

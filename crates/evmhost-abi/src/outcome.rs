//! Host-level result of one `exec` call.

use serde::Serialize;

/// Why a call frame failed. Every failure consumes all gas of the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum Failure {
    #[error("out of gas")]
    OutOfGas,
    #[error("invalid instruction")]
    InvalidInstruction,
    #[error("invalid jump destination")]
    InvalidJumpTarget,
    #[error("stack overflow")]
    StackOverflow,
    #[error("stack underflow")]
    StackUnderflow,
    #[error("state modification in static context")]
    StaticStateViolation,
    /// The backend returned a status code this host does not map.
    #[error("internal VM error (status code {0})")]
    InternalError(i32),
}

impl Failure {
    /// Whether the caller can treat this as an ordinary frame failure.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Failure::InternalError(_))
    }
}

/// Typed result of executing one call frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    Success { output: Vec<u8>, gas_left: u64 },
    /// The frame unwound voluntarily; the output explains why.
    Reverted { output: Vec<u8>, gas_left: u64 },
    Failure { failure: Failure },
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// Output bytes, empty for failures.
    pub fn output(&self) -> &[u8] {
        match self {
            Outcome::Success { output, .. } | Outcome::Reverted { output, .. } => output,
            Outcome::Failure { .. } => &[],
        }
    }

    /// Gas remaining after the frame; zero for failures.
    pub fn gas_left(&self) -> u64 {
        match self {
            Outcome::Success { gas_left, .. } | Outcome::Reverted { gas_left, .. } => *gas_left,
            Outcome::Failure { .. } => 0,
        }
    }

    pub fn failure(&self) -> Option<Failure> {
        match self {
            Outcome::Failure { failure } => Some(*failure),
            _ => None,
        }
    }
}

impl From<Failure> for Outcome {
    fn from(failure: Failure) -> Self {
        Outcome::Failure { failure }
    }
}

//! Error types shared by the host and its backends.

use thiserror::Error;

/// Common trait for host errors.
///
/// Gives every error a stable code and a category so front ends can report
/// errors from different layers uniformly, e.g. `[LOAD_001] ...`.
pub trait HostError: std::error::Error {
    /// Stable error code such as "EXEC_001" or "LOAD_002".
    fn code(&self) -> &'static str;

    /// Human-readable message; defaults to the `Display` output.
    fn message(&self) -> String {
        self.to_string()
    }

    /// Error category such as "exec", "load" or "config".
    fn category(&self) -> &'static str;
}

/// A caller handed a VM values that cannot cross the backend boundary.
///
/// This is a programming error in the caller: no backend is invoked and the
/// call must not be retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PreconditionError {
    #[error("gas {gas} exceeds the maximum of {}", i64::MAX)]
    GasOutOfRange { gas: u64 },

    #[error("block gas limit {gas_limit} exceeds the maximum of {}", i64::MAX)]
    GasLimitOutOfRange { gas_limit: u64 },

    #[error("block number {number} is negative")]
    NegativeBlockNumber { number: i64 },

    #[error("timestamp {timestamp} is negative")]
    NegativeTimestamp { timestamp: i64 },

    #[error("call depth {depth} exceeds the maximum of {}", i32::MAX)]
    DepthOutOfRange { depth: usize },
}

impl HostError for PreconditionError {
    fn code(&self) -> &'static str {
        match self {
            PreconditionError::GasOutOfRange { .. } => "EXEC_001",
            PreconditionError::GasLimitOutOfRange { .. } => "EXEC_002",
            PreconditionError::NegativeBlockNumber { .. } => "EXEC_003",
            PreconditionError::NegativeTimestamp { .. } => "EXEC_004",
            PreconditionError::DepthOutOfRange { .. } => "EXEC_005",
        }
    }

    fn category(&self) -> &'static str {
        "exec"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_display() {
        let err = PreconditionError::GasOutOfRange { gas: u64::MAX };
        assert_eq!(
            err.to_string(),
            "gas 18446744073709551615 exceeds the maximum of 9223372036854775807"
        );
        assert_eq!(err.code(), "EXEC_001");
        assert_eq!(err.category(), "exec");

        let err = PreconditionError::DepthOutOfRange { depth: 1 << 31 };
        assert_eq!(
            err.to_string(),
            "call depth 2147483648 exceeds the maximum of 2147483647"
        );
    }
}

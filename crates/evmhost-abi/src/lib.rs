//! evmhost shared types
//!
//! This crate holds the vocabulary shared between the evmhost dispatch layer
//! and the execution backends it drives:
//!
//! - [`revision`]: protocol revisions and revision selection from feature flags
//! - [`context`]: the execution context of one call frame and its ABI shape
//! - [`status`] / [`outcome`]: raw backend status codes and host-level outcomes
//! - [`backend`]: the [`Backend`] contract engines implement and the [`Vm`]
//!   capability interface callers execute through
//! - [`opcodes`]: opcode values and per-revision instruction names
//! - [`ffi`]: the versioned plugin ABI for backends in shared libraries
//!
//! # Example
//!
//! ```
//! use evmhost_abi::{select_revision, FeatureSchedule, Revision};
//!
//! let schedule = FeatureSchedule::for_revision(Revision::Byzantium);
//! assert_eq!(select_revision(&schedule), Revision::Byzantium);
//! assert_eq!(select_revision(&FeatureSchedule::default()), Revision::Frontier);
//! ```

pub mod backend;
pub mod context;
pub mod error;
pub mod ffi;
pub mod hex;
pub mod opcodes;
pub mod outcome;
pub mod revision;
pub mod status;

// Re-export commonly used types at the crate root
pub use backend::{Backend, ExecutionResult, SetOptionResult, Step, StepObserver, Vm, Word};
pub use context::{Address, EnvInfo, ExecutionContext, InvalidAddress, Message};
pub use error::{HostError, PreconditionError};
pub use ffi::{AbiError, ForeignBackend, ABI_VERSION, CREATE_SYMBOL_PREFIX};
pub use outcome::{Failure, Outcome};
pub use revision::{select_revision, FeatureSchedule, Revision, UnknownRevision};
pub use status::StatusCode;

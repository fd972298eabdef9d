//! The backend contract and the capability interface callers execute through.
//!
//! Two traits sit on either side of the adapter:
//!
//! - [`Backend`] is what an execution engine implements. It sees ABI-shaped
//!   arguments ([`Message`], a [`Revision`]) and answers with a raw
//!   [`ExecutionResult`] whose output borrows from the backend.
//! - [`Vm`] is what callers use. It takes the host-shaped
//!   [`ExecutionContext`], a mutable gas counter, and returns an owned
//!   [`Outcome`].

use crate::context::{ExecutionContext, Message};
use crate::error::PreconditionError;
use crate::outcome::Outcome;
use crate::revision::Revision;
use crate::status::StatusCode;

/// A 256-bit stack word, big-endian.
pub type Word = [u8; 32];

/// One executed instruction, as reported to a step observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step<'a> {
    /// Sequence number of the step within the call, starting at 0.
    pub index: u32,
    pub code_offset: usize,
    pub opcode: u8,
    /// Status after the instruction.
    pub status: StatusCode,
    pub gas_left: i64,
    /// Stack height after the instruction.
    pub stack_depth: usize,
    /// The single value pushed by the instruction, if it pushed one.
    pub pushed: Option<&'a Word>,
    /// Memory size in bytes after the instruction.
    pub memory_size: usize,
}

/// Receives every step a backend executes.
pub trait StepObserver {
    fn on_step(&mut self, step: &Step<'_>);
}

impl<F> StepObserver for F
where
    F: FnMut(&Step<'_>),
{
    fn on_step(&mut self, step: &Step<'_>) {
        self(step)
    }
}

/// Answer of a backend to one configuration option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetOptionResult {
    Accepted,
    /// The backend does not know this option.
    InvalidName,
    /// The option is known but the value is not acceptable.
    InvalidValue,
}

impl SetOptionResult {
    pub fn as_raw(&self) -> i32 {
        match self {
            SetOptionResult::Accepted => 0,
            SetOptionResult::InvalidName => 1,
            SetOptionResult::InvalidValue => 2,
        }
    }

    /// Unknown raw values are treated as a rejected name.
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => SetOptionResult::Accepted,
            2 => SetOptionResult::InvalidValue,
            _ => SetOptionResult::InvalidName,
        }
    }
}

/// Raw result of one backend execution.
///
/// The output borrows from the backend and is only valid until the backend is
/// used again or dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecutionResult<'a> {
    pub status: StatusCode,
    pub gas_left: i64,
    pub output: &'a [u8],
}

impl<'a> ExecutionResult<'a> {
    pub fn new(status: StatusCode, gas_left: i64, output: &'a [u8]) -> Self {
        Self {
            status,
            gas_left,
            output,
        }
    }

    /// A result with no gas left and no output.
    pub fn failure(status: StatusCode) -> ExecutionResult<'static> {
        ExecutionResult {
            status,
            gas_left: 0,
            output: &[],
        }
    }
}

/// An execution engine.
///
/// Built-in engines implement this directly; engines loaded from shared
/// libraries are bridged to it by [`crate::ffi::ForeignBackend`]. Dropping a
/// backend releases the instance.
pub trait Backend: Send {
    /// Self-reported name, used as the registry key for loaded backends.
    fn name(&self) -> &str;

    fn version(&self) -> &str;

    /// Applies one configuration option. Duplicate handling is up to the backend.
    fn set_option(&mut self, name: &str, value: &str) -> SetOptionResult {
        let _ = (name, value);
        SetOptionResult::InvalidName
    }

    /// Executes `message` under `revision`, reporting each step to `observer`.
    fn execute(
        &mut self,
        revision: Revision,
        message: &Message<'_>,
        observer: Option<&mut dyn StepObserver>,
    ) -> ExecutionResult<'_>;
}

/// Capability interface: execute one call frame under gas metering.
pub trait Vm: Send {
    /// Name of the backend behind this VM.
    fn name(&self) -> &str;

    /// Executes one call frame.
    ///
    /// `gas` is updated in place to the gas remaining (zero on failure).
    /// Values that cannot cross the backend boundary are rejected with a
    /// [`PreconditionError`] before any backend is invoked.
    fn exec(
        &mut self,
        gas: &mut u64,
        ctx: &ExecutionContext<'_>,
        observer: Option<&mut dyn StepObserver>,
    ) -> Result<Outcome, PreconditionError>;
}

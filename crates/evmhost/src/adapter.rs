//! The VM adapter: wraps one backend instance behind the [`Vm`] interface.
//!
//! On each call the adapter:
//!
//! 1. rejects values that do not fit the backend boundary
//!    ([`PreconditionError`]); no backend call is made,
//! 2. selects the revision from the context's feature schedule,
//! 3. narrows the context into a [`Message`] and executes it,
//! 4. copies the output and maps the status to an [`Outcome`].
//!
//! A backend answering [`StatusCode::Rejected`] hands the call to a fresh
//! instance of the fallback backend, with the same gas and context. The
//! fallback instance never falls back itself, so a second rejection ends the
//! call with `InternalError`.

use std::sync::Arc;

use evmhost_abi::{
    select_revision, Backend, ExecutionContext, Failure, Message, Outcome, PreconditionError,
    Revision, SetOptionResult, StatusCode, Step, StepObserver, Vm,
};

use crate::options::OptionList;
use crate::registry::Constructor;
use crate::trace::{StepPrinter, TraceSink};
use crate::{error, warn};

/// Result of mapping a backend status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusMapping {
    Outcome(Outcome),
    /// The backend declined the call; run it elsewhere.
    Fallback,
}

/// Maps a raw backend status to a host outcome.
///
/// `output` is only kept for success and revert.
pub fn map_status(status: StatusCode, gas_left: i64, output: &[u8]) -> StatusMapping {
    let gas_left = u64::try_from(gas_left).unwrap_or(0);
    let outcome = match status {
        StatusCode::Success => Outcome::Success {
            output: output.to_vec(),
            gas_left,
        },
        StatusCode::Revert => Outcome::Reverted {
            output: output.to_vec(),
            gas_left,
        },
        StatusCode::OutOfGas | StatusCode::Failure => Failure::OutOfGas.into(),
        StatusCode::UndefinedInstruction => Failure::InvalidInstruction.into(),
        StatusCode::BadJumpDestination => Failure::InvalidJumpTarget.into(),
        StatusCode::StackOverflow => Failure::StackOverflow.into(),
        StatusCode::StackUnderflow => Failure::StackUnderflow.into(),
        StatusCode::StaticModeViolation => Failure::StaticStateViolation.into(),
        StatusCode::Rejected => return StatusMapping::Fallback,
        other => Failure::InternalError(other.as_raw()).into(),
    };
    StatusMapping::Outcome(outcome)
}

/// Narrows `ctx` into the shape a backend receives, checking every value
/// that must fit a signed backend integer.
pub fn check_preconditions<'a>(
    gas: u64,
    ctx: &ExecutionContext<'a>,
) -> Result<Message<'a>, PreconditionError> {
    let gas = i64::try_from(gas).map_err(|_| PreconditionError::GasOutOfRange { gas })?;
    if i64::try_from(ctx.env.gas_limit).is_err() {
        return Err(PreconditionError::GasLimitOutOfRange {
            gas_limit: ctx.env.gas_limit,
        });
    }
    if ctx.env.number < 0 {
        return Err(PreconditionError::NegativeBlockNumber {
            number: ctx.env.number,
        });
    }
    if ctx.env.timestamp < 0 {
        return Err(PreconditionError::NegativeTimestamp {
            timestamp: ctx.env.timestamp,
        });
    }
    let depth = i32::try_from(ctx.depth)
        .map_err(|_| PreconditionError::DepthOutOfRange { depth: ctx.depth })?;

    Ok(Message {
        depth,
        gas,
        caller: ctx.caller,
        callee: ctx.callee,
        code: ctx.code,
        input: ctx.input,
        is_static: ctx.is_static,
    })
}

/// Backend used when the wrapped one rejects a call.
#[derive(Clone)]
pub struct Fallback {
    pub name: String,
    pub constructor: Constructor,
    pub options: Arc<OptionList>,
}

impl std::fmt::Debug for Fallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fallback")
            .field("name", &self.name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

/// Feeds each step to the trace printer and to the caller's observer.
struct Observers<'a, 'b, 'c> {
    printer: Option<(&'a mut StepPrinter, Revision)>,
    caller: Option<&'b mut (dyn StepObserver + 'c)>,
}

impl StepObserver for Observers<'_, '_, '_> {
    fn on_step(&mut self, step: &Step<'_>) {
        if let Some((printer, revision)) = self.printer.as_mut() {
            printer.step(*revision, step);
        }
        if let Some(caller) = self.caller.as_deref_mut() {
            caller.on_step(step);
        }
    }
}

/// One backend instance behind the [`Vm`] interface.
pub struct VmAdapter {
    backend: Box<dyn Backend>,
    fallback: Option<Fallback>,
    tracer: Option<StepPrinter>,
}

impl VmAdapter {
    /// Wraps `backend`, applying `options` to it in order.
    ///
    /// Options the backend does not accept are reported and skipped.
    pub fn new(mut backend: Box<dyn Backend>, options: &OptionList) -> Self {
        for option in options {
            match backend.set_option(&option.name, &option.value) {
                SetOptionResult::Accepted => {}
                SetOptionResult::InvalidName => {
                    warn!("Unknown option '{}' for VM {}", option.name, backend.name());
                }
                SetOptionResult::InvalidValue => {
                    warn!(
                        "Invalid value '{}' for option '{}' of VM {}",
                        option.value,
                        option.name,
                        backend.name()
                    );
                }
            }
        }
        Self {
            backend,
            fallback: None,
            tracer: None,
        }
    }

    /// Sets the backend that handles rejected calls.
    pub fn with_fallback(mut self, fallback: Fallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Traces calls and steps to stderr.
    pub fn with_trace(self) -> Self {
        self.with_trace_printer(StepPrinter::stderr())
    }

    /// Traces calls and steps to `sink`.
    pub fn with_trace_sink(self, sink: TraceSink) -> Self {
        self.with_trace_printer(StepPrinter::new(sink))
    }

    fn with_trace_printer(mut self, printer: StepPrinter) -> Self {
        self.tracer = Some(printer);
        self
    }

    pub fn backend(&self) -> &dyn Backend {
        self.backend.as_ref()
    }

    pub fn fallback(&self) -> Option<&Fallback> {
        self.fallback.as_ref()
    }

    pub fn is_tracing(&self) -> bool {
        self.tracer.is_some()
    }

    fn fall_back(
        &mut self,
        gas: &mut u64,
        ctx: &ExecutionContext<'_>,
        observer: Option<&mut dyn StepObserver>,
    ) -> Result<Outcome, PreconditionError> {
        let rejected = Failure::InternalError(StatusCode::Rejected.as_raw());
        let Some(fallback) = self.fallback.as_ref() else {
            *gas = 0;
            return Ok(rejected.into());
        };

        warn!(
            "Execution rejected by {}, executing with default VM implementation {}",
            self.backend.name(),
            fallback.name
        );

        let backend = match (fallback.constructor)() {
            Ok(backend) => backend,
            Err(e) => {
                error!("Failed to instantiate default VM {}: {}", fallback.name, e);
                *gas = 0;
                return Ok(rejected.into());
            }
        };

        let mut adapter = VmAdapter::new(backend, &fallback.options);
        adapter.tracer = self.tracer.take();
        let outcome = adapter.exec(gas, ctx, observer);
        self.tracer = adapter.tracer.take();
        outcome
    }
}

impl Vm for VmAdapter {
    fn name(&self) -> &str {
        self.backend.name()
    }

    fn exec(
        &mut self,
        gas: &mut u64,
        ctx: &ExecutionContext<'_>,
        mut observer: Option<&mut dyn StepObserver>,
    ) -> Result<Outcome, PreconditionError> {
        let message = check_preconditions(*gas, ctx)?;
        let revision = select_revision(&ctx.schedule);

        if let Some(tracer) = self.tracer.as_mut() {
            tracer.message_start(ctx.depth, &ctx.caller, &ctx.callee, message.gas);
        }

        let (status, gas_left, mapping) = {
            let mut observers = Observers {
                printer: self.tracer.as_mut().map(|printer| (printer, revision)),
                caller: observer.as_deref_mut(),
            };
            let hook: Option<&mut dyn StepObserver> =
                if observers.printer.is_some() || observers.caller.is_some() {
                    Some(&mut observers)
                } else {
                    None
                };
            let result = self.backend.execute(revision, &message, hook);
            (
                result.status,
                result.gas_left,
                map_status(result.status, result.gas_left, result.output),
            )
        };

        if let Some(tracer) = self.tracer.as_mut() {
            tracer.message_end(ctx.depth, status, gas_left);
        }

        match mapping {
            StatusMapping::Outcome(outcome) => {
                *gas = outcome.gas_left();
                Ok(outcome)
            }
            StatusMapping::Fallback => self.fall_back(gas, ctx, observer),
        }
    }
}

impl std::fmt::Debug for VmAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VmAdapter")
            .field("backend", &self.backend.name())
            .field("fallback", &self.fallback.as_ref().map(|f| f.name.as_str()))
            .field("tracing", &self.tracer.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests;

use std::io::Write;
use std::sync::{Arc, Mutex};

use evmhost_abi::{
    AbiError, Address, EnvInfo, ExecutionResult, FeatureSchedule, Revision, StatusCode,
};
use pretty_assertions::assert_eq;

use super::*;
use crate::options::VmOption;

// ============================================================================
// Helpers
// ============================================================================

/// What a scripted backend saw.
#[derive(Debug, Default)]
struct Seen {
    options: Vec<(String, String)>,
    calls: Vec<(Revision, i64, i32, Vec<u8>)>,
}

/// Backend answering every call with a fixed result.
struct Scripted {
    status: StatusCode,
    gas_left: i64,
    output: Vec<u8>,
    steps: u32,
    seen: Arc<Mutex<Seen>>,
}

impl Scripted {
    fn new(status: StatusCode, gas_left: i64, output: &[u8]) -> (Self, Arc<Mutex<Seen>>) {
        let seen = Arc::new(Mutex::new(Seen::default()));
        let backend = Self {
            status,
            gas_left,
            output: output.to_vec(),
            steps: 0,
            seen: Arc::clone(&seen),
        };
        (backend, seen)
    }

    fn with_steps(mut self, steps: u32) -> Self {
        self.steps = steps;
        self
    }
}

impl Backend for Scripted {
    fn name(&self) -> &str {
        "scripted"
    }

    fn version(&self) -> &str {
        "0.0.1"
    }

    fn set_option(&mut self, name: &str, value: &str) -> SetOptionResult {
        self.seen
            .lock()
            .unwrap()
            .options
            .push((name.to_string(), value.to_string()));
        if name == "known" {
            SetOptionResult::Accepted
        } else {
            SetOptionResult::InvalidName
        }
    }

    fn execute(
        &mut self,
        revision: Revision,
        message: &Message<'_>,
        mut observer: Option<&mut dyn StepObserver>,
    ) -> ExecutionResult<'_> {
        self.seen.lock().unwrap().calls.push((
            revision,
            message.gas,
            message.depth,
            message.code.to_vec(),
        ));
        for index in 0..self.steps {
            if let Some(observer) = observer.as_deref_mut() {
                observer.on_step(&Step {
                    index,
                    code_offset: index as usize,
                    opcode: 0x01,
                    status: StatusCode::Success,
                    gas_left: message.gas - 3 * (index as i64 + 1),
                    stack_depth: 1,
                    pushed: None,
                    memory_size: 0,
                });
            }
        }
        ExecutionResult::new(self.status, self.gas_left, &self.output)
    }
}

fn fallback_to(status: StatusCode, gas_left: i64, output: &[u8]) -> (Fallback, Arc<Mutex<Seen>>) {
    let seen = Arc::new(Mutex::new(Seen::default()));
    let shared = Arc::clone(&seen);
    let output = output.to_vec();
    let constructor: Constructor = Arc::new(move || -> Result<Box<dyn Backend>, AbiError> {
        Ok(Box::new(Scripted {
            status,
            gas_left,
            output: output.clone(),
            steps: 0,
            seen: Arc::clone(&shared),
        }))
    });
    let fallback = Fallback {
        name: "reference".into(),
        constructor,
        options: Arc::new(OptionList::new()),
    };
    (fallback, seen)
}

fn adapter(status: StatusCode, gas_left: i64, output: &[u8]) -> (VmAdapter, Arc<Mutex<Seen>>) {
    let (backend, seen) = Scripted::new(status, gas_left, output);
    (VmAdapter::new(Box::new(backend), &OptionList::new()), seen)
}

const CODE: &[u8] = &[0x00];

/// Shared in-memory trace sink.
#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

// ============================================================================
// Status mapping
// ============================================================================

#[test]
fn test_map_status_table() {
    let failure = |status| match map_status(status, 50, b"x") {
        StatusMapping::Outcome(Outcome::Failure { failure }) => failure,
        other => panic!("unexpected mapping {:?}", other),
    };
    assert_eq!(failure(StatusCode::OutOfGas), Failure::OutOfGas);
    assert_eq!(failure(StatusCode::Failure), Failure::OutOfGas);
    assert_eq!(failure(StatusCode::UndefinedInstruction), Failure::InvalidInstruction);
    assert_eq!(failure(StatusCode::BadJumpDestination), Failure::InvalidJumpTarget);
    assert_eq!(failure(StatusCode::StackOverflow), Failure::StackOverflow);
    assert_eq!(failure(StatusCode::StackUnderflow), Failure::StackUnderflow);
    assert_eq!(failure(StatusCode::StaticModeViolation), Failure::StaticStateViolation);
    assert_eq!(failure(StatusCode::Other(77)), Failure::InternalError(77));
    assert_eq!(
        failure(StatusCode::InternalError),
        Failure::InternalError(StatusCode::InternalError.as_raw())
    );
    assert_eq!(map_status(StatusCode::Rejected, 50, b""), StatusMapping::Fallback);
}

#[test]
fn test_map_status_keeps_output_for_success_and_revert() {
    assert_eq!(
        map_status(StatusCode::Success, 10, b"ok"),
        StatusMapping::Outcome(Outcome::Success {
            output: b"ok".to_vec(),
            gas_left: 10
        })
    );
    assert_eq!(
        map_status(StatusCode::Revert, 4, &[0xaa, 0xbb]),
        StatusMapping::Outcome(Outcome::Reverted {
            output: vec![0xaa, 0xbb],
            gas_left: 4
        })
    );
}

#[test]
fn test_map_status_clamps_negative_gas() {
    assert_eq!(
        map_status(StatusCode::Success, -5, b""),
        StatusMapping::Outcome(Outcome::Success {
            output: Vec::new(),
            gas_left: 0
        })
    );
}

// ============================================================================
// Preconditions
// ============================================================================

#[test]
fn test_preconditions_accept_boundaries() {
    let ctx = ExecutionContext::new(CODE)
        .with_depth(i32::MAX as usize)
        .with_env(EnvInfo {
            number: 0,
            timestamp: 0,
            gas_limit: i64::MAX as u64,
        });
    let message = check_preconditions(i64::MAX as u64, &ctx).unwrap();
    assert_eq!(message.gas, i64::MAX);
    assert_eq!(message.depth, i32::MAX);
}

#[test]
fn test_preconditions_reject_out_of_range_values() {
    let ctx = ExecutionContext::new(CODE);
    assert_eq!(
        check_preconditions(i64::MAX as u64 + 1, &ctx).unwrap_err(),
        PreconditionError::GasOutOfRange {
            gas: i64::MAX as u64 + 1
        }
    );

    let deep = ExecutionContext::new(CODE).with_depth(i32::MAX as usize + 1);
    assert!(matches!(
        check_preconditions(1, &deep),
        Err(PreconditionError::DepthOutOfRange { .. })
    ));

    let env = |number, timestamp, gas_limit| {
        ExecutionContext::new(CODE).with_env(EnvInfo {
            number,
            timestamp,
            gas_limit,
        })
    };
    assert_eq!(
        check_preconditions(1, &env(-1, 0, 0)).unwrap_err(),
        PreconditionError::NegativeBlockNumber { number: -1 }
    );
    assert_eq!(
        check_preconditions(1, &env(0, -3, 0)).unwrap_err(),
        PreconditionError::NegativeTimestamp { timestamp: -3 }
    );
    assert_eq!(
        check_preconditions(1, &env(0, 0, u64::MAX)).unwrap_err(),
        PreconditionError::GasLimitOutOfRange {
            gas_limit: u64::MAX
        }
    );
}

#[test]
fn test_precondition_failure_skips_backend() {
    let (mut vm, seen) = adapter(StatusCode::Success, 0, b"");
    let mut gas = u64::MAX;
    let result = vm.exec(&mut gas, &ExecutionContext::new(CODE), None);
    assert!(result.is_err());
    assert_eq!(gas, u64::MAX);
    assert!(seen.lock().unwrap().calls.is_empty());
}

// ============================================================================
// Execution
// ============================================================================

#[test]
fn test_success_updates_gas() {
    let (mut vm, seen) = adapter(StatusCode::Success, 400, b"out");
    let mut gas = 1000;
    let outcome = vm.exec(&mut gas, &ExecutionContext::new(CODE), None).unwrap();
    assert_eq!(
        outcome,
        Outcome::Success {
            output: b"out".to_vec(),
            gas_left: 400
        }
    );
    assert_eq!(gas, 400);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.calls, vec![(Revision::Frontier, 1000, 0, CODE.to_vec())]);
}

#[test]
fn test_failure_consumes_all_gas() {
    let (mut vm, _) = adapter(StatusCode::StackUnderflow, 900, b"");
    let mut gas = 1000;
    let outcome = vm.exec(&mut gas, &ExecutionContext::new(CODE), None).unwrap();
    assert_eq!(outcome.failure(), Some(Failure::StackUnderflow));
    assert_eq!(gas, 0);
}

#[test]
fn test_revision_follows_schedule_on_every_call() {
    let (mut vm, seen) = adapter(StatusCode::Success, 1, b"");
    for revision in [Revision::Byzantium, Revision::Homestead] {
        let ctx = ExecutionContext::new(CODE).with_schedule(FeatureSchedule::for_revision(revision));
        let mut gas = 10;
        vm.exec(&mut gas, &ctx, None).unwrap();
    }
    let revisions: Vec<_> = seen.lock().unwrap().calls.iter().map(|c| c.0).collect();
    assert_eq!(revisions, vec![Revision::Byzantium, Revision::Homestead]);
}

#[test]
fn test_options_applied_in_order() {
    let (backend, seen) = Scripted::new(StatusCode::Success, 0, b"");
    let options: OptionList = vec![
        VmOption::new("x", "1"),
        VmOption::new("known", "yes"),
        VmOption::new("x", "2"),
    ]
    .into_iter()
    .collect();
    let _vm = VmAdapter::new(Box::new(backend), &options);
    assert_eq!(
        seen.lock().unwrap().options,
        vec![
            ("x".to_string(), "1".to_string()),
            ("known".to_string(), "yes".to_string()),
            ("x".to_string(), "2".to_string()),
        ]
    );
}

#[test]
fn test_caller_observer_sees_every_step() {
    let (backend, _) = Scripted::new(StatusCode::Success, 1, b"");
    let mut vm = VmAdapter::new(Box::new(backend.with_steps(3)), &OptionList::new());
    let mut offsets = Vec::new();
    let mut observer = |step: &Step<'_>| offsets.push(step.code_offset);
    let mut gas = 100;
    vm.exec(&mut gas, &ExecutionContext::new(CODE), Some(&mut observer))
        .unwrap();
    assert_eq!(offsets, vec![0, 1, 2]);
}

// ============================================================================
// Fallback
// ============================================================================

#[test]
fn test_rejection_runs_fallback_once_with_same_inputs() {
    let (primary, primary_seen) = Scripted::new(StatusCode::Rejected, 0, b"");
    let (fallback, fallback_seen) = fallback_to(StatusCode::Success, 70, b"fb");
    let mut vm = VmAdapter::new(Box::new(primary), &OptionList::new()).with_fallback(fallback);

    let ctx = ExecutionContext::new(CODE)
        .with_depth(3)
        .with_schedule(FeatureSchedule::for_revision(Revision::SpuriousDragon));
    let mut gas = 500;
    let outcome = vm.exec(&mut gas, &ctx, None).unwrap();

    assert_eq!(
        outcome,
        Outcome::Success {
            output: b"fb".to_vec(),
            gas_left: 70
        }
    );
    assert_eq!(gas, 70);
    let primary_seen = primary_seen.lock().unwrap();
    let fallback_seen = fallback_seen.lock().unwrap();
    assert_eq!(primary_seen.calls.len(), 1);
    assert_eq!(fallback_seen.calls, primary_seen.calls);
}

#[test]
fn test_fallback_gets_fresh_instance_per_call() {
    let (primary, _) = Scripted::new(StatusCode::Rejected, 0, b"");
    let (fallback, fallback_seen) = fallback_to(StatusCode::Success, 1, b"");
    let mut vm = VmAdapter::new(Box::new(primary), &OptionList::new()).with_fallback(Fallback {
        options: Arc::new(vec![VmOption::new("known", "1")].into_iter().collect()),
        ..fallback
    });
    for _ in 0..2 {
        let mut gas = 10;
        vm.exec(&mut gas, &ExecutionContext::new(CODE), None).unwrap();
    }
    let seen = fallback_seen.lock().unwrap();
    assert_eq!(seen.calls.len(), 2);
    // Options are applied to each new instance.
    assert_eq!(seen.options.len(), 2);
}

#[test]
fn test_second_rejection_is_internal_error() {
    let (primary, _) = Scripted::new(StatusCode::Rejected, 0, b"");
    let (fallback, fallback_seen) = fallback_to(StatusCode::Rejected, 0, b"");
    let mut vm = VmAdapter::new(Box::new(primary), &OptionList::new()).with_fallback(fallback);
    let mut gas = 500;
    let outcome = vm.exec(&mut gas, &ExecutionContext::new(CODE), None).unwrap();
    assert_eq!(outcome.failure(), Some(Failure::InternalError(-2)));
    assert_eq!(gas, 0);
    assert_eq!(fallback_seen.lock().unwrap().calls.len(), 1);
}

#[test]
fn test_rejection_without_fallback_is_internal_error() {
    let (mut vm, _) = adapter(StatusCode::Rejected, 0, b"");
    let mut gas = 500;
    let outcome = vm.exec(&mut gas, &ExecutionContext::new(CODE), None).unwrap();
    assert_eq!(outcome, Outcome::from(Failure::InternalError(-2)));
    assert_eq!(gas, 0);
}

#[test]
fn test_fallback_construction_failure_is_internal_error() {
    let (primary, _) = Scripted::new(StatusCode::Rejected, 0, b"");
    let constructor: Constructor =
        Arc::new(|| -> Result<Box<dyn Backend>, AbiError> { Err(AbiError::NullInstance) });
    let mut vm = VmAdapter::new(Box::new(primary), &OptionList::new()).with_fallback(Fallback {
        name: "broken".into(),
        constructor,
        options: Arc::new(OptionList::new()),
    });
    let mut gas = 500;
    let outcome = vm.exec(&mut gas, &ExecutionContext::new(CODE), None).unwrap();
    assert_eq!(outcome.failure(), Some(Failure::InternalError(-2)));
}

// ============================================================================
// Tracing
// ============================================================================

#[test]
fn test_trace_lines_for_call_and_steps() {
    let (backend, _) = Scripted::new(StatusCode::Success, 94, b"");
    let sink = Captured::default();
    let mut vm = VmAdapter::new(Box::new(backend.with_steps(2)), &OptionList::new())
        .with_trace_sink(Box::new(sink.clone()));
    assert!(vm.is_tracing());

    let ctx = ExecutionContext::new(CODE).with_addresses(Address::from_low_u8(1), Address::from_low_u8(2));
    let mut gas = 100;
    vm.exec(&mut gas, &ctx, None).unwrap();

    let text = sink.text();
    let lines: Vec<_> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("message START 0 0x"));
    assert!(lines[0].ends_with("gas: 100"));
    assert_eq!(lines[1], "0 0 ADD 0 97 1 0");
    assert_eq!(lines[2], "1 1 ADD 0 94 1 0");
    assert_eq!(lines[3], "message END   0 status: 0 gas left: 94");
}

#[test]
fn test_trace_follows_fallback() {
    let (primary, _) = Scripted::new(StatusCode::Rejected, 0, b"");
    let (fallback, _) = fallback_to(StatusCode::Success, 7, b"");
    let sink = Captured::default();
    let mut vm = VmAdapter::new(Box::new(primary), &OptionList::new())
        .with_fallback(fallback)
        .with_trace_sink(Box::new(sink.clone()));
    let mut gas = 10;
    vm.exec(&mut gas, &ExecutionContext::new(CODE), None).unwrap();

    let text = sink.text();
    let ends: Vec<_> = text.lines().filter(|l| l.starts_with("message END")).collect();
    assert_eq!(
        ends,
        vec![
            "message END   0 status: -2 gas left: 0",
            "message END   0 status: 0 gas left: 7",
        ]
    );
    // The printer comes back after the fallback call.
    assert!(vm.is_tracing());
}

//! Shared fixtures for host integration tests.

#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use evmhost::registry::{BackendKind, Constructor};
use evmhost::HostConfig;
use evmhost_abi::{
    AbiError, Backend, ExecutionResult, Message, Revision, SetOptionResult, StatusCode,
    StepObserver,
};

/// One call as seen by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub revision: Revision,
    pub gas: i64,
    pub depth: i32,
    pub code: Vec<u8>,
    pub input: Vec<u8>,
    pub is_static: bool,
}

/// Everything observed by recorders built from one [`Journal`].
#[derive(Debug, Default)]
pub struct Journal {
    pub instances: usize,
    pub options: Vec<Vec<(String, String)>>,
    pub calls: Vec<RecordedCall>,
}

pub type SharedJournal = Arc<Mutex<Journal>>;

/// Backend that records options and calls, answering with a fixed status.
pub struct Recorder {
    instance: usize,
    status: StatusCode,
    journal: SharedJournal,
}

impl Backend for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn version(&self) -> &str {
        "1.0.0"
    }

    fn set_option(&mut self, name: &str, value: &str) -> SetOptionResult {
        self.journal.lock().unwrap().options[self.instance]
            .push((name.to_string(), value.to_string()));
        SetOptionResult::Accepted
    }

    fn execute(
        &mut self,
        revision: Revision,
        message: &Message<'_>,
        _observer: Option<&mut dyn StepObserver>,
    ) -> ExecutionResult<'_> {
        self.journal.lock().unwrap().calls.push(RecordedCall {
            revision,
            gas: message.gas,
            depth: message.depth,
            code: message.code.to_vec(),
            input: message.input.to_vec(),
            is_static: message.is_static,
        });
        let gas_left = if self.status == StatusCode::Success {
            message.gas
        } else {
            0
        };
        ExecutionResult::new(self.status, gas_left, &[])
    }
}

/// Constructor for recorders answering `status`, plus their journal.
pub fn recorder(status: StatusCode) -> (Constructor, SharedJournal) {
    let journal = SharedJournal::default();
    let shared = Arc::clone(&journal);
    let constructor: Constructor = Arc::new(move || -> Result<Box<dyn Backend>, AbiError> {
        let mut journal = shared.lock().unwrap();
        let instance = journal.instances;
        journal.instances += 1;
        journal.options.push(Vec::new());
        Ok(Box::new(Recorder {
            instance,
            status,
            journal: Arc::clone(&shared),
        }))
    });
    (constructor, journal)
}

/// A host configuration with a recorder registered under `name`.
pub fn config_with_recorder(name: &str, status: StatusCode) -> (HostConfig, SharedJournal) {
    let (constructor, journal) = recorder(status);
    let mut config = HostConfig::new();
    config
        .registry_mut()
        .register(name, BackendKind::Builtin, constructor);
    (config, journal)
}

/// Cloneable in-memory trace sink.
#[derive(Clone, Default)]
pub struct CapturedTrace(Arc<Mutex<Vec<u8>>>);

impl CapturedTrace {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for CapturedTrace {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

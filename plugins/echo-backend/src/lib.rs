//! Reference evmhost plugin.
//!
//! Build with `cargo build --release` in this directory and load the
//! resulting library with `evmhost --vm-load <path> --vm echo run ...`.
//! The backend returns its code as output and charges one gas per code byte.

use evmhost_abi::{
    Backend, ExecutionResult, Message, Revision, SetOptionResult, StatusCode, StepObserver,
};

pub const NAME: &str = "echo";

#[derive(Debug)]
pub struct EchoBackend {
    output: Vec<u8>,
    /// Gas charged per code byte.
    byte_cost: i64,
}

impl EchoBackend {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            byte_cost: 1,
        }
    }
}

impl Default for EchoBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for EchoBackend {
    fn name(&self) -> &str {
        NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn set_option(&mut self, name: &str, value: &str) -> SetOptionResult {
        match name {
            "byte-cost" => match value.parse::<i64>() {
                Ok(cost) if cost >= 0 => {
                    self.byte_cost = cost;
                    SetOptionResult::Accepted
                }
                _ => SetOptionResult::InvalidValue,
            },
            _ => SetOptionResult::InvalidName,
        }
    }

    fn execute(
        &mut self,
        _revision: Revision,
        message: &Message<'_>,
        _observer: Option<&mut dyn StepObserver>,
    ) -> ExecutionResult<'_> {
        let cost = (message.code.len() as i64).saturating_mul(self.byte_cost);
        if cost > message.gas {
            return ExecutionResult::failure(StatusCode::OutOfGas);
        }
        self.output.clear();
        self.output.extend_from_slice(message.code);
        ExecutionResult::new(StatusCode::Success, message.gas - cost, &self.output)
    }
}

evmhost_abi::export_backend!(evmhost_create_echo_backend, EchoBackend::new());

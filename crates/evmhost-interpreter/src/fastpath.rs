//! Straight-line accelerated backend.
//!
//! Skips jump analysis entirely and only accepts code without control flow.
//! Anything containing `JUMP` or `JUMPI` is answered with
//! [`StatusCode::Rejected`] before a single step runs, so the host can hand
//! the call to the reference interpreter.

use evmhost_abi::opcodes::{self, JUMP, JUMPI};
use evmhost_abi::{
    Backend, ExecutionResult, Message, Revision, SetOptionResult, StatusCode, StepObserver,
};

use crate::config::InterpreterConfig;
use crate::machine::Machine;

/// Returns `true` if `code` contains no jump outside push data.
pub fn is_straight_line(code: &[u8]) -> bool {
    let mut pc = 0;
    while pc < code.len() {
        let opcode = code[pc];
        if opcode == JUMP || opcode == JUMPI {
            return false;
        }
        pc += 1 + opcodes::immediate_size(opcode);
    }
    true
}

#[derive(Debug, Default)]
pub struct FastPath {
    config: InterpreterConfig,
    output: Vec<u8>,
}

impl FastPath {
    pub const NAME: &'static str = "fastpath";

    pub fn new() -> Self {
        Self::default()
    }
}

impl Backend for FastPath {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }

    fn set_option(&mut self, name: &str, value: &str) -> SetOptionResult {
        self.config.set_option(name, value)
    }

    fn execute(
        &mut self,
        revision: Revision,
        message: &Message<'_>,
        observer: Option<&mut dyn StepObserver>,
    ) -> ExecutionResult<'_> {
        if !is_straight_line(message.code) {
            return ExecutionResult::failure(StatusCode::Rejected);
        }
        let machine = Machine::new(self.config, revision, message, &[]);
        let (status, gas_left) = machine.run(observer, &mut self.output);
        ExecutionResult::new(status, gas_left, &self.output)
    }
}

//! Reference interpreter backend.

use evmhost_abi::{Backend, ExecutionResult, Message, Revision, SetOptionResult, StepObserver};

use crate::config::InterpreterConfig;
use crate::machine::{analyze_jumpdests, Machine};

/// The reference interpreter. Handles every code it is given and never
/// answers `Rejected`, which makes it the fallback target for other backends.
#[derive(Debug, Default)]
pub struct Interpreter {
    config: InterpreterConfig,
    output: Vec<u8>,
}

impl Interpreter {
    pub const NAME: &'static str = "interpreter";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Self {
            config,
            output: Vec::new(),
        }
    }

    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }
}

impl Backend for Interpreter {
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
        let jumpdests = analyze_jumpdests(message.code);
        let machine = Machine::new(self.config, revision, message, &jumpdests);
        let (status, gas_left) = machine.run(observer, &mut self.output);
        ExecutionResult::new(status, gas_left, &self.output)
    }
}

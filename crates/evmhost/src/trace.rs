//! Diagnostic trace lines for call entry, call exit and executed steps.

use std::io::{self, Write};

use evmhost_abi::opcodes::instruction_name;
use evmhost_abi::{hex, Address, Revision, StatusCode, Step};

/// Boxed sink the adapter writes trace lines to.
pub type TraceSink = Box<dyn Write + Send>;

/// Writes one line per call entry, call exit and executed step.
///
/// Write failures are ignored; tracing never affects execution.
pub struct StepPrinter<W: Write = TraceSink> {
    sink: W,
}

impl StepPrinter<TraceSink> {
    /// A printer writing to stderr.
    pub fn stderr() -> Self {
        Self::new(Box::new(io::stderr()))
    }
}

impl<W: Write> StepPrinter<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn into_inner(self) -> W {
        self.sink
    }

    pub fn message_start(&mut self, depth: usize, caller: &Address, callee: &Address, gas: i64) {
        let _ = writeln!(
            self.sink,
            "message START {} {} -> {} gas: {}",
            depth, caller, callee, gas
        );
    }

    pub fn message_end(&mut self, depth: usize, status: StatusCode, gas_left: i64) {
        let _ = writeln!(
            self.sink,
            "message END   {} status: {} gas left: {}",
            depth, status, gas_left
        );
    }

    /// `index offset NAME status gas_left stack_depth [+[pushed]] memory_size`
    pub fn step(&mut self, revision: Revision, step: &Step<'_>) {
        let name = match instruction_name(revision, step.opcode) {
            Some(name) => name.to_string(),
            None => format!("UNDEFINED(0x{:02x})", step.opcode),
        };
        let pushed = step
            .pushed
            .map(|word| format!(" +[0x{}]", hex::encode(trim_leading_zeros(word))))
            .unwrap_or_default();
        let _ = writeln!(
            self.sink,
            "{} {} {} {} {} {}{} {}",
            step.index,
            step.code_offset,
            name,
            step.status,
            step.gas_left,
            step.stack_depth,
            pushed,
            step.memory_size
        );
    }
}

/// Strips leading zero bytes, keeping at least one byte.
fn trim_leading_zeros(word: &[u8]) -> &[u8] {
    let first = word
        .iter()
        .position(|b| *b != 0)
        .unwrap_or(word.len().saturating_sub(1));
    &word[first..]
}

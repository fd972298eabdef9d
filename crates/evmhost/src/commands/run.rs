//! Run command implementation
//!
//! Executes one call frame of hex bytecode through the configured factory.

use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::path::Path;
use std::process::ExitCode;

use evmhost_abi::{
    hex, Address, EnvInfo, ExecutionContext, Failure, FeatureSchedule, Outcome, Revision,
};

use crate::factory::VmFactory;

/// Inputs of one `run` invocation.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Backend to use; `None` selects the default.
    pub vm: Option<String>,
    pub code: Vec<u8>,
    pub input: Vec<u8>,
    pub gas: u64,
    pub revision: Revision,
    pub depth: usize,
    pub number: i64,
    pub timestamp: i64,
    pub caller: Address,
    pub callee: Address,
    pub is_static: bool,
}

impl RunRequest {
    /// A request for `code` with default call parameters.
    pub fn new(code: Vec<u8>) -> Self {
        Self {
            vm: None,
            code,
            input: Vec::new(),
            gas: 1_000_000,
            revision: Revision::LATEST,
            depth: 0,
            number: 0,
            timestamp: 0,
            caller: Address::ZERO,
            callee: Address::ZERO,
            is_static: false,
        }
    }

    fn context(&self) -> ExecutionContext<'_> {
        ExecutionContext::new(&self.code)
            .with_depth(self.depth)
            .with_addresses(self.caller, self.callee)
            .with_input(&self.input)
            .with_env(EnvInfo {
                number: self.number,
                timestamp: self.timestamp,
                gas_limit: self.gas,
            })
            .with_schedule(FeatureSchedule::for_revision(self.revision))
            .with_static(self.is_static)
    }
}

/// JSON shape of `run --json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutput {
    pub backend: String,
    pub revision: Revision,
    /// `success`, `reverted` or `failure`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<Failure>,
    /// Hex with `0x` prefix.
    pub output: String,
    pub gas_left: u64,
    pub gas_used: u64,
}

impl RunOutput {
    fn new(backend: &str, request: &RunRequest, outcome: &Outcome, gas_left: u64) -> Self {
        let label = match outcome {
            Outcome::Success { .. } => "success",
            Outcome::Reverted { .. } => "reverted",
            Outcome::Failure { .. } => "failure",
        };
        Self {
            backend: backend.to_string(),
            revision: request.revision,
            outcome: label,
            failure: outcome.failure(),
            output: format!("0x{}", hex::encode(outcome.output())),
            gas_left,
            gas_used: request.gas.saturating_sub(gas_left),
        }
    }

    /// 0 for success, 1 for a revert, 2 for any failure.
    pub fn exit_code(&self) -> u8 {
        match self.outcome {
            "success" => 0,
            "reverted" => 1,
            _ => 2,
        }
    }
}

/// Reads bytecode from a hex literal or from a file holding hex.
pub fn load_code(code: Option<&str>, code_file: Option<&Path>) -> Result<Vec<u8>> {
    let text = match (code, code_file) {
        (Some(code), None) => code.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read code file: {}", path.display()))?,
        (Some(_), Some(_)) => anyhow::bail!("--code and --code-file are mutually exclusive"),
        (None, None) => anyhow::bail!("no code given; pass --code or --code-file"),
    };
    hex::decode(&text).context("Invalid bytecode")
}

/// Executes `request` and returns what was printed.
pub fn execute(factory: &VmFactory, request: &RunRequest) -> Result<RunOutput> {
    let mut vm = factory.create(request.vm.as_deref())?;
    let mut gas = request.gas;
    let outcome = vm
        .exec(&mut gas, &request.context(), None)
        .context("Execution rejected by host")?;
    Ok(RunOutput::new(vm.name(), request, &outcome, gas))
}

/// Run the run command
///
/// # Returns
/// Exit code: 0 on success, 1 on revert, 2 on failure
pub fn run(factory: &VmFactory, request: &RunRequest, json_output: bool) -> Result<ExitCode> {
    let output = execute(factory, request)?;

    if json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_human(&output);
    }
    Ok(ExitCode::from(output.exit_code()))
}

fn print_human(output: &RunOutput) {
    let outcome = match output.failure {
        Some(failure) => format!("failure ({})", failure).red().bold(),
        None if output.outcome == "reverted" => output.outcome.yellow().bold(),
        None => output.outcome.green().bold(),
    };
    println!("{} {}", "Outcome:".cyan().bold(), outcome);
    println!(
        "  {} {} ({})",
        "Backend:".dimmed(),
        output.backend,
        output.revision
    );
    println!("  {} {}", "Output:".dimmed(), output.output);
    println!(
        "  {} {} (used {})",
        "Gas left:".dimmed(),
        output.gas_left,
        output.gas_used
    );
}

//! evmhost CLI - run bytecode on pluggable VM backends
//!
//! Host flags (`--vm`, `--vm-option`, `--vm-load`, `--config`, `--trace`)
//! configure one process-wide VM factory before the command runs.

use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;

use evmhost::commands::{self, run::RunRequest};
use evmhost::{log, VmFactory};

mod cli_args;
use cli_args::{Cli, Commands, HostArgs};

fn install_factory(host: &HostArgs) -> Result<&'static VmFactory> {
    let config = commands::configure(
        host.config.as_deref(),
        &host.vm_loads,
        &host.vm_options,
        host.vm.as_deref(),
        host.trace,
    )?;
    Ok(config.finalize().install()?)
}

fn dispatch(cli: Cli) -> Result<ExitCode> {
    log::set_quiet(cli.host.quiet);
    let factory = install_factory(&cli.host)?;

    match cli.command {
        Commands::Run {
            code,
            code_file,
            input,
            gas,
            revision,
            depth,
            number,
            timestamp,
            caller,
            callee,
            is_static,
            json,
        } => {
            let request = RunRequest {
                vm: None,
                code: commands::run::load_code(code.as_deref(), code_file.as_deref())?,
                input: evmhost_abi::hex::decode(&input)?,
                gas,
                revision,
                depth,
                number,
                timestamp,
                caller,
                callee,
                is_static,
            };
            commands::run::run(factory, &request, json)
        }
        Commands::List { json } => commands::list::run(factory, json),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match dispatch(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {:#}", "error:".red().bold(), e);
            ExitCode::from(1)
        }
    }
}

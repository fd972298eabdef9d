//! CLI argument definitions for the evmhost command-line interface.
//!
//! All `#[derive(Parser)]` and `#[derive(Subcommand)]` types are defined here,
//! keeping `main.rs` focused on dispatch logic.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use evmhost_abi::{Address, Revision};

/// evmhost - Pluggable execution-backend host
#[derive(Parser)]
#[command(name = "evmhost")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub(crate) struct Cli {
    #[command(flatten)]
    pub host: HostArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Configuration shared by every command.
#[derive(Args, Debug)]
pub(crate) struct HostArgs {
    /// Default VM backend (built-in: interpreter, fastpath)
    #[arg(long, global = true, value_name = "NAME")]
    pub vm: Option<String>,

    /// Backend option applied to every VM, as name=value (repeatable)
    #[arg(long = "vm-option", global = true, value_name = "NAME=VALUE")]
    pub vm_options: Vec<String>,

    /// Shared library exporting a backend to load (repeatable)
    #[arg(long = "vm-load", global = true, value_name = "PATH")]
    pub vm_loads: Vec<PathBuf>,

    /// JSON host configuration file, applied before other flags
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print a diagnostic line per call and per executed instruction
    #[arg(long, global = true)]
    pub trace: bool,

    /// Suppress info and warning messages
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Execute bytecode on a VM backend
    Run {
        /// Bytecode as hex (optional 0x prefix)
        #[arg(short, long, conflicts_with = "code_file")]
        code: Option<String>,

        /// File containing bytecode as hex
        #[arg(long, value_name = "PATH")]
        code_file: Option<PathBuf>,

        /// Call data as hex
        #[arg(short, long, default_value = "")]
        input: String,

        /// Gas available to the call
        #[arg(short, long, default_value_t = 1_000_000)]
        gas: u64,

        /// Protocol revision (frontier ... constantinople)
        #[arg(short, long, default_value_t = Revision::LATEST)]
        revision: Revision,

        /// Call depth
        #[arg(long, default_value_t = 0)]
        depth: usize,

        /// Block number
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        number: i64,

        /// Block timestamp
        #[arg(long, default_value_t = 0, allow_negative_numbers = true)]
        timestamp: i64,

        /// Caller address
        #[arg(long, default_value_t = Address::ZERO)]
        caller: Address,

        /// Executing account address
        #[arg(long, default_value_t = Address::ZERO)]
        callee: Address,

        /// Execute as a static (read-only) frame
        #[arg(long = "static")]
        is_static: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// List registered VM backends
    List {
        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

//! List command implementation
//!
//! Prints the registered backends, marking the default one.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;
use std::process::ExitCode;

use crate::factory::VmFactory;
use crate::registry::BackendInfo;

/// JSON shape of `list --json`.
#[derive(Debug, Serialize)]
pub struct ListOutput {
    pub default: String,
    pub backends: Vec<BackendInfo>,
}

/// Run the list command
pub fn run(factory: &VmFactory, json_output: bool) -> Result<ExitCode> {
    let output = ListOutput {
        default: factory.default_name().to_string(),
        backends: factory.available(),
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}", "Available backends:".cyan().bold());
    for backend in &output.backends {
        let marker = if backend.name == output.default {
            "*".green().bold()
        } else {
            " ".normal()
        };
        println!("  {} {:<16} {}", marker, backend.name, backend.kind.to_string().dimmed());
    }
    Ok(ExitCode::SUCCESS)
}

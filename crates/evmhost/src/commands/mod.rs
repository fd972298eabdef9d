//! CLI command implementations

pub mod list;
pub mod run;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::config::HostConfigFile;
use crate::factory::HostConfig;

/// Builds the host configuration from an optional config file plus
/// command-line settings.
///
/// The file is applied first. Command-line loads, options, default backend
/// and tracing are applied on top of it, in that order.
pub fn configure(
    config_file: Option<&Path>,
    loads: &[PathBuf],
    options: &[String],
    vm: Option<&str>,
    trace: bool,
) -> Result<HostConfig> {
    let mut config = HostConfig::new();

    if let Some(path) = config_file {
        let file = HostConfigFile::from_path(path)?;
        file.apply(&mut config)
            .with_context(|| format!("Failed to apply config {}", path.display()))?;
    }

    for path in loads {
        config.load_backend(path)?;
    }
    for option in options {
        config.parse_option(option)?;
    }
    if let Some(name) = vm {
        config.set_default(name)?;
    }
    if trace {
        config.set_trace(true);
    }

    Ok(config)
}

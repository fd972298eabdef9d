//! JSON host configuration files.
//!
//! ```json
//! {
//!   "vm": "fastpath",
//!   "options": ["stack-limit=512"],
//!   "load": ["plugins/libecho_backend.so"],
//!   "trace": false
//! }
//! ```
//!
//! Every field is optional. Relative `load` paths resolve against the
//! directory holding the file.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::factory::HostConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HostConfigFile {
    /// Default backend name.
    pub vm: Option<String>,
    /// `name=value` option strings, applied in order.
    pub options: Vec<String>,
    /// Backend libraries to load.
    pub load: Vec<PathBuf>,
    pub trace: bool,
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

impl HostConfigFile {
    /// Reads and parses the file at `path`.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut file: HostConfigFile =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        file.base_dir = path.parent().map(Path::to_path_buf);
        Ok(file)
    }

    /// Resolves a `load` entry against the file's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        match &self.base_dir {
            Some(base) if path.is_relative() => base.join(path),
            _ => path.to_path_buf(),
        }
    }

    /// Applies the file onto `config`: loads first, then options, then the
    /// default backend (which may name a loaded backend), then tracing.
    pub fn apply(&self, config: &mut HostConfig) -> Result<(), ConfigError> {
        for path in &self.load {
            config.load_backend(&self.resolve(path))?;
        }
        for option in &self.options {
            config.parse_option(option)?;
        }
        if let Some(vm) = &self.vm {
            config.set_default(vm)?;
        }
        if self.trace {
            config.set_trace(true);
        }
        Ok(())
    }
}

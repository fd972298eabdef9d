//! Error types for host configuration, backend loading and VM creation.

use std::path::PathBuf;

use evmhost_abi::{AbiError, HostError};
use thiserror::Error;

/// A `name=value` option string could not be split.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionParseError {
    #[error("invalid VM option '{input}': expected <name>=<value>")]
    MissingSeparator { input: String },
}

impl HostError for OptionParseError {
    fn code(&self) -> &'static str {
        match self {
            OptionParseError::MissingSeparator { .. } => "OPT_001",
        }
    }

    fn category(&self) -> &'static str {
        "option"
    }
}

/// A backend library could not be loaded. Nothing was registered.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("loading {} failed: {reason}", path.display())]
    Open { path: PathBuf, reason: String },

    #[error(
        "loading {} failed: backend constructor not found (tried {})",
        path.display(),
        tried.join(", ")
    )]
    MissingSymbol { path: PathBuf, tried: Vec<String> },

    #[error("loading {} failed: {source}", path.display())]
    Abi {
        path: PathBuf,
        #[source]
        source: AbiError,
    },
}

impl LoadError {
    /// Path of the library that failed to load.
    pub fn path(&self) -> &std::path::Path {
        match self {
            LoadError::Open { path, .. }
            | LoadError::MissingSymbol { path, .. }
            | LoadError::Abi { path, .. } => path,
        }
    }
}

impl HostError for LoadError {
    fn code(&self) -> &'static str {
        match self {
            LoadError::Open { .. } => "LOAD_001",
            LoadError::MissingSymbol { .. } => "LOAD_002",
            LoadError::Abi { .. } => "LOAD_003",
        }
    }

    fn category(&self) -> &'static str {
        "load"
    }
}

/// Errors from selecting or instantiating a backend.
#[derive(Debug, Error)]
pub enum FactoryError {
    #[error("unknown VM backend '{name}'; available: {}", available.join(", "))]
    UnknownBackend { name: String, available: Vec<String> },

    #[error("failed to instantiate VM backend '{name}': {source}")]
    Instantiate {
        name: String,
        #[source]
        source: AbiError,
    },

    #[error("a VM factory is already installed")]
    AlreadyInstalled,

    #[error("no VM factory has been installed")]
    NotInstalled,
}

impl HostError for FactoryError {
    fn code(&self) -> &'static str {
        match self {
            FactoryError::UnknownBackend { .. } => "VM_001",
            FactoryError::Instantiate { .. } => "VM_002",
            FactoryError::AlreadyInstalled => "VM_003",
            FactoryError::NotInstalled => "VM_004",
        }
    }

    fn category(&self) -> &'static str {
        "vm"
    }
}

/// Errors from reading or applying a host configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    Option(#[from] OptionParseError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Factory(#[from] FactoryError),
}

impl HostError for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } => "CONFIG_001",
            ConfigError::Parse { .. } => "CONFIG_002",
            ConfigError::Option(e) => e.code(),
            ConfigError::Load(e) => e.code(),
            ConfigError::Factory(e) => e.code(),
        }
    }

    fn category(&self) -> &'static str {
        match self {
            ConfigError::Read { .. } | ConfigError::Parse { .. } => "config",
            ConfigError::Option(e) => e.category(),
            ConfigError::Load(e) => e.category(),
            ConfigError::Factory(e) => e.category(),
        }
    }
}

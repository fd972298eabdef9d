//! evmhost library.
//!
//! Dispatches call frames to interchangeable execution backends. A
//! [`VmFactory`] builds [`VmAdapter`]s around backends taken from a
//! [`BackendRegistry`], which holds the built-in backends and any backend
//! loaded from a shared library. Callers only see the
//! [`evmhost_abi::Vm`] capability interface.
//!
//! # Example
//!
//! ```
//! use evmhost::HostConfig;
//! use evmhost_abi::{ExecutionContext, Outcome};
//!
//! let mut config = HostConfig::new();
//! config.add_option("stack-limit", "512");
//! let factory = config.finalize();
//!
//! let mut vm = factory.create(None).unwrap();
//! let mut gas = 21_000;
//! let outcome = vm.exec(&mut gas, &ExecutionContext::new(&[0x00]), None).unwrap();
//! assert_eq!(outcome, Outcome::Success { output: vec![], gas_left: 21_000 });
//! ```

pub mod log;

pub mod adapter;
pub mod commands;
pub mod config;
pub mod error;
pub mod factory;
pub mod loader;
pub mod options;
pub mod registry;
pub mod trace;

pub use adapter::VmAdapter;
pub use config::HostConfigFile;
pub use error::{ConfigError, FactoryError, LoadError, OptionParseError};
pub use factory::{HostConfig, VmFactory, DEFAULT_BACKEND};
pub use loader::{LoadedBackend, SymbolTable};
pub use options::{parse_option, OptionList, VmOption};
pub use registry::{BackendInfo, BackendKind, BackendRegistry};
pub use trace::StepPrinter;

//! Host configuration and the VM factory.
//!
//! Configuration happens once, before any execution: options are collected,
//! backend libraries are loaded, and the default backend is chosen on a
//! [`HostConfig`]. [`HostConfig::finalize`] freezes all of it into a
//! [`VmFactory`], which only creates VMs. [`VmFactory::install`] publishes a
//! factory process-wide.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use evmhost_abi::Vm;

use crate::adapter::{Fallback, VmAdapter};
use crate::error::{FactoryError, LoadError, OptionParseError};
use crate::loader::{self, LoadedBackend, SymbolTable};
use crate::options::{parse_option, OptionList, VmOption};
use crate::registry::{BackendInfo, BackendRegistry};

/// Backend used when no name is given, unless another default is chosen.
///
/// It is always the fallback target, whatever the chosen default is, since
/// it handles every call it is given.
pub const DEFAULT_BACKEND: &str = "interpreter";

static GLOBAL_FACTORY: OnceLock<VmFactory> = OnceLock::new();

/// Configuration-phase builder.
#[derive(Debug, Clone)]
pub struct HostConfig {
    registry: BackendRegistry,
    options: OptionList,
    default: String,
    trace: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl HostConfig {
    /// Starts from the built-in backends, with `interpreter` as default.
    pub fn new() -> Self {
        Self::with_registry(BackendRegistry::with_builtins())
    }

    /// Starts from `registry`. The default name is not checked against it
    /// until [`HostConfig::set_default`] is called.
    pub fn with_registry(registry: BackendRegistry) -> Self {
        Self {
            registry,
            options: OptionList::new(),
            default: DEFAULT_BACKEND.to_string(),
            trace: false,
        }
    }

    /// Appends an option applied to every backend created later.
    pub fn add_option(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.options.push(VmOption::new(name, value));
        self
    }

    /// Appends an option given as `name=value`.
    pub fn parse_option(&mut self, input: &str) -> Result<&mut Self, OptionParseError> {
        self.options.push(parse_option(input)?);
        Ok(self)
    }

    /// Loads the backend library at `path` into the registry.
    pub fn load_backend(&mut self, path: &Path) -> Result<LoadedBackend, LoadError> {
        loader::load_backend(&mut self.registry, path)
    }

    /// Registers the backend exported by `symbols` as if loaded from `path`.
    pub fn register_library<S: SymbolTable>(
        &mut self,
        path: &Path,
        symbols: S,
    ) -> Result<LoadedBackend, LoadError> {
        loader::register_library(&mut self.registry, path, symbols)
    }

    /// Chooses the backend used by [`VmFactory::create`] without a name.
    pub fn set_default(&mut self, name: &str) -> Result<&mut Self, FactoryError> {
        if !self.registry.contains(name) {
            return Err(unknown_backend(&self.registry, name));
        }
        self.default = name.to_string();
        Ok(self)
    }

    /// Enables the diagnostic trace on every created VM.
    pub fn set_trace(&mut self, trace: bool) -> &mut Self {
        self.trace = trace;
        self
    }

    pub fn registry(&self) -> &BackendRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut BackendRegistry {
        &mut self.registry
    }

    pub fn options(&self) -> &OptionList {
        &self.options
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    /// Freezes the configuration.
    pub fn finalize(self) -> VmFactory {
        VmFactory {
            registry: self.registry,
            options: Arc::new(self.options),
            default: self.default,
            trace: self.trace,
        }
    }
}

/// Creates VMs from a frozen configuration.
#[derive(Debug, Clone)]
pub struct VmFactory {
    registry: BackendRegistry,
    options: Arc<OptionList>,
    default: String,
    trace: bool,
}

impl VmFactory {
    /// Creates a VM for backend `name`, or the default backend.
    pub fn create(&self, name: Option<&str>) -> Result<Box<dyn Vm>, FactoryError> {
        Ok(Box::new(self.create_adapter(name)?))
    }

    /// Like [`VmFactory::create`], returning the concrete adapter.
    pub fn create_adapter(&self, name: Option<&str>) -> Result<VmAdapter, FactoryError> {
        let name = name.unwrap_or(&self.default);
        let entry = self
            .registry
            .get(name)
            .ok_or_else(|| unknown_backend(&self.registry, name))?;
        let backend = entry
            .instantiate()
            .map_err(|source| FactoryError::Instantiate {
                name: name.to_string(),
                source,
            })?;

        let mut adapter = VmAdapter::new(backend, &self.options);
        if let Some(reference) = self.registry.get(DEFAULT_BACKEND) {
            adapter = adapter.with_fallback(Fallback {
                name: DEFAULT_BACKEND.to_string(),
                constructor: Arc::clone(&reference.constructor),
                options: Arc::clone(&self.options),
            });
        }
        if self.trace {
            adapter = adapter.with_trace();
        }
        Ok(adapter)
    }

    pub fn default_name(&self) -> &str {
        &self.default
    }

    pub fn is_tracing(&self) -> bool {
        self.trace
    }

    /// Registered backends in name order.
    pub fn available(&self) -> Vec<BackendInfo> {
        self.registry.list()
    }

    pub fn options(&self) -> &OptionList {
        &self.options
    }

    /// Publishes this factory process-wide. Only the first install succeeds.
    pub fn install(self) -> Result<&'static VmFactory, FactoryError> {
        GLOBAL_FACTORY
            .set(self)
            .map_err(|_| FactoryError::AlreadyInstalled)?;
        VmFactory::global()
    }

    /// The factory published by [`VmFactory::install`].
    pub fn global() -> Result<&'static VmFactory, FactoryError> {
        GLOBAL_FACTORY.get().ok_or(FactoryError::NotInstalled)
    }
}

fn unknown_backend(registry: &BackendRegistry, name: &str) -> FactoryError {
    FactoryError::UnknownBackend {
        name: name.to_string(),
        available: registry.names().into_iter().map(String::from).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use evmhost_abi::{ExecutionContext, Outcome};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_is_interpreter() {
        let factory = HostConfig::new().finalize();
        assert_eq!(factory.default_name(), "interpreter");
        let vm = factory.create(None).unwrap();
        assert_eq!(vm.name(), "interpreter");
    }

    #[test]
    fn test_set_default_rejects_unknown_name() {
        let mut config = HostConfig::new();
        let err = config.set_default("jit").unwrap_err();
        match err {
            FactoryError::UnknownBackend { name, available } => {
                assert_eq!(name, "jit");
                assert!(available.contains(&"interpreter".to_string()));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert_eq!(config.default_name(), "interpreter");
    }

    #[test]
    fn test_create_unknown_backend() {
        let factory = HostConfig::new().finalize();
        assert!(matches!(
            factory.create(Some("missing")),
            Err(FactoryError::UnknownBackend { .. })
        ));
    }

    #[test]
    fn test_options_are_frozen_in_order() {
        let mut config = HostConfig::new();
        config.add_option("x", "1");
        config.parse_option("y=2").unwrap();
        assert!(config.parse_option("broken").is_err());
        let factory = config.finalize();
        let names: Vec<_> = factory.options().iter().map(|o| o.to_string()).collect();
        assert_eq!(names, vec!["x=1", "y=2"]);
    }

    #[test]
    fn test_created_vm_executes() {
        let vm_factory = HostConfig::new().finalize();
        let mut vm = vm_factory.create(Some("interpreter")).unwrap();
        let mut gas = 21000;
        let outcome = vm.exec(&mut gas, &ExecutionContext::new(&[0x00]), None).unwrap();
        assert_eq!(
            outcome,
            Outcome::Success {
                output: Vec::new(),
                gas_left: 21000
            }
        );
    }

    #[test]
    fn test_adapter_has_default_fallback_and_trace() {
        let mut config = HostConfig::new();
        config.set_trace(true);
        let factory = config.finalize();
        let adapter = factory.create_adapter(None).unwrap();
        assert_eq!(adapter.fallback().map(|f| f.name.as_str()), Some("interpreter"));
        assert!(adapter.is_tracing());
    }

    #[cfg(feature = "fastpath")]
    #[test]
    fn test_fallback_ignores_chosen_default() {
        let mut config = HostConfig::new();
        config.set_default("fastpath").unwrap();
        let factory = config.finalize();
        let adapter = factory.create_adapter(None).unwrap();
        assert_eq!(adapter.backend().name(), "fastpath");
        assert_eq!(adapter.fallback().map(|f| f.name.as_str()), Some("interpreter"));
    }

    #[cfg(feature = "fastpath")]
    #[test]
    fn test_jumping_code_runs_with_fastpath_default() {
        // PUSH1 4 JUMP INVALID JUMPDEST STOP
        let code = [0x60, 0x04, 0x56, 0xfe, 0x5b, 0x00];
        let mut config = HostConfig::new();
        config.set_default("fastpath").unwrap();
        let factory = config.finalize();
        let mut vm = factory.create(None).unwrap();
        let mut gas = 100;
        let outcome = vm.exec(&mut gas, &ExecutionContext::new(&code), None).unwrap();
        assert_eq!(
            outcome,
            Outcome::Success {
                output: Vec::new(),
                gas_left: 88
            }
        );
        assert_eq!(gas, 88);
    }
}

//! Name-keyed registry of backend constructors.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use evmhost_abi::{AbiError, Backend};
use evmhost_interpreter::Interpreter;
use serde::Serialize;

/// Builds a fresh backend instance on every call.
pub type Constructor = Arc<dyn Fn() -> Result<Box<dyn Backend>, AbiError> + Send + Sync>;

/// Where a registered backend comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendKind {
    /// Compiled into the host.
    Builtin,
    /// Loaded from a shared library.
    Dynamic { path: PathBuf, symbol: String },
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Builtin => write!(f, "builtin"),
            BackendKind::Dynamic { path, symbol } => {
                write!(f, "dynamic ({} in {})", symbol, path.display())
            }
        }
    }
}

#[derive(Clone)]
pub struct RegistryEntry {
    pub kind: BackendKind,
    pub constructor: Constructor,
}

impl RegistryEntry {
    pub fn instantiate(&self) -> Result<Box<dyn Backend>, AbiError> {
        (self.constructor)()
    }
}

impl fmt::Debug for RegistryEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryEntry")
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// One row of [`BackendRegistry::list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendInfo {
    pub name: String,
    #[serde(flatten)]
    pub kind: BackendKind,
}

/// Backend constructors by name. Registering an existing name replaces it.
#[derive(Debug, Clone, Default)]
pub struct BackendRegistry {
    entries: BTreeMap<String, RegistryEntry>,
}

impl BackendRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in backends.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register_builtin::<Interpreter>(Interpreter::NAME);
        #[cfg(feature = "fastpath")]
        {
            use evmhost_interpreter::FastPath;
            registry.register_builtin::<FastPath>(FastPath::NAME);
        }
        registry
    }

    /// Registers `constructor` under `name`, returning the entry it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        kind: BackendKind,
        constructor: Constructor,
    ) -> Option<RegistryEntry> {
        self.entries
            .insert(name.into(), RegistryEntry { kind, constructor })
    }

    /// Registers a default-constructible backend compiled into the host.
    pub fn register_builtin<B>(&mut self, name: &str) -> Option<RegistryEntry>
    where
        B: Backend + Default + 'static,
    {
        let constructor: Constructor =
            Arc::new(|| -> Result<Box<dyn Backend>, AbiError> { Ok(Box::new(B::default())) });
        self.register(name, BackendKind::Builtin, constructor)
    }

    pub fn get(&self, name: &str) -> Option<&RegistryEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn list(&self) -> Vec<BackendInfo> {
        self.entries
            .iter()
            .map(|(name, entry)| BackendInfo {
                name: name.clone(),
                kind: entry.kind.clone(),
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

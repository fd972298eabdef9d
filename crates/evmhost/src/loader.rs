//! Dynamic backend loading.
//!
//! A backend library exports one constructor following the plugin ABI in
//! [`evmhost_abi::ffi`]. The constructor is looked up under a name derived
//! from the library file name, then under the bare prefix:
//!
//! | Library | Symbols tried |
//! |---|---|
//! | `libfast-vm.so` | `evmhost_create_fast_vm`, `evmhost_create` |
//! | `echo.dll` | `evmhost_create_echo`, `evmhost_create` |
//!
//! Loading instantiates the backend once to learn its self-reported name and
//! version, releases that instance, and registers a constructor under the
//! name. Each later instantiation calls the exported constructor again.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use evmhost_abi::ffi::CreateFn;
use evmhost_abi::{Backend, ForeignBackend, CREATE_SYMBOL_PREFIX};
use libloading::Library;
use serde::Serialize;

use crate::error::LoadError;
use crate::info;
use crate::registry::{BackendKind, BackendRegistry, Constructor};

/// Source of exported constructors.
///
/// Held alive for as long as any backend created from it exists.
pub trait SymbolTable: Send + Sync + 'static {
    /// Returns the constructor exported under `symbol`, if present.
    fn constructor(&self, symbol: &str) -> Option<CreateFn>;
}

/// A shared library opened with `libloading`.
#[derive(Debug)]
pub struct SharedLibrary {
    library: Library,
}

impl SharedLibrary {
    pub fn open(path: &Path) -> Result<Self, LoadError> {
        // SAFETY: running the library's initializers is inherent to loading a
        // backend the user asked for.
        let library = unsafe { Library::new(path) }.map_err(|e| LoadError::Open {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(Self { library })
    }
}

impl SymbolTable for SharedLibrary {
    fn constructor(&self, symbol: &str) -> Option<CreateFn> {
        // SAFETY: symbols under the constructor prefix are declared with the
        // `CreateFn` signature by the plugin ABI.
        unsafe { self.library.get::<CreateFn>(symbol.as_bytes()) }
            .ok()
            .map(|symbol| *symbol)
    }
}

/// Constructor symbol names to try for the library at `path`, in order.
pub fn candidate_symbols(path: &Path) -> Vec<String> {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = stem.strip_prefix("lib").unwrap_or(&stem);
    let sanitized: String = stem
        .chars()
        .map(|c| if c == '-' || c == '.' { '_' } else { c })
        .collect();

    let mut candidates = Vec::with_capacity(2);
    if !sanitized.is_empty() {
        candidates.push(format!("{}_{}", CREATE_SYMBOL_PREFIX, sanitized));
    }
    candidates.push(CREATE_SYMBOL_PREFIX.to_string());
    candidates
}

/// A successfully registered library backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadedBackend {
    pub name: String,
    pub version: String,
    pub path: PathBuf,
    pub symbol: String,
}

/// Opens the library at `path` and registers its backend.
pub fn load_backend(registry: &mut BackendRegistry, path: &Path) -> Result<LoadedBackend, LoadError> {
    let library = SharedLibrary::open(path)?;
    register_library(registry, path, library)
}

/// Registers the backend exported by `symbols`, treating it as loaded from
/// `path`. On error the registry is left untouched.
pub fn register_library<S: SymbolTable>(
    registry: &mut BackendRegistry,
    path: &Path,
    symbols: S,
) -> Result<LoadedBackend, LoadError> {
    let candidates = candidate_symbols(path);
    let found = candidates
        .iter()
        .find_map(|name| symbols.constructor(name).map(|create| (name.clone(), create)));
    let Some((symbol, create)) = found else {
        return Err(LoadError::MissingSymbol {
            path: path.to_path_buf(),
            tried: candidates,
        });
    };

    let keepalive: Arc<dyn Any + Send + Sync> = Arc::new(symbols);

    // SAFETY: `create` was exported under the constructor prefix.
    let first = unsafe { ForeignBackend::create(create, Some(Arc::clone(&keepalive))) }
        .map_err(|source| LoadError::Abi {
            path: path.to_path_buf(),
            source,
        })?;
    let name = first.name().to_string();
    let version = first.version().to_string();
    drop(first);

    info!("Loaded backend {} {}", name, version);

    let constructor: Constructor = Arc::new(move || {
        // SAFETY: same constructor as the first instance above.
        unsafe { ForeignBackend::create(create, Some(Arc::clone(&keepalive))) }
            .map(|backend| Box::new(backend) as Box<dyn Backend>)
    });
    registry.register(
        name.clone(),
        BackendKind::Dynamic {
            path: path.to_path_buf(),
            symbol: symbol.clone(),
        },
        constructor,
    );

    Ok(LoadedBackend {
        name,
        version,
        path: path.to_path_buf(),
        symbol,
    })
}

//! Plugin ABI for backends compiled into shared libraries.
//!
//! A loadable backend exports a constructor whose symbol name starts with
//! [`CREATE_SYMBOL_PREFIX`]. The constructor returns a pointer to a
//! [`BackendInterface`]: a versioned, `#[repr(C)]` table of function pointers
//! that the host checks against [`ABI_VERSION`] before using anything else in
//! it.
//!
//! Both directions are provided here:
//!
//! - [`export_backend!`](crate::export_backend) / [`into_raw_backend`] turn any
//!   [`Backend`] into a table (plugin side).
//! - [`ForeignBackend`] turns a table back into a [`Backend`] (host side).
//!
//! The step tracer crosses the boundary as a callback plus an opaque context
//! pointer. The host installs it for the duration of a single `execute` call
//! and clears it afterwards, so the context never outlives the observer it
//! points to.

use std::any::Any;
use std::ffi::{c_char, c_void, CStr, CString};
use std::ptr::NonNull;
use std::sync::Arc;

use crate::backend::{Backend, ExecutionResult, SetOptionResult, Step, StepObserver, Word};
use crate::context::{Address, Message};
use crate::revision::Revision;
use crate::status::StatusCode;

/// Version of the table layout below. Bump on any change.
pub const ABI_VERSION: u32 = 1;

/// Every exported backend constructor starts with this prefix.
pub const CREATE_SYMBOL_PREFIX: &str = "evmhost_create";

/// Call arguments in ABI form.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawMessage {
    pub depth: i32,
    pub gas: i64,
    pub is_static: bool,
    pub caller: [u8; 20],
    pub callee: [u8; 20],
    pub code_data: *const u8,
    pub code_size: usize,
    pub input_data: *const u8,
    pub input_size: usize,
}

impl RawMessage {
    pub fn from_message(message: &Message<'_>) -> Self {
        Self {
            depth: message.depth,
            gas: message.gas,
            is_static: message.is_static,
            caller: message.caller.0,
            callee: message.callee.0,
            code_data: message.code.as_ptr(),
            code_size: message.code.len(),
            input_data: message.input.as_ptr(),
            input_size: message.input.len(),
        }
    }

    /// # Safety
    ///
    /// The code and input pointers must be valid for their sizes for as long
    /// as the returned message is used.
    pub unsafe fn as_message(&self) -> Message<'_> {
        Message {
            depth: self.depth,
            gas: self.gas,
            caller: Address(self.caller),
            callee: Address(self.callee),
            code: raw_slice(self.code_data, self.code_size),
            input: raw_slice(self.input_data, self.input_size),
            is_static: self.is_static,
        }
    }
}

/// Execution result in ABI form. The output stays owned by the instance and
/// is valid until its next `execute` or `destroy`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawResult {
    pub status: i32,
    pub gas_left: i64,
    pub output_data: *const u8,
    pub output_size: usize,
}

/// One traced step in ABI form. `pushed` is null when nothing was pushed.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct RawStep {
    pub index: u32,
    pub code_offset: usize,
    pub opcode: u8,
    pub status: i32,
    pub gas_left: i64,
    pub stack_depth: usize,
    pub pushed: *const Word,
    pub memory_size: usize,
}

impl RawStep {
    fn from_step(step: &Step<'_>) -> Self {
        Self {
            index: step.index,
            code_offset: step.code_offset,
            opcode: step.opcode,
            status: step.status.as_raw(),
            gas_left: step.gas_left,
            stack_depth: step.stack_depth,
            pushed: step.pushed.map_or(std::ptr::null(), |word| word as *const Word),
            memory_size: step.memory_size,
        }
    }

    /// # Safety
    ///
    /// `pushed` must be null or point to a valid word.
    unsafe fn to_step(&self) -> Step<'_> {
        Step {
            index: self.index,
            code_offset: self.code_offset,
            opcode: self.opcode,
            status: StatusCode::from_raw(self.status),
            gas_left: self.gas_left,
            stack_depth: self.stack_depth,
            pushed: self.pushed.as_ref(),
            memory_size: self.memory_size,
        }
    }
}

/// Tracer callback installed through `set_tracer`.
pub type TraceFn = unsafe extern "C" fn(context: *mut c_void, step: *const RawStep);

/// The function table every loadable backend instance starts with.
#[repr(C)]
pub struct BackendInterface {
    /// Must equal [`ABI_VERSION`]; checked before any other field is read.
    pub abi_version: u32,
    /// NUL-terminated self-reported name.
    pub name: *const c_char,
    /// NUL-terminated self-reported version.
    pub version: *const c_char,
    pub destroy: unsafe extern "C" fn(instance: *mut BackendInterface),
    /// Returns a [`SetOptionResult`] raw value.
    pub set_option: unsafe extern "C" fn(
        instance: *mut BackendInterface,
        name: *const c_char,
        value: *const c_char,
    ) -> i32,
    /// Installs (or with `None`, clears) the step tracer.
    pub set_tracer:
        unsafe extern "C" fn(instance: *mut BackendInterface, tracer: Option<TraceFn>, context: *mut c_void),
    pub execute: unsafe extern "C" fn(
        instance: *mut BackendInterface,
        revision: i32,
        message: *const RawMessage,
    ) -> RawResult,
}

/// Signature of an exported backend constructor.
pub type CreateFn = unsafe extern "C" fn() -> *mut BackendInterface;

/// Errors raised while adopting an instance returned by a constructor.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AbiError {
    #[error("backend constructor returned a null instance")]
    NullInstance,
    #[error("backend ABI version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: u32, found: u32 },
}

/// # Safety
///
/// `data` must be valid for `len` bytes unless `len` is zero.
unsafe fn raw_slice<'a>(data: *const u8, len: usize) -> &'a [u8] {
    if data.is_null() || len == 0 {
        &[]
    } else {
        std::slice::from_raw_parts(data, len)
    }
}

/// # Safety
///
/// `ptr` must be null or a valid NUL-terminated string.
unsafe fn c_string(ptr: *const c_char) -> String {
    if ptr.is_null() {
        String::new()
    } else {
        CStr::from_ptr(ptr).to_string_lossy().into_owned()
    }
}

// ============================================================================
// Plugin side
// ============================================================================

/// Heap layout behind an exported `*mut BackendInterface`. The interface is
/// the first field so the pointer can be cast back.
#[repr(C)]
struct Exported<B> {
    interface: BackendInterface,
    backend: B,
    tracer: Option<(TraceFn, *mut c_void)>,
    output: Vec<u8>,
    _name: CString,
    _version: CString,
}

/// Forwards steps from a Rust backend to a C tracer callback.
struct CallbackObserver {
    callback: TraceFn,
    context: *mut c_void,
}

impl StepObserver for CallbackObserver {
    fn on_step(&mut self, step: &Step<'_>) {
        let raw = RawStep::from_step(step);
        unsafe { (self.callback)(self.context, &raw) }
    }
}

/// Boxes `backend` behind a [`BackendInterface`] table.
///
/// The returned pointer is released by calling its `destroy` entry.
pub fn into_raw_backend<B: Backend + 'static>(backend: B) -> *mut BackendInterface {
    let name = CString::new(backend.name()).unwrap_or_default();
    let version = CString::new(backend.version()).unwrap_or_default();
    let exported = Box::new(Exported {
        interface: BackendInterface {
            abi_version: ABI_VERSION,
            name: name.as_ptr(),
            version: version.as_ptr(),
            destroy: destroy_exported::<B>,
            set_option: set_option_exported::<B>,
            set_tracer: set_tracer_exported::<B>,
            execute: execute_exported::<B>,
        },
        backend,
        tracer: None,
        output: Vec::new(),
        _name: name,
        _version: version,
    });
    Box::into_raw(exported) as *mut BackendInterface
}

unsafe extern "C" fn destroy_exported<B: Backend>(instance: *mut BackendInterface) {
    if !instance.is_null() {
        drop(Box::from_raw(instance as *mut Exported<B>));
    }
}

unsafe extern "C" fn set_option_exported<B: Backend>(
    instance: *mut BackendInterface,
    name: *const c_char,
    value: *const c_char,
) -> i32 {
    let exported = &mut *(instance as *mut Exported<B>);
    let (Ok(name), Ok(value)) = (CStr::from_ptr(name).to_str(), CStr::from_ptr(value).to_str())
    else {
        return SetOptionResult::InvalidValue.as_raw();
    };
    exported.backend.set_option(name, value).as_raw()
}

unsafe extern "C" fn set_tracer_exported<B: Backend>(
    instance: *mut BackendInterface,
    tracer: Option<TraceFn>,
    context: *mut c_void,
) {
    let exported = &mut *(instance as *mut Exported<B>);
    exported.tracer = tracer.map(|callback| (callback, context));
}

unsafe extern "C" fn execute_exported<B: Backend>(
    instance: *mut BackendInterface,
    revision: i32,
    message: *const RawMessage,
) -> RawResult {
    let exported = &mut *(instance as *mut Exported<B>);
    let Some(revision) = Revision::from_raw(revision) else {
        // A revision newer than this plugin knows: let the host fall back.
        return RawResult {
            status: StatusCode::Rejected.as_raw(),
            gas_left: 0,
            output_data: std::ptr::null(),
            output_size: 0,
        };
    };
    let message = (*message).as_message();

    let mut forwarder = exported
        .tracer
        .map(|(callback, context)| CallbackObserver { callback, context });
    let observer = forwarder.as_mut().map(|f| f as &mut dyn StepObserver);

    let result = exported.backend.execute(revision, &message, observer);
    let status = result.status.as_raw();
    let gas_left = result.gas_left;
    exported.output.clear();
    exported.output.extend_from_slice(result.output);

    RawResult {
        status,
        gas_left,
        output_data: exported.output.as_ptr(),
        output_size: exported.output.len(),
    }
}

/// Exports a backend constructor from a `cdylib`.
///
/// ```ignore
/// evmhost_abi::export_backend!(evmhost_create_echo_backend, EchoBackend::new());
/// ```
#[macro_export]
macro_rules! export_backend {
    ($symbol:ident, $constructor:expr) => {
        #[no_mangle]
        pub extern "C" fn $symbol() -> *mut $crate::ffi::BackendInterface {
            $crate::ffi::into_raw_backend($constructor)
        }
    };
}

// ============================================================================
// Host side
// ============================================================================

/// A backend instance living behind a [`BackendInterface`] table.
///
/// Owns the instance exclusively and destroys it on drop, before releasing
/// whatever keeps the providing library loaded.
pub struct ForeignBackend {
    instance: NonNull<BackendInterface>,
    name: String,
    version: String,
    _keepalive: Option<Arc<dyn Any + Send + Sync>>,
}

// The instance is exclusively owned and only touched through `&mut self`.
unsafe impl Send for ForeignBackend {}

impl ForeignBackend {
    /// Invokes `create` and adopts the returned instance.
    ///
    /// `keepalive` is held until the instance is destroyed; pass the loaded
    /// library here. An instance reporting a different ABI version is leaked
    /// rather than destroyed, since its table layout is unknown.
    ///
    /// # Safety
    ///
    /// `create` must be a constructor following this module's ABI.
    pub unsafe fn create(
        create: CreateFn,
        keepalive: Option<Arc<dyn Any + Send + Sync>>,
    ) -> Result<Self, AbiError> {
        let instance = NonNull::new(create()).ok_or(AbiError::NullInstance)?;
        let interface = instance.as_ref();
        if interface.abi_version != ABI_VERSION {
            return Err(AbiError::VersionMismatch {
                expected: ABI_VERSION,
                found: interface.abi_version,
            });
        }

        Ok(Self {
            name: c_string(interface.name),
            version: c_string(interface.version),
            instance,
            _keepalive: keepalive,
        })
    }
}

/// Trampoline handed to the plugin; `context` is a `*mut &mut dyn StepObserver`.
unsafe extern "C" fn forward_step(context: *mut c_void, step: *const RawStep) {
    if context.is_null() || step.is_null() {
        return;
    }
    let observer = &mut *(context as *mut &mut dyn StepObserver);
    observer.on_step(&(*step).to_step());
}

impl Backend for ForeignBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn version(&self) -> &str {
        &self.version
    }

    fn set_option(&mut self, name: &str, value: &str) -> SetOptionResult {
        let Ok(c_name) = CString::new(name) else {
            return SetOptionResult::InvalidName;
        };
        let Ok(c_value) = CString::new(value) else {
            return SetOptionResult::InvalidValue;
        };
        let interface = self.instance.as_ptr();
        let raw = unsafe { ((*interface).set_option)(interface, c_name.as_ptr(), c_value.as_ptr()) };
        SetOptionResult::from_raw(raw)
    }

    fn execute(
        &mut self,
        revision: Revision,
        message: &Message<'_>,
        observer: Option<&mut dyn StepObserver>,
    ) -> ExecutionResult<'_> {
        let raw_message = RawMessage::from_message(message);
        let interface = self.instance.as_ptr();

        let result = unsafe {
            match observer {
                Some(mut observer) => {
                    let context = &mut observer as *mut &mut dyn StepObserver as *mut c_void;
                    ((*interface).set_tracer)(interface, Some(forward_step), context);
                    let result = ((*interface).execute)(interface, revision.as_raw(), &raw_message);
                    ((*interface).set_tracer)(interface, None, std::ptr::null_mut());
                    result
                }
                None => ((*interface).execute)(interface, revision.as_raw(), &raw_message),
            }
        };

        ExecutionResult {
            status: StatusCode::from_raw(result.status),
            gas_left: result.gas_left,
            output: unsafe { raw_slice(result.output_data, result.output_size) },
        }
    }
}

impl Drop for ForeignBackend {
    fn drop(&mut self) {
        let interface = self.instance.as_ptr();
        unsafe { ((*interface).destroy)(interface) }
    }
}

impl std::fmt::Debug for ForeignBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForeignBackend")
            .field("name", &self.name)
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

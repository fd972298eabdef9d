//! evmhost Built-in Backends
//!
//! Execution engines compiled into the host. Both implement
//! [`evmhost_abi::Backend`] and are registered by name at startup.
//!
//! # Backends
//!
//! - **`interpreter`**: the reference interpreter. Executes a self-contained
//!   opcode subset with jump analysis, quadratic memory pricing and per-call
//!   scratch storage. It never answers `Rejected`.
//! - **`fastpath`** (feature `fastpath`, on by default): runs straight-line
//!   code without jump analysis and rejects anything containing `JUMP` or
//!   `JUMPI`, leaving that code to the interpreter.
//!
//! # Options
//!
//! | Name | Values | Default |
//! |---|---|---|
//! | `stack-limit` | `1..=1024` | `1024` |
//! | `trace-pushed` | `true` / `false` | `true` |
//!
//! # Example
//!
//! ```
//! use evmhost_abi::{Address, Backend, Message, Revision, StatusCode};
//! use evmhost_interpreter::Interpreter;
//!
//! // PUSH1 2 PUSH1 3 ADD PUSH1 0 MSTORE PUSH1 32 PUSH1 0 RETURN
//! let code = [0x60, 2, 0x60, 3, 0x01, 0x60, 0, 0x52, 0x60, 32, 0x60, 0, 0xf3];
//! let message = Message {
//!     depth: 0,
//!     gas: 100,
//!     caller: Address::ZERO,
//!     callee: Address::ZERO,
//!     code: &code,
//!     input: &[],
//!     is_static: false,
//! };
//!
//! let mut interpreter = Interpreter::new();
//! let result = interpreter.execute(Revision::Byzantium, &message, None);
//! assert_eq!(result.status, StatusCode::Success);
//! assert_eq!(result.output[31], 5);
//! ```

pub mod config;
#[cfg(feature = "fastpath")]
pub mod fastpath;
pub mod gas;
pub mod interpreter;
mod machine;
pub mod memory;
pub mod stack;
pub mod word;

pub use config::InterpreterConfig;
#[cfg(feature = "fastpath")]
pub use fastpath::FastPath;
pub use interpreter::Interpreter;
pub use machine::analyze_jumpdests;
pub use word::U256;

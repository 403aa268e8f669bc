//! Managed/native callback bridge
//!
//! Architecture:
//! - `handle.rs` - Raw function-pointer handles and the unchecked invoker
//! - `registry.rs` - Token table for callbacks owned on the native side
//! - `exports.rs` - `extern "system"` JNI symbols

mod exports;
mod handle;
mod registry;

pub use exports::*;
pub use handle::{invoke_raw, InterfaceChangeCallback, RawCallbackHandle};
pub use registry::{registry, CallbackRegistry, CallbackToken};

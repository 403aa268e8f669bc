//! # netwatcher_android
//!
//! Native half of the Android network interface watcher.
//!
//! The Java support class registers a `ConnectivityManager` callback and, on
//! every network event, calls `callNativeCallback(long)` with a handle it was
//! given at start-up. That handle is the address of
//! [`netwatcher_interfaces_did_change`], which re-lists interfaces and delivers
//! an [`Update`] to every watcher.
//!
//! ```no_run
//! let handle = netwatcher_android::watch_interfaces(|update| {
//!     println!("interfaces: {:?}", update.interfaces.keys());
//!     println!("added: {:?} removed: {:?}", update.diff.added, update.diff.removed);
//! })?;
//! // keep `handle` alive as long as callbacks are wanted
//! drop(handle);
//! # Ok::<(), netwatcher_android::Error>(())
//! ```
//!
//! Native code that wants to hand Java a callback without exposing a function
//! address can use the token [`registry`] instead.

pub mod bridge;
pub mod config;
pub mod interfaces;
pub mod logging;
pub mod watch;

mod error;

pub use bridge::{invoke_raw, registry, CallbackRegistry, CallbackToken, RawCallbackHandle};
pub use config::BridgeConfig;
pub use error::Error;
pub use interfaces::{
    list_interfaces, IfIndex, Interface, InterfaceDiff, InterfaceMap, IpRecord, Update, UpdateDiff,
};
pub use logging::{init_logging, LogConfig, LogFormat, LogOutput};
pub use watch::{netwatcher_interfaces_did_change, watch_interfaces, WatchHandle};

#[cfg(target_os = "android")]
pub use watch::android::set_android_context;

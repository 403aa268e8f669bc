//! JNI entry points
//!
//! Symbols are bound to `net.octet_stream.netwatcher.netwatcher_android.NetwatcherAndroidSupport`.
//! The environment and receiver arguments are unused.

#![allow(non_snake_case)]

use std::ffi::c_void;

use jni::objects::JObject;
use jni::sys::{jint, jlong, JNI_VERSION_1_6};
use jni::JNIEnv;

use super::{handle, registry, CallbackToken};
use crate::config::BridgeConfig;
use crate::Error;

/// Library load hook: set up logging before Java calls anything else
#[no_mangle]
pub extern "system" fn JNI_OnLoad(_vm: *mut jni::sys::JavaVM, _reserved: *mut c_void) -> jint {
    crate::logging::init_with_bridge_config(&BridgeConfig::from_env());
    tracing::info!("netwatcher_android loaded");
    JNI_VERSION_1_6
}

/// `private native void callNativeCallback(long callbackPtr)`
///
/// Zero is ignored. Any other value is called as an `extern "C" fn()` on the
/// calling thread.
///
/// # Safety
/// A non-zero `callback_ptr` must be the address of a live zero-argument
/// function for the duration of the call. This cannot be checked here.
#[no_mangle]
pub unsafe extern "system" fn Java_net_octet_1stream_netwatcher_netwatcher_1android_NetwatcherAndroidSupport_callNativeCallback(
    _env: JNIEnv,
    _this: JObject,
    callback_ptr: jlong,
) {
    handle::invoke_raw(callback_ptr);
}

/// `private native void callRegisteredCallback(long token)`
///
/// Looks the token up in the global registry. Unknown tokens and panicking
/// callbacks are logged and otherwise ignored.
#[no_mangle]
pub extern "system" fn Java_net_octet_1stream_netwatcher_netwatcher_1android_NetwatcherAndroidSupport_callRegisteredCallback(
    _env: JNIEnv,
    _this: JObject,
    token: jlong,
) {
    let Some(token) = CallbackToken::from_jlong(token) else {
        return;
    };
    match registry().invoke(token) {
        Ok(()) => {}
        Err(err @ Error::UnknownCallback(_)) => tracing::warn!("{}", err),
        Err(err) => tracing::error!(%token, "{}", err),
    }
}

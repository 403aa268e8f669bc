//! Raw function-pointer handles
//!
//! A handle is a `jlong` holding the address of a zero-argument `extern "C"`
//! function. Zero means "no callback". Nothing here can tell a live function
//! address from garbage, so invoking a handle is `unsafe`.

use jni::sys::jlong;

/// Native function shape carried by a raw handle
pub type InterfaceChangeCallback = extern "C" fn();

/// Opaque function-pointer handle as it travels across the JNI boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct RawCallbackHandle(jlong);

impl RawCallbackHandle {
    /// The "no callback" handle
    pub const NULL: Self = Self(0);

    /// Encode a function address as a handle
    #[inline]
    pub fn from_fn(callback: InterfaceChangeCallback) -> Self {
        Self(callback as usize as jlong)
    }

    #[inline]
    pub const fn as_jlong(self) -> jlong {
        self.0
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    /// Call the function behind this handle on the current thread
    ///
    /// A null handle is a no-op.
    ///
    /// # Safety
    /// Caller must ensure a non-null handle is the address of a live
    /// `extern "C" fn()` for the whole duration of the call.
    #[inline]
    pub unsafe fn invoke(self) {
        if self.is_null() {
            return;
        }
        let callback: InterfaceChangeCallback =
            std::mem::transmute::<usize, InterfaceChangeCallback>(self.0 as usize);
        callback();
    }
}

impl From<jlong> for RawCallbackHandle {
    #[inline]
    fn from(value: jlong) -> Self {
        Self(value)
    }
}

/// Branch on zero, else call
///
/// # Safety
/// See [`RawCallbackHandle::invoke`].
#[inline]
pub unsafe fn invoke_raw(handle: jlong) {
    let handle = RawCallbackHandle::from(handle);
    tracing::trace!(handle = handle.as_jlong(), "invoking raw callback handle");
    handle.invoke();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static HITS: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn hit() {
        HITS.fetch_add(1, Ordering::SeqCst);
    }

    #[test]
    fn test_null_handle() {
        assert!(RawCallbackHandle::NULL.is_null());
        assert!(RawCallbackHandle::default().is_null());
        assert_eq!(RawCallbackHandle::from(0).as_jlong(), 0);
        unsafe { RawCallbackHandle::NULL.invoke() };
    }

    #[test]
    fn test_from_fn_is_address() {
        let handle = RawCallbackHandle::from_fn(hit);
        assert!(!handle.is_null());
        assert_eq!(handle.as_jlong(), hit as usize as jlong);
        assert_eq!(RawCallbackHandle::from(handle.as_jlong()), handle);
    }

    #[test]
    fn test_invoke_calls_once_per_invocation() {
        let handle = RawCallbackHandle::from_fn(hit);
        unsafe { handle.invoke() };
        assert_eq!(HITS.load(Ordering::SeqCst), 1);
        unsafe { invoke_raw(handle.as_jlong()) };
        assert_eq!(HITS.load(Ordering::SeqCst), 2);
    }
}

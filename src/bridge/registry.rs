//! Token registry for native callbacks
//!
//! Design: instead of handing the managed side a function address, native code
//! registers a boxed callable and hands out an opaque token. Invocation is a
//! table lookup, so a stale or forged token is an error rather than a jump
//! into arbitrary memory.

use std::fmt;
use std::num::NonZeroU64;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use jni::sys::jlong;
use once_cell::sync::Lazy;

use crate::Error;

type Callback = Arc<dyn Fn() + Send + Sync + 'static>;

/// Process-wide registry used by the `callRegisteredCallback` entry point
static REGISTRY: Lazy<CallbackRegistry> = Lazy::new(CallbackRegistry::new);

/// Global callback registry
#[inline]
pub fn registry() -> &'static CallbackRegistry {
    &REGISTRY
}

/// Opaque token identifying a registered callback. Never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackToken(NonZeroU64);

impl CallbackToken {
    /// Decode a token received over JNI; zero means "no callback"
    #[inline]
    pub fn from_jlong(value: jlong) -> Option<Self> {
        NonZeroU64::new(value as u64).map(Self)
    }

    #[inline]
    pub fn as_jlong(self) -> jlong {
        self.0.get() as jlong
    }

    #[inline]
    pub fn get(self) -> u64 {
        self.0.get()
    }
}

impl fmt::Display for CallbackToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Table of callables keyed by token
pub struct CallbackRegistry {
    callbacks: DashMap<CallbackToken, Callback>,
    next: AtomicU64,
}

impl CallbackRegistry {
    pub fn new() -> Self {
        Self {
            callbacks: DashMap::with_capacity(8),
            next: AtomicU64::new(1),
        }
    }

    /// Register a callable and return the token that invokes it
    pub fn register<F>(&self, callback: F) -> CallbackToken
    where
        F: Fn() + Send + Sync + 'static,
    {
        let token = self.issue_token();
        self.callbacks.insert(token, Arc::new(callback));
        tracing::debug!(%token, "registered native callback");
        token
    }

    /// Remove a callback. Returns false if the token was not registered.
    pub fn unregister(&self, token: CallbackToken) -> bool {
        let removed = self.callbacks.remove(&token).is_some();
        if removed {
            tracing::debug!(%token, "unregistered native callback");
        }
        removed
    }

    /// Invoke the callback behind `token` synchronously on the calling thread
    ///
    /// The table is not locked while the callback runs, so it may register or
    /// unregister callbacks itself. Panics are caught and reported as
    /// [`Error::CallbackPanicked`].
    pub fn invoke(&self, token: CallbackToken) -> Result<(), Error> {
        let callback = self
            .callbacks
            .get(&token)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(Error::UnknownCallback(token))?;

        tracing::trace!(%token, "invoking registered callback");
        panic::catch_unwind(AssertUnwindSafe(|| callback())).map_err(|_| Error::CallbackPanicked)
    }

    #[inline]
    pub fn contains(&self, token: CallbackToken) -> bool {
        self.callbacks.contains_key(&token)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.callbacks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.callbacks.is_empty()
    }

    fn issue_token(&self) -> CallbackToken {
        // Starts at 1 and never goes back
        let raw = self.next.fetch_add(1, Ordering::Relaxed);
        CallbackToken(NonZeroU64::new(raw).unwrap_or(NonZeroU64::MIN))
    }
}

impl Default for CallbackRegistry {
    fn default() -> Self {
        Self::new()
    }
}

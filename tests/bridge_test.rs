use netwatcher_android::{invoke_raw, CallbackRegistry, CallbackToken, Error, RawCallbackHandle};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static ZERO_CASE: AtomicUsize = AtomicUsize::new(0);
static COUNTER: AtomicUsize = AtomicUsize::new(0);

extern "C" fn never_called() {
    ZERO_CASE.fetch_add(1, Ordering::SeqCst);
}

extern "C" fn increment_counter() {
    COUNTER.fetch_add(1, Ordering::SeqCst);
}

#[test]
fn test_zero_handle_is_noop() {
    // Referenced so the function exists, but never passed to the bridge
    let _ = RawCallbackHandle::from_fn(never_called);
    unsafe { invoke_raw(0) };
    assert_eq!(ZERO_CASE.load(Ordering::SeqCst), 0);
}

#[test]
fn test_counter_scenario() {
    let handle = RawCallbackHandle::from_fn(increment_counter).as_jlong();

    unsafe { invoke_raw(handle) };
    assert_eq!(COUNTER.load(Ordering::SeqCst), 1);

    // Same handle again: no deduplication
    unsafe { invoke_raw(handle) };
    assert_eq!(COUNTER.load(Ordering::SeqCst), 2);
}

#[test]
fn test_invocation_is_synchronous_on_caller_thread() {
    use std::cell::Cell;

    thread_local! {
        static SEEN: Cell<bool> = Cell::new(false);
    }
    extern "C" fn mark_thread() {
        SEEN.with(|seen| seen.set(true));
    }

    let handle = RawCallbackHandle::from_fn(mark_thread);
    unsafe { handle.invoke() };
    assert!(SEEN.with(Cell::get));
}

#[test]
fn test_registry_scenario() {
    let registry = CallbackRegistry::new();
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let token = registry.register(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });

    // Tokens travel as jlong and come back intact
    let decoded = CallbackToken::from_jlong(token.as_jlong()).unwrap();
    registry.invoke(decoded).unwrap();
    registry.invoke(decoded).unwrap();
    assert_eq!(count.load(Ordering::SeqCst), 2);

    assert!(registry.unregister(token));
    assert!(matches!(registry.invoke(token), Err(Error::UnknownCallback(_))));
}

#[test]
fn test_registry_shared_across_threads() {
    let registry = Arc::new(CallbackRegistry::new());
    let count = Arc::new(AtomicUsize::new(0));
    let inner = Arc::clone(&count);
    let token = registry.register(move || {
        inner.fetch_add(1, Ordering::SeqCst);
    });

    let workers: Vec<_> = (0..4)
        .map(|_| {
            let registry = Arc::clone(&registry);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    registry.invoke(token).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    assert_eq!(count.load(Ordering::SeqCst), 100);
}

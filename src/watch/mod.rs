//! Interface change watching
//!
//! Design: a single dispatcher owns the last snapshot and the registered
//! watchers. Something outside Rust (on Android, the Java support class)
//! signals "something changed" by invoking the raw handle of
//! [`netwatcher_interfaces_did_change`]; the dispatcher then re-lists, diffs
//! and fans the update out.
//!
//! - `InterfaceSource` - where snapshots come from (getifaddrs in production)
//! - `ChangeNotifier` - starts/stops the external change signal
//! - `android.rs` - Java-backed notifier and Android context handling

use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::Mutex;

use crate::bridge::RawCallbackHandle;
use crate::config::BridgeConfig;
use crate::interfaces::{self, InterfaceMap, Update};
use crate::Error;

#[cfg(target_os = "android")]
pub mod android;

type WatcherId = usize;
type WatchCallback = Box<dyn FnMut(Update) + Send + 'static>;

/// Supplies interface snapshots
pub trait InterfaceSource: Send + Sync {
    fn list(&self) -> Result<InterfaceMap, Error>;
}

/// Starts and stops whatever signals interface changes
///
/// `start` receives the handle to invoke on every change.
pub trait ChangeNotifier: Send {
    fn start(&mut self, trigger: RawCallbackHandle) -> Result<(), Error>;
    fn stop(&mut self) -> Result<(), Error>;
}

/// Snapshots from the operating system
pub struct SystemInterfaces;

impl InterfaceSource for SystemInterfaces {
    fn list(&self) -> Result<InterfaceMap, Error> {
        interfaces::list_interfaces()
    }
}

/// Notifier for targets without a native change source
///
/// Changes are delivered only when something invokes the trigger handle.
pub struct ManualNotifier;

impl ChangeNotifier for ManualNotifier {
    fn start(&mut self, trigger: RawCallbackHandle) -> Result<(), Error> {
        tracing::debug!(
            trigger = trigger.as_jlong(),
            "no platform change source; waiting for explicit triggers"
        );
        Ok(())
    }

    fn stop(&mut self) -> Result<(), Error> {
        Ok(())
    }
}

struct State {
    watchers: HashMap<WatcherId, WatchCallback>,
    current: InterfaceMap,
    next_id: WatcherId,
    notifier: Box<dyn ChangeNotifier>,
    running: bool,
}

/// Owns the watcher table and the last delivered snapshot
pub struct Dispatcher {
    source: Box<dyn InterfaceSource>,
    trigger: RawCallbackHandle,
    state: Mutex<State>,
}

impl Dispatcher {
    /// Create a dispatcher whose notifier will be started with `trigger`
    pub fn new(
        source: Box<dyn InterfaceSource>,
        notifier: Box<dyn ChangeNotifier>,
        trigger: RawCallbackHandle,
    ) -> Self {
        Self {
            source,
            trigger,
            state: Mutex::new(State {
                watchers: HashMap::new(),
                current: InterfaceMap::new(),
                next_id: 1,
                notifier,
                running: false,
            }),
        }
    }

    /// Register a watcher
    ///
    /// Existing watchers first receive any change that happened since their
    /// last delivery. The new callback then fires once before this returns,
    /// with the current list and a diff as if nothing existed before. The
    /// first watcher starts the notifier; if that fails the watcher is
    /// dropped and the error returned.
    pub fn subscribe<F>(self: &Arc<Self>, mut callback: F) -> Result<WatchHandle, Error>
    where
        F: FnMut(Update) + Send + 'static,
    {
        let mut state = self.state.lock();
        let latest = self.source.list()?;

        if state.watchers.is_empty() {
            state.current = latest.clone();
        } else if state.current != latest {
            deliver(&mut state, latest.clone());
        }

        callback(Update {
            diff: interfaces::diff(&InterfaceMap::new(), &latest),
            interfaces: latest,
        });

        let id = state.next_id;
        state.next_id += 1;
        state.watchers.insert(id, Box::new(callback));

        if !state.running {
            if let Err(err) = state.notifier.start(self.trigger) {
                state.watchers.remove(&id);
                tracing::error!("failed to start change notifier: {}", err);
                return Err(err);
            }
            state.running = true;
            tracing::debug!("change notifier started");
        }
        tracing::debug!(watcher = id, watchers = state.watchers.len(), "watcher added");

        Ok(WatchHandle {
            dispatcher: Arc::clone(self),
            id,
        })
    }

    /// Re-list, diff against the last snapshot and deliver to every watcher
    ///
    /// Listing failures are logged and the change is skipped. A panicking
    /// watcher is logged and does not stop delivery to the others.
    pub fn refresh(&self) {
        let latest = match self.source.list() {
            Ok(latest) => latest,
            Err(err) => {
                tracing::warn!("skipping interface change, listing failed: {}", err);
                return;
            }
        };

        let mut state = self.state.lock();
        if state.watchers.is_empty() {
            return;
        }
        deliver(&mut state, latest);
    }

    /// Number of live watchers
    pub fn watcher_count(&self) -> usize {
        self.state.lock().watchers.len()
    }

    fn unsubscribe(&self, id: WatcherId) {
        let mut state = self.state.lock();
        state.watchers.remove(&id);
        tracing::debug!(watcher = id, "watcher removed");

        if state.watchers.is_empty() && state.running {
            state.running = false;
            match state.notifier.stop() {
                Ok(()) => tracing::debug!("change notifier stopped"),
                Err(err) => tracing::warn!("failed to stop change notifier: {}", err),
            }
        }
    }
}

/// Diff `latest` against the stored snapshot, store it, fan the update out
fn deliver(state: &mut State, latest: InterfaceMap) {
    let update = Update {
        diff: interfaces::diff(&state.current, &latest),
        interfaces: latest.clone(),
    };
    state.current = latest;

    tracing::debug!(
        added = update.diff.added.len(),
        removed = update.diff.removed.len(),
        modified = update.diff.modified.len(),
        "delivering interface update"
    );
    for (id, callback) in state.watchers.iter_mut() {
        let update = update.clone();
        if panic::catch_unwind(AssertUnwindSafe(|| callback(update))).is_err() {
            tracing::error!(watcher = *id, "watcher callback panicked");
        }
    }
}

/// Keep alive for as long as callbacks are wanted.
///
/// Dropping blocks while a delivery is in progress, after which the callback
/// is guaranteed not to run again. Dropping it from inside its own callback
/// deadlocks.
pub struct WatchHandle {
    dispatcher: Arc<Dispatcher>,
    id: WatcherId,
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.dispatcher.unsubscribe(self.id);
    }
}

static DISPATCHER: OnceCell<Arc<Dispatcher>> = OnceCell::new();

fn global() -> &'static Arc<Dispatcher> {
    DISPATCHER.get_or_init(|| {
        let config = BridgeConfig::from_env();
        Arc::new(Dispatcher::new(
            Box::new(SystemInterfaces),
            platform_notifier(&config),
            RawCallbackHandle::from_fn(netwatcher_interfaces_did_change),
        ))
    })
}

#[cfg(target_os = "android")]
fn platform_notifier(config: &BridgeConfig) -> Box<dyn ChangeNotifier> {
    Box::new(android::JavaNotifier::new(config.android.support_class.clone()))
}

#[cfg(not(target_os = "android"))]
fn platform_notifier(_config: &BridgeConfig) -> Box<dyn ChangeNotifier> {
    Box::new(ManualNotifier)
}

/// Retrieve interface information and watch for changes, delivered via callback.
///
/// See [`Dispatcher::subscribe`] for the delivery contract. If listing
/// starts failing later, those changes are skipped silently.
pub fn watch_interfaces<F>(callback: F) -> Result<WatchHandle, Error>
where
    F: FnMut(Update) + Send + 'static,
{
    global().subscribe(callback)
}

/// Change signal target handed to the Java side as a raw handle
#[no_mangle]
pub extern "C" fn netwatcher_interfaces_did_change() {
    if let Some(dispatcher) = DISPATCHER.get() {
        dispatcher.refresh();
    }
}

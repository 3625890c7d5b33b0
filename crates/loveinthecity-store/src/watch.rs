//! Change-notification registry.
//!
//! In-memory pub-sub keyed by logical storage key. The store invokes
//! [`WatchRegistry::notify`] synchronously inside `set`/`remove`, after the
//! cache has been updated, so a watcher that re-reads the key from within
//! its own callback observes the new value.

use std::collections::HashMap;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use serde_json::Value;
use tracing::{debug, warn};

/// Callback invoked with the new value, or `None` when the key was removed.
pub type WatchCallback = Arc<dyn Fn(Option<&Value>) + Send + Sync>;

type Watchers = Mutex<HashMap<String, Vec<(u64, WatchCallback)>>>;

/// Registry of per-key watchers.
#[derive(Default)]
pub struct WatchRegistry {
    watchers: Arc<Watchers>,
    next_id: AtomicU64,
}

impl WatchRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` for changes to `key`.
    ///
    /// Multiple callbacks per key are supported. The returned handle
    /// deregisters this specific callback via [`WatchHandle::unwatch`];
    /// dropping the handle without calling it leaves the watch active.
    pub fn subscribe(&self, key: &str, callback: WatchCallback) -> WatchHandle {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let mut watchers = self.watchers.lock().expect("watch registry lock");
        watchers
            .entry(key.to_string())
            .or_default()
            .push((id, callback));

        debug!(key, id, "watcher registered");
        WatchHandle {
            key: key.to_string(),
            id,
            watchers: Arc::downgrade(&self.watchers),
        }
    }

    /// Invoke every watcher registered for `key` with `value`.
    ///
    /// Callbacks run on the calling thread from a snapshot taken outside the
    /// registry lock, so a callback may freely read or write the store. A
    /// panicking callback is caught and logged; later callbacks still run.
    pub fn notify(&self, key: &str, value: Option<&Value>) {
        let snapshot: Vec<WatchCallback> = {
            let watchers = self.watchers.lock().expect("watch registry lock");
            match watchers.get(key) {
                Some(callbacks) => callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect(),
                None => return,
            }
        };

        for callback in snapshot {
            if catch_unwind(AssertUnwindSafe(|| callback(value))).is_err() {
                warn!(key, "storage watcher panicked; continuing with remaining watchers");
            }
        }
    }

    /// Number of watchers currently registered for `key`.
    pub fn count(&self, key: &str) -> usize {
        self.watchers
            .lock()
            .expect("watch registry lock")
            .get(key)
            .map_or(0, Vec::len)
    }
}

/// Deregistration handle returned by [`WatchRegistry::subscribe`].
pub struct WatchHandle {
    key: String,
    id: u64,
    watchers: Weak<Watchers>,
}

impl WatchHandle {
    /// Remove the associated callback from the registry.
    pub fn unwatch(self) {
        let Some(watchers) = self.watchers.upgrade() else {
            return;
        };
        let mut watchers = watchers.lock().expect("watch registry lock");
        if let Some(callbacks) = watchers.get_mut(&self.key) {
            callbacks.retain(|(id, _)| *id != self.id);
            if callbacks.is_empty() {
                watchers.remove(&self.key);
            }
        }
        debug!(key = %self.key, id = self.id, "watcher removed");
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn notify_reaches_all_watchers_for_key() {
        let registry = WatchRegistry::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        for tag in ["a", "b"] {
            let seen = Arc::clone(&seen);
            let tag = tag.to_string();
            registry.subscribe(
                "k",
                Arc::new(move |value| {
                    seen.lock().unwrap().push((tag.clone(), value.cloned()));
                }),
            );
        }

        registry.notify("k", Some(&json!(5)));
        registry.notify("other", Some(&json!(1)));

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|(_, v)| v == &Some(json!(5))));
    }

    #[test]
    fn unwatch_removes_only_that_callback() {
        let registry = WatchRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let handle = {
            let hits = Arc::clone(&hits);
            registry.subscribe("k", Arc::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }))
        };
        {
            let hits = Arc::clone(&hits);
            registry.subscribe("k", Arc::new(move |_| {
                hits.fetch_add(10, Ordering::SeqCst);
            }));
        }

        handle.unwatch();
        registry.notify("k", None);

        assert_eq!(hits.load(Ordering::SeqCst), 10);
        assert_eq!(registry.count("k"), 1);
    }

    #[test]
    fn panicking_watcher_does_not_block_others() {
        let registry = WatchRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        registry.subscribe("k", Arc::new(|_| panic!("boom")));
        {
            let hits = Arc::clone(&hits);
            registry.subscribe("k", Arc::new(move |_| {
                hits.fetch_add(1, Ordering::SeqCst);
            }));
        }

        registry.notify("k", Some(&json!("v")));
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn removal_notifies_with_none() {
        let registry = WatchRegistry::new();
        let last = Arc::new(Mutex::new(Some(json!(0))));

        {
            let last = Arc::clone(&last);
            registry.subscribe("k", Arc::new(move |value| {
                *last.lock().unwrap() = value.cloned();
            }));
        }

        registry.notify("k", None);
        assert_eq!(*last.lock().unwrap(), None);
    }
}

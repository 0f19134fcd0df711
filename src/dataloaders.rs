//! DataLoader utilities for batch loading
//!
//! Implements the DataLoader pattern for preventing N+1 query problems.
//! See: https://github.com/graphql/dataloader
//!
//! Loading runs in two phases. During the collection phase every `load`
//! issued in the current scheduling turn registers its key in the pending
//! batch and receives a oneshot handle. The first caller of a window
//! becomes its dispatcher: it yields once so sibling futures polled in the
//! same turn can join, then drains the batch and fetches every distinct key
//! concurrently. Each outcome is memoized and sent to all waiting handles.
//!
//! A loader lives for one incoming query. Nothing is evicted or retried
//! while it is alive.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures::future::join_all;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use crate::fetcher::{FetchError, Fetcher};
use crate::Record;

/// Outcome of one key, shared by every caller that asked for it
pub type LoadResult = std::result::Result<Record, FetchError>;

/// What a parked caller is woken with
enum Delivery {
    Settled(LoadResult),
    /// The dispatch carrying the key was abandoned; register it again.
    Requeued,
}

type Waiters = Vec<oneshot::Sender<Delivery>>;

enum Entry {
    Pending(Waiters),
    InFlight(Waiters),
    Settled(LoadResult),
}

/// Lifecycle of a key within one loader
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyState {
    Unrequested,
    Pending,
    InFlight,
    Resolved,
    Failed,
}

/// Counters for one loader
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoaderStats {
    /// Dispatch phases run
    pub dispatches: usize,
    /// Remote lookups issued
    pub fetches: usize,
}

#[derive(Default)]
struct BatchState {
    entries: HashMap<String, Entry>,
    /// Keys of the open window, in first-request order
    queue: Vec<String>,
    window_open: bool,
    stats: LoaderStats,
}

impl BatchState {
    /// Close the collection window and move its keys in flight
    fn begin_dispatch(&mut self) -> Vec<String> {
        self.window_open = false;
        let keys = std::mem::take(&mut self.queue);
        for key in &keys {
            if let Some(entry) = self.entries.get_mut(key) {
                if let Entry::Pending(waiters) = entry {
                    *entry = Entry::InFlight(std::mem::take(waiters));
                }
            }
        }
        self.stats.dispatches += 1;
        self.stats.fetches += keys.len();
        keys
    }

    fn settle(&mut self, key: String, result: LoadResult) {
        let previous = self.entries.insert(key, Entry::Settled(result.clone()));
        if let Some(Entry::Pending(waiters) | Entry::InFlight(waiters)) = previous {
            for waiter in waiters {
                // Receiver gone means that caller was dropped; nothing to deliver.
                let _ = waiter.send(Delivery::Settled(result.clone()));
            }
        }
    }

    /// Forget the keys of a dispatch that never finished
    ///
    /// The keys go back to `Unrequested`. Callers still waiting on them are
    /// woken to register again; the first of them opens a new window.
    fn release(&mut self, keys: Vec<String>) {
        for key in keys {
            match self.entries.remove(&key) {
                Some(Entry::Pending(waiters) | Entry::InFlight(waiters)) => {
                    for waiter in waiters {
                        let _ = waiter.send(Delivery::Requeued);
                    }
                }
                Some(settled) => {
                    self.entries.insert(key, settled);
                }
                None => {}
            }
        }
    }

    fn state(&self, key: &str) -> KeyState {
        match self.entries.get(key) {
            None => KeyState::Unrequested,
            Some(Entry::Pending(_)) => KeyState::Pending,
            Some(Entry::InFlight(_)) => KeyState::InFlight,
            Some(Entry::Settled(Ok(_))) => KeyState::Resolved,
            Some(Entry::Settled(Err(_))) => KeyState::Failed,
        }
    }
}

fn lock(state: &Mutex<BatchState>) -> MutexGuard<'_, BatchState> {
    // Every critical section leaves the state consistent, so a poisoned lock is still usable.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the keys of a dispatch that never finished.
///
/// Nothing partial is cached. Callers still waiting on those keys retry
/// (see [`BatchState::release`]).
struct DispatchGuard<'a> {
    state: &'a Mutex<BatchState>,
    keys: Option<Vec<String>>,
    done: bool,
}

impl Drop for DispatchGuard<'_> {
    fn drop(&mut self) {
        if self.done {
            return;
        }
        let mut state = lock(self.state);
        let keys = match self.keys.take() {
            Some(keys) => keys,
            None => {
                state.window_open = false;
                std::mem::take(&mut state.queue)
            }
        };
        state.release(keys);
    }
}

/// DataLoader with caching and batching
///
/// Batches requests within a single GraphQL query and caches results to
/// prevent duplicate loads. Clones share the same cache; create a new
/// loader for every query.
#[derive(Clone)]
pub struct DataLoader {
    fetcher: Arc<dyn Fetcher>,
    state: Arc<Mutex<BatchState>>,
}

impl DataLoader {
    /// Create a new, empty loader on top of a fetcher
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self {
            fetcher,
            state: Arc::new(Mutex::new(BatchState::default())),
        }
    }

    /// Load a single record by key
    ///
    /// Returns the memoized outcome if the key already settled, joins the
    /// pending or in-flight lookup if one exists, and otherwise enqueues
    /// the key for the current window.
    pub async fn load(&self, key: impl Into<String>) -> LoadResult {
        let key = key.into();

        loop {
            let (receiver, dispatcher) = {
                let mut guard = lock(&self.state);
                let state = &mut *guard;
                match state.entries.get_mut(&key) {
                    Some(Entry::Settled(result)) => return result.clone(),
                    Some(Entry::Pending(waiters) | Entry::InFlight(waiters)) => {
                        let (sender, receiver) = oneshot::channel();
                        waiters.push(sender);
                        (receiver, false)
                    }
                    None => {
                        let (sender, receiver) = oneshot::channel();
                        state.entries.insert(key.clone(), Entry::Pending(vec![sender]));
                        state.queue.push(key.clone());
                        let dispatcher = !state.window_open;
                        state.window_open = true;
                        (receiver, dispatcher)
                    }
                }
            };

            if dispatcher {
                self.dispatch().await;
            }

            match receiver.await {
                Ok(Delivery::Settled(result)) => return result,
                Ok(Delivery::Requeued) => continue,
                Err(_) => return Err(FetchError::Cancelled { url: key }),
            }
        }
    }

    /// Load many records, preserving input order
    ///
    /// Each slot carries its own outcome; one failed key does not affect
    /// the others. Repeated keys share a single lookup.
    pub async fn load_many<I, K>(&self, keys: I) -> Vec<LoadResult>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let loads: Vec<_> = keys.into_iter().map(|key| self.load(key)).collect();
        if loads.is_empty() {
            return Vec::new();
        }
        join_all(loads).await
    }

    /// Lifecycle state of a key
    pub fn state(&self, key: &str) -> KeyState {
        lock(&self.state).state(key)
    }

    pub fn stats(&self) -> LoaderStats {
        lock(&self.state).stats
    }

    async fn dispatch(&self) {
        let mut guard = DispatchGuard {
            state: &self.state,
            keys: None,
            done: false,
        };

        // Let the futures polled in this turn join the window.
        tokio::task::yield_now().await;

        let keys = lock(&self.state).begin_dispatch();
        guard.keys = Some(keys.clone());
        debug!(batch_size = keys.len(), "dispatching batch");

        let results = join_all(keys.iter().map(|key| self.fetcher.fetch(key))).await;

        let mut state = lock(&self.state);
        for (key, result) in keys.into_iter().zip(results) {
            if let Err(e) = &result {
                warn!(url = e.url(), error = %e, "lookup failed");
            }
            state.settle(key, result);
        }
        guard.done = true;
    }
}

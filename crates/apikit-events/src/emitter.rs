//! Keyed listener registry and synchronous dispatch

use std::{
    collections::HashMap,
    fmt,
    hash::Hash,
    panic::{self, AssertUnwindSafe},
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use parking_lot::RwLock;
use tracing::{debug, error};

use crate::error::{BoxError, ListenerError};

/// Handle returned on registration, used to remove a listener again
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Return types accepted from listeners
///
/// Plain `()` listeners never fail; `Result` listeners fail on `Err`.
pub trait ListenerOutcome {
    fn into_result(self) -> Result<(), BoxError>;
}

impl ListenerOutcome for () {
    fn into_result(self) -> Result<(), BoxError> {
        Ok(())
    }
}

impl<E: Into<BoxError>> ListenerOutcome for Result<(), E> {
    fn into_result(self) -> Result<(), BoxError> {
        self.map_err(Into::into)
    }
}

type Callback<P> = Arc<dyn Fn(&P) -> Result<(), BoxError> + Send + Sync>;

struct Entry<P> {
    id: ListenerId,
    callback: Callback<P>,
    once: bool,
}

impl<P> Clone for Entry<P> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            callback: Arc::clone(&self.callback),
            once: self.once,
        }
    }
}

/// A listener that did not complete during an emit
#[derive(Debug)]
pub struct ListenerFailure {
    pub listener: ListenerId,
    pub error: ListenerError,
}

/// Outcome of one [`EventEmitter::emit`] call
#[derive(Debug, Default)]
pub struct EmitReport {
    /// Listeners called, including the ones that failed
    pub invoked: usize,
    pub failures: Vec<ListenerFailure>,
}

impl EmitReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn succeeded(&self) -> usize {
        self.invoked - self.failures.len()
    }

    /// `true` when every invoked listener completed
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Typed event emitter
///
/// Maps event keys (usually an enum) to an ordered list of listeners that
/// receive a shared reference to the payload. Listeners run synchronously in
/// registration order. A listener that returns an error or panics is logged
/// and reported, and the remaining listeners still run.
///
/// Listeners may register or remove listeners from inside a callback; such
/// changes apply from the next `emit`.
pub struct EventEmitter<K, P> {
    listeners: RwLock<HashMap<K, Vec<Entry<P>>>>,
    next_id: AtomicU64,
}

impl<K, P> Default for EventEmitter<K, P>
where
    K: Eq + Hash + Clone + fmt::Debug,
    P: 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, P> fmt::Debug for EventEmitter<K, P>
where
    K: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listeners = self.listeners.read();
        f.debug_struct("EventEmitter")
            .field("events", &listeners.keys().collect::<Vec<_>>())
            .field("listeners", &listeners.values().map(Vec::len).sum::<usize>())
            .finish()
    }
}

impl<K, P> EventEmitter<K, P>
where
    K: Eq + Hash + Clone + fmt::Debug,
    P: 'static,
{
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a listener for every future emit of `key`
    pub fn on<F, R>(&self, key: K, listener: F) -> ListenerId
    where
        F: Fn(&P) -> R + Send + Sync + 'static,
        R: ListenerOutcome,
    {
        self.register(key, listener, false)
    }

    /// Register a listener removed after its first invocation
    pub fn once<F, R>(&self, key: K, listener: F) -> ListenerId
    where
        F: Fn(&P) -> R + Send + Sync + 'static,
        R: ListenerOutcome,
    {
        self.register(key, listener, true)
    }

    /// Remove one listener; returns whether it was registered under `key`
    pub fn off(&self, key: &K, id: ListenerId) -> bool {
        let mut listeners = self.listeners.write();
        let Some(entries) = listeners.get_mut(key) else {
            return false;
        };

        let before = entries.len();
        entries.retain(|entry| entry.id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(key);
        }

        debug!(event = ?key, listener = %id, removed, "Removed listener");
        removed
    }

    /// Call every listener registered for `key` with `payload`
    pub fn emit(&self, key: &K, payload: &P) -> EmitReport {
        let snapshot = {
            let mut listeners = self.listeners.write();
            let Some(entries) = listeners.get_mut(key) else {
                debug!(event = ?key, "No listeners registered for event");
                return EmitReport::default();
            };

            let snapshot = entries.clone();
            entries.retain(|entry| !entry.once);
            if entries.is_empty() {
                listeners.remove(key);
            }
            snapshot
        };

        debug!(event = ?key, listener_count = snapshot.len(), "Emitting event");

        let mut report = EmitReport::default();
        for entry in snapshot {
            report.invoked += 1;

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| (entry.callback)(payload)));
            let failure = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => ListenerError::Failed(e),
                Err(panic) => ListenerError::from_panic(panic),
            };

            error!(
                event = ?key,
                listener = %entry.id,
                error = %failure,
                "Listener failed"
            );
            report.failures.push(ListenerFailure {
                listener: entry.id,
                error: failure,
            });
        }

        report
    }

    pub fn listener_count(&self, key: &K) -> usize {
        self.listeners.read().get(key).map_or(0, Vec::len)
    }

    /// Keys that currently have at least one listener
    pub fn event_keys(&self) -> Vec<K> {
        self.listeners.read().keys().cloned().collect()
    }

    /// Remove the listeners of `key`, or of every key when `None`
    ///
    /// Returns the number of listeners removed.
    pub fn remove_all(&self, key: Option<&K>) -> usize {
        let mut listeners = self.listeners.write();
        let removed = match key {
            Some(key) => listeners.remove(key).map_or(0, |entries| entries.len()),
            None => listeners.drain().map(|(_, entries)| entries.len()).sum(),
        };

        debug!(event = ?key, removed, "Removed listeners");
        removed
    }

    fn register<F, R>(&self, key: K, listener: F, once: bool) -> ListenerId
    where
        F: Fn(&P) -> R + Send + Sync + 'static,
        R: ListenerOutcome,
    {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let callback: Callback<P> = Arc::new(move |payload: &P| listener(payload).into_result());

        debug!(event = ?key, listener = %id, once, "Registered listener");
        self.listeners
            .write()
            .entry(key)
            .or_default()
            .push(Entry { id, callback, once });
        id
    }
}

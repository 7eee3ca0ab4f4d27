//! Budget state store
//!
//! An in-memory cache of the `BudgetState` document backed by a
//! `KeyValueStorage`. Every mutation goes through `update`, which swaps in
//! the new state, persists it and then notifies subscribers with the new
//! snapshot. Readers get cheap `Arc` snapshots that never change under them.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::domain::result::{Error, Result};
use crate::domain::BudgetState;
use crate::ports::KeyValueStorage;

/// Storage key of the live state document
pub const STATE_KEY: &str = "budget-analyzer.state.v1";

/// Storage key of the demo-mode state document
pub const DEMO_STATE_KEY: &str = "budget-analyzer.demo.state.v1";

type Listener = Arc<dyn Fn(&BudgetState) + Send + Sync>;

/// Handle returned by `subscribe`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub struct BudgetStore {
    storage: Arc<dyn KeyValueStorage>,
    key: String,
    state: RwLock<Arc<BudgetState>>,
    /// Serializes writers so persisted documents land in mutation order
    write_lock: Mutex<()>,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    next_listener_id: AtomicU64,
    deferred: AtomicUsize,
    dirty: AtomicBool,
}

impl BudgetStore {
    /// Load the document stored under `key`.
    ///
    /// A missing, unparsable or version-mismatched document is silently
    /// replaced by the default state. Storage failures are returned.
    pub fn open(storage: Arc<dyn KeyValueStorage>, key: impl Into<String>) -> Result<Self> {
        let key = key.into();
        let state = storage
            .get(&key)?
            .and_then(|raw| BudgetState::from_document(&raw))
            .unwrap_or_default();

        Ok(Self {
            storage,
            key,
            state: RwLock::new(Arc::new(state)),
            write_lock: Mutex::new(()),
            listeners: Mutex::new(Vec::new()),
            next_listener_id: AtomicU64::new(1),
            deferred: AtomicUsize::new(0),
            dirty: AtomicBool::new(false),
        })
    }

    /// Storage key this store persists to
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current snapshot
    pub fn get(&self) -> Arc<BudgetState> {
        match self.state.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    /// Replace the whole state
    pub fn set(&self, next: BudgetState) -> Result<()> {
        self.update(move |state| *state = next)
    }

    /// Apply `f` to the state, persist, then notify subscribers.
    ///
    /// The closure's return value is handed back to the caller, which lets
    /// get-or-create helpers return the entity they inserted. `f` runs under
    /// the state lock and must not call back into the store.
    pub fn update<R>(&self, f: impl FnOnce(&mut BudgetState) -> R) -> Result<R> {
        let (result, snapshot) = {
            let _writer = self
                .write_lock
                .lock()
                .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;

            // Mutate in place unless a reader still holds this snapshot
            let (result, current) = {
                let mut guard = self
                    .state
                    .write()
                    .map_err(|e| Error::storage(format!("Lock poisoned: {}", e)))?;
                let result = f(Arc::make_mut(&mut *guard));
                (result, Arc::clone(&*guard))
            };

            if self.deferred.load(Ordering::SeqCst) > 0 {
                self.dirty.store(true, Ordering::SeqCst);
            } else {
                self.persist(&current)?;
            }

            (result, current)
        };

        self.notify(&snapshot);
        Ok(result)
    }

    /// Register a callback invoked with every new state.
    /// Callbacks run after the writer lock is released and may use the store.
    pub fn subscribe(&self, f: impl Fn(&BudgetState) + Send + Sync + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        if let Ok(mut listeners) = self.listeners.lock() {
            listeners.push((id, Arc::new(f)));
        }
        id
    }

    /// Remove a callback. Returns false if it was not registered.
    pub fn unsubscribe(&self, id: ListenerId) -> bool {
        match self.listeners.lock() {
            Ok(mut listeners) => {
                let before = listeners.len();
                listeners.retain(|(lid, _)| *lid != id);
                listeners.len() != before
            }
            Err(_) => false,
        }
    }

    /// Replace everything with a fresh default state
    pub fn reset(&self) -> Result<()> {
        self.set(BudgetState::default())
    }

    /// Hold back durable writes until the returned batch is committed or
    /// dropped. In-memory state and notifications are unaffected.
    pub fn defer_writes(&self) -> WriteBatch<'_> {
        self.deferred.fetch_add(1, Ordering::SeqCst);
        WriteBatch {
            store: self,
            finished: false,
        }
    }

    /// Write the current snapshot to storage
    pub fn flush(&self) -> Result<()> {
        let snapshot = self.get();
        self.persist(&snapshot)?;
        self.dirty.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn persist(&self, state: &BudgetState) -> Result<()> {
        let document = state.to_document()?;
        self.storage.set(&self.key, &document)
    }

    fn notify(&self, state: &BudgetState) {
        let listeners: Vec<Listener> = match self.listeners.lock() {
            Ok(listeners) => listeners.iter().map(|(_, l)| Arc::clone(l)).collect(),
            Err(_) => return,
        };
        for listener in listeners {
            listener(state);
        }
    }

    /// Leave a deferred section; returns true if this was the outermost one
    fn end_deferred(&self) -> bool {
        self.deferred.fetch_sub(1, Ordering::SeqCst) == 1
    }
}

/// Guard returned by `BudgetStore::defer_writes`
pub struct WriteBatch<'a> {
    store: &'a BudgetStore,
    finished: bool,
}

impl WriteBatch<'_> {
    /// End the batch, persisting pending changes if this was the outermost one
    pub fn commit(mut self) -> Result<()> {
        self.finished = true;
        if self.store.end_deferred() && self.store.dirty.load(Ordering::SeqCst) {
            self.store.flush()?;
        }
        Ok(())
    }
}

impl Drop for WriteBatch<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if self.store.end_deferred() && self.store.dirty.load(Ordering::SeqCst) {
            // Best effort; callers that care about the error use commit()
            let _ = self.store.flush();
        }
    }
}

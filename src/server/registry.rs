//! Tracking of open connections for bulk shutdown.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use log::{debug, info, warn};
use tokio::sync::oneshot;

/// Opaque handle naming an accepted connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Default)]
struct RegistryState {
    open: BTreeMap<ConnectionId, oneshot::Sender<()>>,
    shut_down: bool,
}

/// The set of currently open connections.
///
/// Every mutation goes through one mutex. Each entry owns the sending half of
/// a close trigger; the connection's task holds the receiving half inside its
/// [`ConnectionGuard`] and drops its stream when the trigger fires.
pub struct ConnectionRegistry {
    state: Mutex<RegistryState>,
    next_id: AtomicU64,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl ConnectionRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    // A panicking holder cannot leave the map half-updated, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Allocate a fresh connection id.
    pub fn next_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add a connection to the open set.
    ///
    /// The returned guard releases the connection when dropped. If
    /// [`shutdown_all`](Self::shutdown_all) has already run, or `id` is
    /// already open, the connection is not added: the guard's close trigger
    /// has already fired and dropping it leaves the registry untouched.
    pub fn register(self: &Arc<Self>, id: ConnectionId) -> ConnectionGuard {
        let (tx, rx) = oneshot::channel();
        let mut state = self.lock();

        let registered = if state.shut_down {
            debug!("Registry shut down, closing connection {id} immediately");
            false
        } else if state.open.contains_key(&id) {
            warn!("Connection {id} is already open, refusing duplicate registration");
            false
        } else {
            state.open.insert(id, tx);
            true
        };

        ConnectionGuard {
            id,
            registry: Arc::clone(self),
            closed: rx,
            fired: false,
            registered,
        }
    }

    /// Remove a connection from the open set.
    ///
    /// Returns `true` if the connection was present. Releasing an id that is
    /// already gone (a second release, or one closed by shutdown) is a no-op.
    pub fn release(&self, id: ConnectionId) -> bool {
        let removed = self.lock().open.remove(&id).is_some();
        if removed {
            debug!("Connection {id} released");
        } else {
            debug!("Connection {id} already released");
        }
        removed
    }

    /// Close every open connection and refuse new ones.
    ///
    /// Each close trigger fires exactly once. Returns how many connections
    /// were closed.
    pub fn shutdown_all(&self) -> usize {
        let open = {
            let mut state = self.lock();
            state.shut_down = true;
            std::mem::take(&mut state.open)
        };

        let count = open.len();
        for (id, trigger) in open {
            info!("Closing connection {id}");
            // The task may already be unwinding; its receiver is gone then.
            let _ = trigger.send(());
        }
        count
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.lock().open.contains_key(&id)
    }

    /// Number of open connections.
    pub fn len(&self) -> usize {
        self.lock().open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().open.is_empty()
    }

    /// Snapshot of the open connection ids, in ascending order.
    pub fn open_ids(&self) -> Vec<ConnectionId> {
        self.lock().open.keys().copied().collect()
    }

    pub fn is_shut_down(&self) -> bool {
        self.lock().shut_down
    }
}

/// Scoped membership of one connection in a [`ConnectionRegistry`].
///
/// Dropping the guard releases the connection, so release happens on every
/// exit path of the task that owns it, panics included.
pub struct ConnectionGuard {
    id: ConnectionId,
    registry: Arc<ConnectionRegistry>,
    closed: oneshot::Receiver<()>,
    fired: bool,
    // False when registration was refused; such a guard owns no entry.
    registered: bool,
}

impl ConnectionGuard {
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Resolves once the registry asks this connection to close.
    pub async fn closed(&mut self) {
        if self.fired {
            return;
        }
        // A dropped sender means the entry is gone, which is also a close.
        let _ = (&mut self.closed).await;
        self.fired = true;
    }
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        if self.registered {
            self.registry.release(self.id);
        }
    }
}

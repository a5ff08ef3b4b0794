//! # Connection Manager
//!
//! One live store connection per process: created lazily on first use,
//! reused by every request, released explicitly at shutdown. The manager is
//! owned by the process lifecycle and handed to the engine as its executor;
//! nothing reaches it through global state.

use crate::executor::StoreExecutor;
use crate::params::QueryParams;
use crate::{GraphLensError, ResultSet};
use std::sync::{Arc, Mutex};

/// Opens connections to a store.
pub trait Connector: Send + Sync {
    /// The live connection type. It must be usable from many threads at once.
    type Connection: StoreExecutor;

    /// Open and verify a new connection.
    fn connect(&self) -> Result<Self::Connection, GraphLensError>;

    /// Human-readable target description for logs (never includes credentials).
    fn target(&self) -> String;
}

/// Lazily connecting, explicitly released connection holder.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    live: Mutex<Option<Arc<C::Connection>>>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a manager. No connection is opened until [`acquire`](Self::acquire).
    #[must_use]
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            live: Mutex::new(None),
        }
    }

    /// The live connection, connecting first if there is none.
    ///
    /// A failed connect leaves the manager disconnected; the next call retries.
    pub fn acquire(&self) -> Result<Arc<C::Connection>, GraphLensError> {
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(conn) = live.as_ref() {
            return Ok(Arc::clone(conn));
        }

        tracing::info!("Connecting to graph store at {}...", self.connector.target());
        let conn = self.connector.connect().inspect_err(|e| {
            tracing::error!("Failed to connect to graph store: {}", e);
        })?;
        tracing::info!("Graph store connection established");

        let conn = Arc::new(conn);
        *live = Some(Arc::clone(&conn));
        Ok(conn)
    }

    /// Drop the live connection. Returns whether one was held.
    ///
    /// Requests still holding the connection finish on it; new requests
    /// reconnect.
    pub fn release(&self) -> bool {
        let released = self
            .live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
            .is_some();
        if released {
            tracing::info!("Graph store connection released");
        }
        released
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.live
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    #[must_use]
    pub fn connector(&self) -> &C {
        &self.connector
    }
}

impl<C: Connector> StoreExecutor for ConnectionManager<C> {
    fn execute(&self, query: &str, params: &QueryParams) -> Result<ResultSet, GraphLensError> {
        self.acquire()?.execute(query, params)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::MemoryStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConnector {
        connects: AtomicUsize,
        fail: bool,
    }

    impl CountingConnector {
        fn new(fail: bool) -> Self {
            Self {
                connects: AtomicUsize::new(0),
                fail,
            }
        }
    }

    impl Connector for CountingConnector {
        type Connection = MemoryStore;

        fn connect(&self) -> Result<MemoryStore, GraphLensError> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(GraphLensError::Store("connection refused".into()));
            }
            Ok(MemoryStore::new().respond("RETURN 1 AS ok", ResultSet::new(["ok"])))
        }

        fn target(&self) -> String {
            "memory://test".into()
        }
    }

    #[test]
    fn connects_lazily_and_reuses() {
        let manager = ConnectionManager::new(CountingConnector::new(false));
        assert!(!manager.is_connected());

        let first = manager.acquire().expect("acquire");
        let second = manager.acquire().expect("acquire");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(manager.connector().connects.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn release_forces_reconnect() {
        let manager = ConnectionManager::new(CountingConnector::new(false));
        manager.acquire().expect("acquire");

        assert!(manager.release());
        assert!(!manager.release());
        assert!(!manager.is_connected());

        manager.acquire().expect("reacquire");
        assert_eq!(manager.connector().connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn failed_connect_is_store_error_and_retried() {
        let manager = ConnectionManager::new(CountingConnector::new(true));
        assert!(matches!(manager.acquire(), Err(GraphLensError::Store(_))));
        assert!(matches!(manager.acquire(), Err(GraphLensError::Store(_))));
        assert_eq!(manager.connector().connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn executes_through_live_connection() {
        let manager = ConnectionManager::new(CountingConnector::new(false));
        let result = manager
            .execute("RETURN 1 AS ok", &QueryParams::new())
            .expect("execute");
        assert_eq!(result.keys, vec!["ok"]);
        assert!(manager.is_connected());
    }
}

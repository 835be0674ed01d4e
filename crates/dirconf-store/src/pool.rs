use std::ops::Deref;
use std::sync::{Mutex, PoisonError};

use tracing::debug;

use crate::error::StoreResult;
use crate::memory::InMemoryDirectory;
use crate::traits::DirectoryConnection;

/// Default number of idle connections retained by a pool.
pub const DEFAULT_MAX_IDLE: usize = 8;

/// Opens new connections for a [`ConnectionPool`].
pub trait ConnectionFactory: Send + Sync {
    type Connection: DirectoryConnection;

    fn connect(&self) -> StoreResult<Self::Connection>;
}

impl ConnectionFactory for InMemoryDirectory {
    type Connection = InMemoryDirectory;

    fn connect(&self) -> StoreResult<Self::Connection> {
        Ok(self.clone())
    }
}

/// A simple pool of directory connections.
///
/// Connections are borrowed for the duration of one operation and returned
/// when the [`PooledConnection`] guard drops, on success and failure alike.
/// At most `max_idle` connections are kept; extra ones are closed on return.
pub struct ConnectionPool<F: ConnectionFactory> {
    factory: F,
    idle: Mutex<Vec<F::Connection>>,
    max_idle: usize,
}

impl<F: ConnectionFactory> ConnectionPool<F> {
    pub fn new(factory: F) -> Self {
        Self::with_max_idle(factory, DEFAULT_MAX_IDLE)
    }

    pub fn with_max_idle(factory: F, max_idle: usize) -> Self {
        Self {
            factory,
            idle: Mutex::new(Vec::new()),
            max_idle,
        }
    }

    pub fn factory(&self) -> &F {
        &self.factory
    }

    /// Borrow a connection, reusing an idle one when available.
    pub fn borrow(&self) -> StoreResult<PooledConnection<'_, F>> {
        let reused = self
            .idle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop();
        let conn = match reused {
            Some(conn) => conn,
            None => {
                debug!("opening new directory connection");
                self.factory.connect()?
            }
        };
        Ok(PooledConnection {
            pool: self,
            conn: Some(conn),
        })
    }

    /// Number of connections currently idle.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    fn release(&self, conn: F::Connection) {
        let mut idle = self.idle.lock().unwrap_or_else(PoisonError::into_inner);
        if idle.len() < self.max_idle {
            idle.push(conn);
        }
    }
}

impl<F: ConnectionFactory> std::fmt::Debug for ConnectionPool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionPool")
            .field("idle", &self.idle_count())
            .field("max_idle", &self.max_idle)
            .finish()
    }
}

/// A borrowed connection. Returns itself to the pool on drop.
pub struct PooledConnection<'a, F: ConnectionFactory> {
    pool: &'a ConnectionPool<F>,
    conn: Option<F::Connection>,
}

impl<F: ConnectionFactory> Deref for PooledConnection<'_, F> {
    type Target = F::Connection;

    fn deref(&self) -> &Self::Target {
        // Only `drop` takes the connection out.
        match &self.conn {
            Some(conn) => conn,
            None => unreachable!("pooled connection used after release"),
        }
    }
}

impl<F: ConnectionFactory> Drop for PooledConnection<'_, F> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.release(conn);
        }
    }
}

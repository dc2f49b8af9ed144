use std::collections::HashMap;
use std::sync::Mutex;

use crate::net::stream::Stream;

/// Destination key: host (name or numeric address, as configured) and port.
pub type Address = (String, u16);

/// A pooled transport connection paired with its request history flag.
///
/// `sent_request` records whether at least one request completed on this
/// connection since it was created; the stale-connection retry policy only
/// fires for connections that had. Dropping a `PooledConn` shuts the
/// transport down.
#[derive(Debug)]
pub struct PooledConn {
    pub stream: Stream,
    pub sent_request: bool,
}

impl PooledConn {
    pub fn new(stream: Stream) -> Self {
        Self {
            stream,
            sent_request: false,
        }
    }
}

impl Drop for PooledConn {
    fn drop(&mut self) {
        self.stream.shutdown();
    }
}

/// One live connection per destination address, shared across requester
/// threads. Connections are checked out for the duration of a request and
/// checked back in afterward, so the map lock is only ever held for map
/// operations, never across I/O.
#[derive(Debug, Default)]
pub struct ConnectionPool {
    conns: Mutex<HashMap<Address, PooledConn>>,
}

impl ConnectionPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove and return the pooled connection for `address`, if any. The
    /// caller owns it until it is returned via [`ConnectionPool::put`] or
    /// dropped (which closes it).
    pub fn take(&self, address: &Address) -> Option<PooledConn> {
        let Ok(mut conns) = self.conns.lock() else {
            return None;
        };
        conns.remove(address)
    }

    /// Return a connection to the pool. If another thread already parked a
    /// connection for the same address, the displaced one is closed.
    pub fn put(&self, address: Address, conn: PooledConn) {
        if let Ok(mut conns) = self.conns.lock()
            && let Some(displaced) = conns.insert(address, conn)
        {
            drop(displaced);
        }
    }

    /// Close and discard the pooled connection for `address`, if present.
    pub fn close(&self, address: &Address) {
        if let Ok(mut conns) = self.conns.lock() {
            conns.remove(address);
        }
    }

    /// Close every pooled connection. Called on client teardown.
    pub fn close_all(&self) {
        if let Ok(mut conns) = self.conns.lock() {
            let count = conns.len();
            conns.clear();
            if count > 0 {
                tracing::debug!(count, "closed pooled connections");
            }
        }
    }
}

impl Drop for ConnectionPool {
    fn drop(&mut self) {
        self.close_all();
    }
}

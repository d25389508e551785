//! Transport seams: opening connections and executing requests on them.

pub mod connection;

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::cluster::Host;
use crate::errors::QueryError;
use crate::frame::server_event_type::EventType;
use crate::response::Row;
use crate::statement::Statement;

pub use connection::{Connection, ConnectionOptions, DEFAULT_PROTOCOL_VERSION};

/// A request the control connection sends down a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// A CQL read against a system table.
    Query(Statement),
    /// REGISTER for the given server event streams.
    Register(Vec<EventType>),
}

/// Opens and closes transports.
///
/// Implementations own the wire layer: TCP, TLS, startup handshake and
/// authentication all happen inside [`connect`]. Negotiation failures are
/// reported as [`QueryError::DbError`] with the protocol error code, which the
/// control connection answers by lowering the protocol version and retrying
/// the same host.
///
/// [`connect`]: Connector::connect
#[async_trait]
pub trait Connector: Send + Sync {
    /// Opens a transport to `host` and completes the startup handshake.
    async fn connect(&self, host: &Arc<Host>) -> Result<Arc<Connection>, QueryError>;

    /// Closes a transport previously produced by [`connect`].
    ///
    /// [`connect`]: Connector::connect
    async fn close(&self, host: IpAddr, connection: Arc<Connection>);
}

/// Executes control-plane requests on an established connection.
#[async_trait]
pub trait RequestRunner: Send + Sync {
    /// Runs `request` on `connection` and returns the resulting rows.
    /// REGISTER requests return no rows.
    async fn execute(
        &self,
        connection: &Arc<Connection>,
        request: Request,
    ) -> Result<Vec<Row>, QueryError>;
}

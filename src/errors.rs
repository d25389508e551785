//! Error taxonomy of the control plane.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;

use thiserror::Error;

/// An error reported by the database in an ERROR response.
///
/// Only a subset of the server's error space matters to the control
/// connection: `ProtocolError` (code `0x000A`) triggers a wire-protocol
/// downgrade and `AuthenticationError` (code `0x0100`) aborts the whole
/// connection plan. The remaining variants are carried through untouched.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DbError {
    /// Internal server error
    #[error("Internal server error")]
    ServerError,

    /// The server refused the requested wire-protocol version
    #[error("Protocol version negotiation failed")]
    ProtocolError,

    /// Authentication failed - bad credentials
    #[error("Authentication failed - bad credentials")]
    AuthenticationError,

    /// The request cannot be processed because the coordinator is overloaded
    #[error("The coordinator node is overloaded")]
    Overloaded,

    /// The coordinator node is still bootstrapping
    #[error("The coordinator node is still bootstrapping")]
    IsBootstrapping,

    /// Error during truncate operation
    #[error("Error during truncate operation")]
    TruncateError,

    /// The submitted query has a syntax error
    #[error("The submitted query has a syntax error")]
    SyntaxError,

    /// The logged user doesn't have the right to perform the query
    #[error("The logged user doesn't have the right to perform the query")]
    Unauthorized,

    /// The query is syntactically correct but invalid
    #[error("The query is syntactically correct but invalid")]
    Invalid,

    /// The query is invalid because of some configuration issue
    #[error("The query is invalid because of some configuration issue")]
    ConfigError,

    /// Error code not covered by the variants above
    #[error("Unknown server error (code {0:#06x})")]
    Other(i32),
}

impl DbError {
    /// The wire error code of this error.
    pub fn code(&self) -> i32 {
        match self {
            DbError::ServerError => 0x0000,
            DbError::ProtocolError => 0x000A,
            DbError::AuthenticationError => 0x0100,
            DbError::Overloaded => 0x1001,
            DbError::IsBootstrapping => 0x1002,
            DbError::TruncateError => 0x1003,
            DbError::SyntaxError => 0x2000,
            DbError::Unauthorized => 0x2100,
            DbError::Invalid => 0x2200,
            DbError::ConfigError => 0x2300,
            DbError::Other(code) => *code,
        }
    }

    /// Maps a wire error code back to a variant.
    pub fn from_code(code: i32) -> Self {
        match code {
            0x0000 => DbError::ServerError,
            0x000A => DbError::ProtocolError,
            0x0100 => DbError::AuthenticationError,
            0x1001 => DbError::Overloaded,
            0x1002 => DbError::IsBootstrapping,
            0x1003 => DbError::TruncateError,
            0x2000 => DbError::SyntaxError,
            0x2100 => DbError::Unauthorized,
            0x2200 => DbError::Invalid,
            0x2300 => DbError::ConfigError,
            other => DbError::Other(other),
        }
    }
}

/// Error of a single request or connection attempt against one node.
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum QueryError {
    /// Database sent a response containing some error with a message
    #[error("Database returned an error: {0}, Error message: {1}")]
    DbError(DbError, String),

    /// Input/Output error has occurred, connection refused etc.
    #[error("IO Error: {0}")]
    IoError(Arc<std::io::Error>),

    /// The connection went away between scheduling a request and executing it
    #[error("Control connection is not connected")]
    NotConnected,

    /// Connection broke while the request was in flight
    #[error("Connection broken: {0}")]
    BrokenConnection(String),

    /// Timeout error has occurred, request didn't complete in time
    #[error("Request timeout: {0}")]
    RequestTimeout(String),

    /// Unexpected message received
    #[error("Protocol Error: {0}")]
    ProtocolError(&'static str),
}

impl QueryError {
    /// True for the negotiation error that is recovered locally by retrying
    /// the same host at a lower protocol version.
    pub fn is_protocol_negotiation_error(&self) -> bool {
        matches!(self, QueryError::DbError(DbError::ProtocolError, _))
    }

    /// True for authentication failures, native or reported on the query path.
    pub fn is_authentication_error(&self) -> bool {
        matches!(self, QueryError::DbError(DbError::AuthenticationError, _))
    }
}

impl From<std::io::Error> for QueryError {
    fn from(error: std::io::Error) -> QueryError {
        QueryError::IoError(Arc::new(error))
    }
}

/// Error surfaced from [`ControlConnection::connect`].
///
/// [`ControlConnection::connect`]: crate::ControlConnection::connect
#[derive(Error, Debug, Clone)]
#[non_exhaustive]
pub enum ControlConnectionError {
    /// Every host in the load balancing plan failed with a non-fatal error.
    /// Carries the last error observed per attempted host.
    #[error("All hosts tried for the control connection failed ({} attempted)", .errors.len())]
    NoHostsAvailable {
        errors: HashMap<IpAddr, ControlConnectionError>,
    },

    /// Bad credentials; the remaining hosts in the plan are not attempted.
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    /// system.local and system.peers both came back empty.
    #[error("Cluster reported no hosts")]
    NoHosts,

    /// A request against the current connection failed.
    #[error(transparent)]
    Query(#[from] QueryError),
}

impl ControlConnectionError {
    /// Rewraps query-path authentication failures (error code `0x0100`) as
    /// [`ControlConnectionError::AuthenticationError`].
    pub(crate) fn classified(self) -> Self {
        match self {
            ControlConnectionError::Query(error) if error.is_authentication_error() => {
                ControlConnectionError::AuthenticationError(error.to_string())
            }
            other => other,
        }
    }

    pub(crate) fn is_authentication_error(&self) -> bool {
        matches!(self, ControlConnectionError::AuthenticationError(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_error_code_roundtrip() {
        for code in [0x0000, 0x000A, 0x0100, 0x1001, 0x1002, 0x1003, 0x2000, 0x2100, 0x2200, 0x2300]
        {
            assert_eq!(DbError::from_code(code).code(), code);
        }
        assert_eq!(DbError::from_code(0x1500), DbError::Other(0x1500));
        assert_eq!(DbError::Other(0x1500).code(), 0x1500);
    }

    #[test]
    fn query_error_classification() {
        let protocol = QueryError::DbError(DbError::ProtocolError, "bad version".to_string());
        assert!(protocol.is_protocol_negotiation_error());
        assert!(!protocol.is_authentication_error());

        let auth = QueryError::DbError(DbError::AuthenticationError, "bad credentials".to_string());
        assert!(auth.is_authentication_error());
        assert!(!auth.is_protocol_negotiation_error());

        let io: QueryError = std::io::Error::from(std::io::ErrorKind::ConnectionRefused).into();
        assert!(!io.is_authentication_error());
    }

    #[test]
    fn query_auth_failure_is_reclassified() {
        let error = ControlConnectionError::Query(QueryError::DbError(
            DbError::AuthenticationError,
            "bad credentials".to_string(),
        ));
        assert_matches::assert_matches!(
            error.classified(),
            ControlConnectionError::AuthenticationError(_)
        );

        let other = ControlConnectionError::Query(QueryError::NotConnected);
        assert_matches::assert_matches!(
            other.classified(),
            ControlConnectionError::Query(QueryError::NotConnected)
        );
    }
}

//! Cluster membership, schema metadata and the control connection itself.

pub mod control_connection;
pub mod host;
pub mod registry;
pub mod schema;

pub use control_connection::ControlConnection;
pub use host::Host;
pub use registry::{ClusterHostRegistry, ClusterRegistry};
pub use schema::{ClusterSchema, ClusterSchemaCatalog, KeyspaceMetadata, TableMetadata};

//! Control plane of the async Rust driver for the Basalt wide-column database.
//!
//! The heart of this crate is the [`ControlConnection`]: a single long-lived
//! session to one node of the cluster, used exclusively for metadata and
//! server-pushed events, never for user queries. It discovers cluster members,
//! keeps keyspace/table/column metadata fresh, reacts to topology, status and
//! schema change events, and probes nodes that are believed to be down.
//!
//! Transport, request execution, host ranking and backoff policy are all
//! seams: the control connection drives them through the [`Connector`],
//! [`RequestRunner`], [`LoadBalancingPolicy`], [`ReconnectionPolicy`] and
//! [`IoReactor`] traits, so embedders can plug in their own wire layer.
//!
//! # Establishing the control connection
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # async fn example(
//! #     connector: Arc<dyn basalt::network::Connector>,
//! #     runner: Arc<dyn basalt::network::RequestRunner>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! use basalt::cluster::{ClusterHostRegistry, ClusterSchemaCatalog, Host};
//! use basalt::network::ConnectionOptions;
//! use basalt::policies::{ExponentialReconnectionPolicy, RoundRobinPolicy};
//! use basalt::reactor::TokioReactor;
//! use basalt::ControlConnection;
//! use std::time::Duration;
//!
//! let contact_points = vec![Arc::new(Host::new("10.0.0.1".parse()?))];
//! let control = ControlConnection::new(
//!     Arc::new(TokioReactor::new()),
//!     connector,
//!     runner,
//!     Arc::new(RoundRobinPolicy::new(contact_points)),
//!     Arc::new(ExponentialReconnectionPolicy::new(
//!         Duration::from_millis(500),
//!         Duration::from_secs(32),
//!     )),
//!     Arc::new(ClusterHostRegistry::new()),
//!     Arc::new(ClusterSchemaCatalog::new()),
//!     Arc::new(ConnectionOptions::default()),
//! );
//! control.connect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Connector`]: crate::network::Connector
//! [`RequestRunner`]: crate::network::RequestRunner
//! [`LoadBalancingPolicy`]: crate::policies::LoadBalancingPolicy
//! [`ReconnectionPolicy`]: crate::policies::ReconnectionPolicy
//! [`IoReactor`]: crate::reactor::IoReactor

pub mod cluster;
pub mod errors;
pub mod frame;
pub mod network;
pub mod policies;
pub mod reactor;
pub mod response;
pub mod statement;

pub(crate) mod utils;

pub use cluster::control_connection::ControlConnection;
pub use cluster::Host;
pub use errors::{ControlConnectionError, DbError, QueryError};
pub use response::Row;
pub use statement::{Consistency, Statement};

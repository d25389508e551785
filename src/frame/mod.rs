//! Wire-facing types the control connection consumes.
//!
//! Framing itself lives behind the [`Connector`]/[`RequestRunner`] seams; this
//! module only defines the server event vocabulary and the boundary that lifts
//! stringly-typed event payloads into tagged enums.
//!
//! [`Connector`]: crate::network::Connector
//! [`RequestRunner`]: crate::network::RequestRunner

pub mod events;
pub mod server_event_type;

pub use events::{
    Event, EventPayload, EventParseError, SchemaChangeEvent, SchemaChangeType, StatusChangeEvent,
    TopologyChangeEvent,
};
pub use server_event_type::EventType;

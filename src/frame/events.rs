use std::net::IpAddr;

use thiserror::Error;

use crate::frame::server_event_type::EventType;

/// A server-pushed event, lifted into tagged variants at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    TopologyChange(TopologyChangeEvent),
    StatusChange(StatusChangeEvent),
    SchemaChange(SchemaChangeEvent),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyChangeEvent {
    NewNode(IpAddr),
    RemovedNode(IpAddr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChangeEvent {
    Up(IpAddr),
    Down(IpAddr),
}

/// Schema events arrive with an optional table name; an empty table marks a
/// keyspace-level change, so the distinction is encoded in the variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaChangeEvent {
    KeyspaceChange {
        change_type: SchemaChangeType,
        keyspace_name: String,
    },
    TableChange {
        change_type: SchemaChangeType,
        keyspace_name: String,
        table_name: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaChangeType {
    Created,
    Updated,
    Dropped,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum EventParseError {
    #[error("Invalid server event type: {0}")]
    EventType(String),
    #[error("Invalid type of change ({0}) in TOPOLOGY_CHANGE event")]
    TopologyChange(String),
    #[error("Invalid type of status change ({0}) in STATUS_CHANGE event")]
    StatusChange(String),
    #[error("Invalid type of schema change ({0}) in SCHEMA_CHANGE event")]
    SchemaChange(String),
    #[error("Missing {field} in {event} event")]
    MissingField {
        event: &'static str,
        field: &'static str,
    },
}

/// Raw event payload as delivered by the transport, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPayload {
    pub event_type: String,
    pub change: String,
    pub keyspace: Option<String>,
    /// Present but empty for keyspace-level schema changes.
    pub table: Option<String>,
    pub address: Option<IpAddr>,
}

impl TryFrom<EventPayload> for Event {
    type Error = EventParseError;

    fn try_from(payload: EventPayload) -> Result<Self, Self::Error> {
        let event_type: EventType = payload.event_type.parse()?;
        match event_type {
            EventType::TopologyChange => {
                let address = payload.address.ok_or(EventParseError::MissingField {
                    event: "TOPOLOGY_CHANGE",
                    field: "address",
                })?;
                match payload.change.as_str() {
                    "NEW_NODE" => Ok(Event::TopologyChange(TopologyChangeEvent::NewNode(address))),
                    "REMOVED_NODE" => Ok(Event::TopologyChange(TopologyChangeEvent::RemovedNode(
                        address,
                    ))),
                    other => Err(EventParseError::TopologyChange(other.to_string())),
                }
            }
            EventType::StatusChange => {
                let address = payload.address.ok_or(EventParseError::MissingField {
                    event: "STATUS_CHANGE",
                    field: "address",
                })?;
                match payload.change.as_str() {
                    "UP" => Ok(Event::StatusChange(StatusChangeEvent::Up(address))),
                    "DOWN" => Ok(Event::StatusChange(StatusChangeEvent::Down(address))),
                    other => Err(EventParseError::StatusChange(other.to_string())),
                }
            }
            EventType::SchemaChange => {
                let change_type = match payload.change.as_str() {
                    "CREATED" => SchemaChangeType::Created,
                    "UPDATED" => SchemaChangeType::Updated,
                    "DROPPED" => SchemaChangeType::Dropped,
                    other => return Err(EventParseError::SchemaChange(other.to_string())),
                };
                let keyspace_name = payload.keyspace.ok_or(EventParseError::MissingField {
                    event: "SCHEMA_CHANGE",
                    field: "keyspace",
                })?;
                match payload.table.filter(|table| !table.is_empty()) {
                    Some(table_name) => Ok(Event::SchemaChange(SchemaChangeEvent::TableChange {
                        change_type,
                        keyspace_name,
                        table_name,
                    })),
                    None => Ok(Event::SchemaChange(SchemaChangeEvent::KeyspaceChange {
                        change_type,
                        keyspace_name,
                    })),
                }
            }
        }
    }
}

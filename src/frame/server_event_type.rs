use std::fmt;
use std::str::FromStr;

use crate::frame::events::EventParseError;

/// The three server event streams a control connection REGISTERs for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    TopologyChange,
    StatusChange,
    SchemaChange,
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match &self {
            Self::TopologyChange => "TOPOLOGY_CHANGE",
            Self::StatusChange => "STATUS_CHANGE",
            Self::SchemaChange => "SCHEMA_CHANGE",
        };

        write!(f, "{}", s)
    }
}

impl FromStr for EventType {
    type Err = EventParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TOPOLOGY_CHANGE" => Ok(Self::TopologyChange),
            "STATUS_CHANGE" => Ok(Self::StatusChange),
            "SCHEMA_CHANGE" => Ok(Self::SchemaChange),
            _ => Err(EventParseError::EventType(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_matches_wire_strings() {
        assert_eq!(EventType::TopologyChange.to_string(), "TOPOLOGY_CHANGE");
        assert_eq!(EventType::StatusChange.to_string(), "STATUS_CHANGE");
        assert_eq!(EventType::SchemaChange.to_string(), "SCHEMA_CHANGE");
    }

    #[test]
    fn parse_is_the_inverse_of_display() {
        for event_type in [
            EventType::TopologyChange,
            EventType::StatusChange,
            EventType::SchemaChange,
        ] {
            assert_eq!(event_type.to_string().parse::<EventType>(), Ok(event_type));
        }
        assert!("KEYSPACE_CHANGE".parse::<EventType>().is_err());
    }
}

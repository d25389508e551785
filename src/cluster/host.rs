//! A cluster member as seen by the driver.

use std::fmt::Display;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};

use uuid::Uuid;

use crate::response::Row;

/// A node of the cluster.
///
/// Identity is the broadcast address; descriptive fields come from the
/// `system.local`/`system.peers` row the node was discovered through. The down
/// marker is the only mutable state; a host whose metadata changes is
/// replaced with a fresh instance by the registry, inheriting the marker.
#[derive(Debug)]
pub struct Host {
    ip: IpAddr,
    datacenter: Option<String>,
    rack: Option<String>,
    host_id: Option<Uuid>,
    release_version: Option<String>,
    down: AtomicBool,
}

impl Host {
    /// A host known only by address, e.g. an initial contact point.
    pub fn new(ip: IpAddr) -> Self {
        Host {
            ip,
            datacenter: None,
            rack: None,
            host_id: None,
            release_version: None,
            down: AtomicBool::new(false),
        }
    }

    /// Builds a host from a `system.local` or `system.peers` row.
    /// Unparseable or absent columns simply stay unknown.
    pub fn from_system_row(ip: IpAddr, row: &Row) -> Self {
        Host {
            ip,
            datacenter: row.get("data_center").map(str::to_string),
            rack: row.get("rack").map(str::to_string),
            host_id: row.get("host_id").and_then(|id| Uuid::parse_str(id).ok()),
            release_version: row.get("release_version").map(str::to_string),
            down: AtomicBool::new(false),
        }
    }

    pub fn ip(&self) -> IpAddr {
        self.ip
    }

    pub fn datacenter(&self) -> Option<&str> {
        self.datacenter.as_deref()
    }

    pub fn rack(&self) -> Option<&str> {
        self.rack.as_deref()
    }

    pub fn host_id(&self) -> Option<Uuid> {
        self.host_id
    }

    pub fn release_version(&self) -> Option<&str> {
        self.release_version.as_deref()
    }

    pub fn is_down(&self) -> bool {
        self.down.load(Ordering::SeqCst)
    }

    pub fn is_up(&self) -> bool {
        !self.is_down()
    }

    pub fn mark_down(&self) {
        self.down.store(true, Ordering::SeqCst);
    }

    pub fn mark_up(&self) {
        self.down.store(false, Ordering::SeqCst);
    }

    /// True when the descriptive fields match `row`; used by the registry to
    /// keep host instances stable across redundant refreshes.
    pub(crate) fn describes_row(&self, row: &Row) -> bool {
        self.datacenter.as_deref() == row.get("data_center")
            && self.rack.as_deref() == row.get("rack")
            && self.host_id == row.get("host_id").and_then(|id| Uuid::parse_str(id).ok())
            && self.release_version.as_deref() == row.get("release_version")
    }
}

impl Display for Host {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.ip)
    }
}

impl PartialEq for Host {
    fn eq(&self, other: &Self) -> bool {
        self.ip == other.ip
    }
}

impl Eq for Host {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_from_a_system_row() {
        let row = Row::new()
            .with("data_center", "dc1")
            .with("rack", "r1")
            .with("host_id", "5d1b0f07-8c2c-4cfb-97ac-2ecc25c87a2e")
            .with("release_version", "2.1.8");
        let host = Host::from_system_row("10.0.0.1".parse().unwrap(), &row);

        assert_eq!(host.datacenter(), Some("dc1"));
        assert_eq!(host.rack(), Some("r1"));
        assert_eq!(
            host.host_id(),
            Some(Uuid::parse_str("5d1b0f07-8c2c-4cfb-97ac-2ecc25c87a2e").unwrap())
        );
        assert_eq!(host.release_version(), Some("2.1.8"));
        assert!(host.is_up());
        assert!(host.describes_row(&row));
    }

    #[test]
    fn malformed_host_id_stays_unknown() {
        let row = Row::new().with("host_id", "not-a-uuid");
        let host = Host::from_system_row("10.0.0.1".parse().unwrap(), &row);
        assert_eq!(host.host_id(), None);
    }

    #[test]
    fn down_marker_flips_both_ways() {
        let host = Host::new("10.0.0.1".parse().unwrap());
        assert!(host.is_up());
        host.mark_down();
        assert!(host.is_down());
        host.mark_up();
        assert!(host.is_up());
    }
}

//! Catalogue of known cluster members.

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::cluster::host::Host;
use crate::response::Row;

/// External catalogue of cluster members and their up/down state.
///
/// The control connection reports what it learns from the system tables and
/// from server events; the registry owns the membership view. Implementations
/// synchronize internally; the control connection calls these methods without
/// holding any lock of its own.
pub trait ClusterRegistry: Send + Sync {
    /// A node was discovered, or re-confirmed, through a system-table row.
    /// Must preserve the host's down marker: discovery is not proof of
    /// liveness.
    fn host_found(&self, ip: IpAddr, row: &Row);

    /// A node is gone from the topology.
    fn host_lost(&self, ip: IpAddr);

    /// The server (or a failed probe) reported the node down.
    fn host_down(&self, ip: IpAddr);

    fn host(&self, ip: IpAddr) -> Option<Arc<Host>>;

    fn has_host(&self, ip: IpAddr) -> bool;

    /// Snapshot of all known hosts.
    fn each_host(&self) -> Vec<Arc<Host>>;
}

/// In-memory [`ClusterRegistry`].
#[derive(Debug, Default)]
pub struct ClusterHostRegistry {
    hosts: Mutex<HashMap<IpAddr, Arc<Host>>>,
}

impl ClusterHostRegistry {
    pub fn new() -> Self {
        ClusterHostRegistry::default()
    }

    pub fn len(&self) -> usize {
        self.hosts.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.lock().unwrap().is_empty()
    }
}

impl ClusterRegistry for ClusterHostRegistry {
    fn host_found(&self, ip: IpAddr, row: &Row) {
        let mut hosts = self.hosts.lock().unwrap();
        match hosts.get(&ip).cloned() {
            // Same row, same host instance; keeps redundant refreshes cheap
            // and event delivery idempotent.
            Some(existing) if existing.describes_row(row) => {}
            Some(existing) => {
                let replacement = Host::from_system_row(ip, row);
                if existing.is_down() {
                    replacement.mark_down();
                }
                debug!(host = %ip, "Host metadata changed");
                hosts.insert(ip, Arc::new(replacement));
            }
            None => {
                debug!(host = %ip, "Host found");
                hosts.insert(ip, Arc::new(Host::from_system_row(ip, row)));
            }
        }
    }

    fn host_lost(&self, ip: IpAddr) {
        if self.hosts.lock().unwrap().remove(&ip).is_some() {
            debug!(host = %ip, "Host lost");
        }
    }

    fn host_down(&self, ip: IpAddr) {
        if let Some(host) = self.hosts.lock().unwrap().get(&ip) {
            if host.is_up() {
                debug!(host = %ip, "Host is down");
                host.mark_down();
            }
        }
    }

    fn host(&self, ip: IpAddr) -> Option<Arc<Host>> {
        self.hosts.lock().unwrap().get(&ip).cloned()
    }

    fn has_host(&self, ip: IpAddr) -> bool {
        self.hosts.lock().unwrap().contains_key(&ip)
    }

    fn each_host(&self) -> Vec<Arc<Host>> {
        self.hosts.lock().unwrap().values().cloned().collect()
    }
}

//! Host ranking for connection plans.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::cluster::Host;
use crate::statement::Statement;

/// A one-shot ranked enumeration of candidate hosts.
///
/// The consumer walks the plan in order and never re-ranks it; ordering is
/// entirely the policy's business.
pub type Plan = Box<dyn Iterator<Item = Arc<Host>> + Send>;

/// Info about the request a plan is computed for.
///
/// Control connection plans carry no routing hints; the fields exist so that
/// data-plane policies can share the trait.
#[derive(Debug, Clone, Copy, Default)]
pub struct RoutingInfo<'a> {
    pub keyspace: Option<&'a str>,
    pub statement: Option<&'a Statement>,
}

/// Policy that decides which hosts to contact, and in what order.
pub trait LoadBalancingPolicy: Send + Sync + fmt::Debug {
    /// Returns a fresh plan for the given request.
    fn plan(&self, routing: &RoutingInfo<'_>) -> Plan;

    /// Returns the name of the load balancing policy.
    fn name(&self) -> String;
}

/// Hands out the host list rotated by one position per plan, so consecutive
/// connection attempts spread over the cluster.
#[derive(Debug, Default)]
pub struct RoundRobinPolicy {
    hosts: Mutex<Vec<Arc<Host>>>,
    index: AtomicUsize,
}

impl RoundRobinPolicy {
    pub fn new(hosts: Vec<Arc<Host>>) -> Self {
        RoundRobinPolicy {
            hosts: Mutex::new(hosts),
            index: AtomicUsize::new(0),
        }
    }

    /// Replaces the host set, e.g. after a topology refresh.
    pub fn update_hosts(&self, hosts: Vec<Arc<Host>>) {
        *self.hosts.lock().unwrap() = hosts;
    }
}

impl LoadBalancingPolicy for RoundRobinPolicy {
    fn plan(&self, _routing: &RoutingInfo<'_>) -> Plan {
        let mut hosts = self.hosts.lock().unwrap().clone();
        if hosts.is_empty() {
            return Box::new(std::iter::empty());
        }
        let index = self.index.fetch_add(1, Ordering::Relaxed) % hosts.len();
        hosts.rotate_left(index);
        Box::new(hosts.into_iter())
    }

    fn name(&self) -> String {
        "RoundRobinPolicy".to_string()
    }
}

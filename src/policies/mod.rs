//! Pluggable policies consumed by the control connection.

pub mod load_balancing;
pub mod reconnect;

pub use load_balancing::{LoadBalancingPolicy, Plan, RoundRobinPolicy, RoutingInfo};
pub use reconnect::{
    ConstantReconnectionPolicy, ExponentialReconnectionPolicy, ReconnectionPolicy,
    ReconnectionSchedule,
};

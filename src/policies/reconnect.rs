//! Backoff schedules for reconnection and reachability probing.

use std::fmt;
use std::time::Duration;

/// Produces one [`ReconnectionSchedule`] per retry series.
///
/// The control connection takes a fresh schedule when it starts reconnecting
/// and another one per down-host probe loop; each schedule advances its own
/// backoff independently.
pub trait ReconnectionPolicy: Send + Sync + fmt::Debug {
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule + Send>;
}

/// A stateful producer of backoff intervals. Every call to
/// [`next_duration`](ReconnectionSchedule::next_duration) advances the backoff.
pub trait ReconnectionSchedule {
    fn next_duration(&mut self) -> Duration;
}

/// The same interval forever.
#[derive(Debug, Clone)]
pub struct ConstantReconnectionPolicy {
    interval: Duration,
}

impl ConstantReconnectionPolicy {
    pub fn new(interval: Duration) -> Self {
        ConstantReconnectionPolicy { interval }
    }
}

impl ReconnectionPolicy for ConstantReconnectionPolicy {
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule + Send> {
        Box::new(ConstantSchedule {
            interval: self.interval,
        })
    }
}

struct ConstantSchedule {
    interval: Duration,
}

impl ReconnectionSchedule for ConstantSchedule {
    fn next_duration(&mut self) -> Duration {
        self.interval
    }
}

/// Doubling backoff starting at `base`, saturating at `max`.
#[derive(Debug, Clone)]
pub struct ExponentialReconnectionPolicy {
    base: Duration,
    max: Duration,
}

impl ExponentialReconnectionPolicy {
    pub fn new(base: Duration, max: Duration) -> Self {
        ExponentialReconnectionPolicy { base, max }
    }
}

impl ReconnectionPolicy for ExponentialReconnectionPolicy {
    fn new_schedule(&self) -> Box<dyn ReconnectionSchedule + Send> {
        Box::new(ExponentialSchedule {
            next: self.base.max(Duration::from_millis(1)),
            max: self.max,
        })
    }
}

struct ExponentialSchedule {
    next: Duration,
    max: Duration,
}

impl ReconnectionSchedule for ExponentialSchedule {
    fn next_duration(&mut self) -> Duration {
        let current = self.next.min(self.max);
        self.next = current.checked_mul(2).unwrap_or(self.max).min(self.max);
        current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_schedule_never_changes() {
        let policy = ConstantReconnectionPolicy::new(Duration::from_secs(2));
        let mut schedule = policy.new_schedule();
        for _ in 0..5 {
            assert_eq!(schedule.next_duration(), Duration::from_secs(2));
        }
    }

    #[test]
    fn exponential_schedule_doubles_and_saturates() {
        let policy =
            ExponentialReconnectionPolicy::new(Duration::from_secs(1), Duration::from_secs(8));
        let mut schedule = policy.new_schedule();
        let intervals: Vec<_> = (0..6).map(|_| schedule.next_duration().as_secs()).collect();
        assert_eq!(intervals, [1, 2, 4, 8, 8, 8]);
    }

    #[test]
    fn each_schedule_advances_independently() {
        let policy =
            ExponentialReconnectionPolicy::new(Duration::from_secs(1), Duration::from_secs(60));
        let mut first = policy.new_schedule();
        first.next_duration();
        first.next_duration();

        let mut second = policy.new_schedule();
        assert_eq!(second.next_duration(), Duration::from_secs(1));
        assert_eq!(first.next_duration(), Duration::from_secs(4));
    }

    #[test]
    fn zero_base_is_bumped_to_a_positive_interval() {
        let policy = ExponentialReconnectionPolicy::new(Duration::ZERO, Duration::from_secs(4));
        let mut schedule = policy.new_schedule();
        assert!(schedule.next_duration() > Duration::ZERO);
    }
}

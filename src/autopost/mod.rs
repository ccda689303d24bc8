//! Continuous auto-posting: per-setup posting loops and their supervisor.

pub mod runner;
pub mod supervisor;

use rand::Rng;
use std::fmt;
use std::time::Duration;

pub use supervisor::Supervisor;

/// Identity of one running posting loop: `(user id, setup name)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TaskKey {
    pub user_id: String,
    pub setup_name: String,
}

impl TaskKey {
    pub fn new(user_id: impl Into<String>, setup_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            setup_name: setup_name.into(),
        }
    }
}

impl fmt::Display for TaskKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.setup_name)
    }
}

/// Wait before the next posting cycle: `interval` minutes converted to
/// seconds plus a uniform random 0..=`random_interval` minutes in seconds.
pub(crate) fn cycle_wait(interval_min: f64, random_interval_min: f64) -> Duration {
    let base = (interval_min * 60.0) as u64;
    let jitter_bound = (random_interval_min * 60.0) as u64;
    let extra = rand::thread_rng().gen_range(0..=jitter_bound);
    Duration::from_secs(base + extra)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_jitter_is_exact() {
        for _ in 0..50 {
            assert_eq!(cycle_wait(0.1, 0.0), Duration::from_secs(6));
        }
    }

    #[test]
    fn task_key_display() {
        let key = TaskKey::new("42", "daily");
        assert_eq!(key.to_string(), "42/daily");
    }

    proptest! {
        #[test]
        fn wait_stays_within_bounds(
            interval in 0.01f64..120.0,
            random_interval in 0.0f64..60.0,
        ) {
            let base = (interval * 60.0) as u64;
            let jitter = (random_interval * 60.0) as u64;
            let wait = cycle_wait(interval, random_interval).as_secs();
            prop_assert!(wait >= base);
            prop_assert!(wait <= base + jitter);
        }
    }
}

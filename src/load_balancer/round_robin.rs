//! Round-robin load balancing strategy.

use std::sync::atomic::{AtomicUsize, Ordering};

use crate::load_balancer::{LoadBalancer, Target, TargetSet};

/// Round-robin selector.
/// Owns the target set and an index that always stays in `[0, len)`.
#[derive(Debug)]
pub struct RoundRobin {
    targets: TargetSet,
    index: AtomicUsize,
}

impl RoundRobin {
    pub fn new(targets: TargetSet) -> Self {
        Self {
            targets,
            index: AtomicUsize::new(0),
        }
    }

    /// Claim the next slot of the cycle and return its target.
    pub fn next(&self) -> &Target {
        let len = self.targets.len();
        // The closure never returns None, so both arms carry the previous index.
        let slot = match self
            .index
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |i| Some((i + 1) % len))
        {
            Ok(prev) | Err(prev) => prev,
        };
        &self.targets[slot]
    }
}

impl LoadBalancer for RoundRobin {
    fn next_target(&self) -> &Target {
        self.next()
    }
}

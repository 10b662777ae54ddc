//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Configured URL strings
//!     → target.rs (parse, validate scheme, freeze as TargetSet)
//!     → round_robin.rs (rotate through targets, one slot per request)
//!     → Return the chosen Target to the HTTP layer
//! ```
//!
//! # Design Decisions
//! - Targets are static for the lifetime of the process
//! - No health awareness: every target is always eligible
//! - Selection never holds a lock across network I/O

pub mod round_robin;
pub mod target;

pub use round_robin::RoundRobin;
pub use target::{Target, TargetError, TargetSet};

/// Strategy for choosing the target of the next request.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    /// Pick the target for one request.
    fn next_target(&self) -> &Target;
}

//! Inbound protections applied before a target is chosen.
//!
//! ```text
//! Incoming request
//!     → rate_limit.rs (per-IP token bucket, 429 when empty)
//!     → forwarding
//! ```
//!
//! Disabled unless `rate_limit.enabled` is set.

pub mod rate_limit;

pub use rate_limit::{rate_limit_middleware, RateLimiterState};

//! Network plumbing shared by the HTTP layer.
//!
//! - `tls.rs` loads the inbound certificate and key
//! - `session.rs` counts live WebSocket relay sessions

pub mod session;
pub mod tls;

pub use session::{SessionGuard, SessionId, SessionTracker};

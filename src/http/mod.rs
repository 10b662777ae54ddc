//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, middleware, target selection)
//!     → classify.rs (plain request or WebSocket upgrade)
//!     → forward.rs (mirror request, stream response back)
//!       or websocket.rs (upgrade, probe, dial, relay frames)
//! ```

pub mod classify;
pub mod client;
pub mod error;
pub mod forward;
pub mod server;
pub mod websocket;

pub use classify::{classify, RequestKind};
pub use error::{ForwardError, RelayError};
pub use server::{AppState, HttpServer, ServerError};

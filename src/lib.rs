//! Round-robin reverse proxy.
//!
//! Every inbound request, plain HTTP or WebSocket upgrade, is sent to the
//! next backend in a fixed list. Plain requests are mirrored and their
//! responses streamed back. WebSocket sessions are relayed frame by frame.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod net;
pub mod observability;
pub mod security;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::{RoundRobin, Target, TargetSet};

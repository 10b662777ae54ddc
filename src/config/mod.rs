//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML) + targets file (JSON)
//!     → loader.rs (parse & deserialize)
//!     → command-line overrides (main.rs)
//!     → validation.rs (semantic checks)
//!     → ProxyConfig (validated, immutable)
//!     → passed by value/reference to the subsystems that need it
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require a restart
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod templates;
pub mod validation;

pub use schema::ProxyConfig;
pub use schema::{
    ListenerConfig, ListenerTls, LogFormat, LogOutput, TracingMode, UpstreamConfig, UpstreamTls,
};

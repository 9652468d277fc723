//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → TypepathConfig { server, client } (validated, immutable)
//!     → ServerConfig to listen/HttpServer, ClientConfig to Client
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded and passed explicitly, never global
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ClientConfig, LimitsConfig, ListenerConfig, ObservabilityConfig, ServerConfig, TimeoutConfig,
    TypepathConfig,
};
pub use validation::{validate_config, validate_server, ConfigIssue};

//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Dispatcher, router, server produce:
//!     → tracing events with structured fields (request_id, method, path, route, status)
//!     → logging.rs (subscriber + env filter)
//!     → metrics.rs (counters, histograms)
//!
//! Consumers:
//!     → stdout
//!     → Metrics endpoint (Prometheus scrape), when enabled
//! ```
//!
//! # Design Decisions
//! - The library only emits; binaries decide whether to install subscribers
//! - Request ID flows through every log line of a request

pub mod logging;
pub mod metrics;

pub use logging::init_logging;
pub use metrics::{init_metrics, record_request};

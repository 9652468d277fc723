//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, middleware stack)
//!     → request.rs (request id)
//!     → dispatch.rs (route lookup → body decode → validation → guards → handler)
//!     → Reply serialized (JSON / enriched JSON / octet-stream / passthrough)
//!     → Send to client
//! ```

pub mod dispatch;
pub mod request;
pub mod server;

pub use dispatch::{parse_query, CallOptions, Dispatcher, BODY_REQUIRED};
pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use server::{listen, HttpServer, ServerError, ServerHandle};

//! Typepath: a trie-based HTTP router with a symmetric client.

pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod schema;

pub use client::{Client, ClientError};
pub use codec::{RawBody, RichValue};
pub use config::{ClientConfig, ServerConfig};
pub use error::{status, BuildError, RouteError};
pub use handler::{inject, Context, Guard, IntoReply, Json, Reply};
pub use http::{listen, CallOptions, HttpServer, ServerHandle};
pub use lifecycle::Shutdown;
pub use routing::{any, delete, get, head, options, patch, post, put, Method, RouteDef, RouteTable, Router};

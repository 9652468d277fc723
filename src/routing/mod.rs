//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Compilation (at construction):
//!     RouteTable (template → [RouteDef])
//!     → trie.rs (split templates, one trie per method, guards applied)
//!     → Freeze as immutable Router
//!
//! Incoming Request (method, path):
//!     → router.rs (pick the method's trie, 404/405 decisions)
//!     → matcher.rs (static → param → catch-all, with backtracking)
//!     → Return: Match (endpoint + raw captures) or RouteError
//! ```
//!
//! # Design Decisions
//! - Routes compiled once, immutable at runtime
//! - No regex: segment tries only
//! - Deterministic: same input always matches same route

pub mod matcher;
pub mod method;
pub mod route;
pub mod router;
pub mod trie;

pub use matcher::Match;
pub use method::Method;
pub use route::{any, delete, get, head, options, patch, post, put, MethodSpec, RouteDef, RouteTable};
pub use router::Router;
pub use trie::{Endpoint, Parsers};

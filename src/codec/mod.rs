//! Wire encoding shared by the dispatcher and the client.
//!
//! # Data Flow
//! ```text
//! Inbound:  Content-Type + bytes → content.rs → RawBody (Json | Text | Binary | Empty)
//! Outbound: Reply / client body  → content.rs → (Content-Type, bytes)
//! Values:   RichValue ⇄ enriched.rs ⇄ {"json": .., "meta": {"values": ..}}
//! ```
//!
//! # Design Decisions
//! - One classification table used by both sides so requests and responses agree
//! - Media types compared on their essence, parameters ignored
//! - The enriched codec is opt-in per request via the `x-superjson` header

pub mod content;
pub mod enriched;

pub use content::{
    essence, is_enriched, OutgoingBody, RawBody, APPLICATION_JSON, ENRICHED_HEADER,
    FORM_URLENCODED, OCTET_STREAM, TEXT_PLAIN,
};
pub use enriched::{EnrichedError, RichValue};

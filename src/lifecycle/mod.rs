//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! listen():
//!     Bind listener → subscribe to Shutdown → spawn server task → ServerHandle
//!
//! ServerHandle::close() / Ctrl+C (binary):
//!     Shutdown::trigger → stop accepting → in-flight requests finish → task exits
//! ```
//!
//! # Design Decisions
//! - Subscribe before serving so a signal is never missed
//! - Closing never interrupts in-flight requests

pub mod shutdown;

pub use shutdown::{on_ctrl_c, Shutdown};

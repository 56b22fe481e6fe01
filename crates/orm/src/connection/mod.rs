//! Connection Management
//!
//! Configuration, per-site connections with read/write routing, and the
//! manager that caches them.

pub mod config;
pub mod core;
pub mod manager;

pub use config::*;
pub use core::{AccessKind, Connection};
pub use manager::{ConnectionKey, ConnectionManager};

//! Database Backend Abstractions
//!
//! Driver traits shared by every backend plus the sqlx-powered MySQL driver.

pub mod core;
pub mod mysql;

pub use core::*;
pub use mysql::{MySqlDriver, MySqlDriverFactory};

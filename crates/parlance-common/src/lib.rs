//! # Parlance Common
//!
//! Shared error types, logging setup and utilities for Parlance.
//!
//! This crate provides the foundational pieces used across all other crates
//! in the Parlance workspace.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod logging;
pub mod utils;

#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use error::{ParlanceError, Result};
pub use logging::{init_logging, LogFormat, LoggingOptions};
pub use utils::*;

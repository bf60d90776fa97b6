//! # Parlance Config
//!
//! Typed configuration for the Parlance localization service.
//!
//! Configuration is read from YAML, overlaid with `PARLANCE_*` environment
//! variables and validated before use.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod defaults;
pub mod loader;
pub mod schema;
pub mod validator;

pub use loader::*;
pub use schema::*;
pub use validator::*;

//! Operator command line for Parlance.
//!
//! The binary is a thin shell over [`run`] so the subcommands can be driven
//! from tests with an in-memory writer.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod commands;

pub use cli::{Cli, Command};
pub use commands::{load_config, parse_template_data, run};

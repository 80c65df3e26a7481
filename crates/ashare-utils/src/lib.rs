//! Shared utilities for the ashare workspace
//!
//! Logging setup and small environment helpers used by the analyst library
//! and the command-line front end.

pub mod env;
pub mod logging;

pub use env::{env_flag, env_string};
pub use logging::{LogFormat, init_tracing, init_tracing_with};

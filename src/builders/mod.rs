//! Builders
//!
//! Fluent construction of validated configuration.

pub mod config;

pub use config::*;

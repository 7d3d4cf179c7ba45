//! Command implementations for the CLI
//!
//! - start: Run the service
//! - test: Check configuration and storage
//! - config: Configuration display and validation

pub mod config;
pub mod start;

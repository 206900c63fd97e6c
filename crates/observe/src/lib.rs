//! Logging initialisation shared by the binaries and the tests.
pub mod config;
pub mod tracing;

pub use config::Config;

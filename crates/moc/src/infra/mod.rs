pub mod cli;
pub mod config;
pub mod contracts;
pub mod protocol;
pub mod submitter;

pub use {config::Config, contracts::ContractSet};

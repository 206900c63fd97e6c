pub mod domain;
pub mod infra;
pub mod report;
mod run;

pub use {domain::Error, run::{run, start}};

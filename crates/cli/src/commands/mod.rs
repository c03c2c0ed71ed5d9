//! Command implementations for wakemonctl

pub mod config;
pub mod run;

pub use run::RunArgs;

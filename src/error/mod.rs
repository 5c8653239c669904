//! Error handling module
//!
//! Defines the error taxonomy for settings validation and topology
//! resolution, with exit codes for the command-line front end

pub mod types;

pub use types::*;

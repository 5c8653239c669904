//! Command-line interface module
//!
//! Handles argument parsing for the `smash-config` binary

pub mod args;

pub use args::*;

//! irlgraph CLI library.
//!
//! Argument groups, configuration loading, subcommand handlers and output
//! formatting for the `irlgraph` binary.

pub mod args;
pub mod commands;
pub mod config;
pub mod output;
pub mod terminal;

//! CLI module for postrank - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for rating posts,
//! previewing the scoring prompt, and inspecting configuration.

pub mod commands;

pub use commands::Cli;

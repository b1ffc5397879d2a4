//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - rate: score posts read as JSON lines
//! - prompt: show the prompt the first batch would be sent with
//! - config: print the effective configuration

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Postrank - thoughtfulness ratings for social-media posts
#[derive(Parser, Debug)]
#[command(name = "postrank")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Rate posts given as JSON lines ({"id": "...", "text": "..."})
    Rate {
        /// Input file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Use a local mock provider instead of calling the API
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the prompt the first batch would be sent with
    Prompt {
        /// Input file; reads stdin when omitted
        #[arg(short, long)]
        input: Option<PathBuf>,
    },

    /// Show the effective configuration (API key masked)
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["postrank"]).is_err());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["postrank", "-v", "config"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["postrank", "-c", "/path/to/postrank.yml", "config"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/postrank.yml")));
    }

    #[test]
    fn test_rate_command_defaults() {
        let cli = Cli::try_parse_from(["postrank", "rate"]).unwrap();
        match cli.command {
            Commands::Rate { input, dry_run } => {
                assert!(input.is_none());
                assert!(!dry_run);
            }
            _ => panic!("Expected rate command"),
        }
    }

    #[test]
    fn test_rate_command_with_input_and_dry_run() {
        let cli = Cli::try_parse_from(["postrank", "rate", "-i", "posts.jsonl", "--dry-run"]).unwrap();
        match cli.command {
            Commands::Rate { input, dry_run } => {
                assert_eq!(input, Some(PathBuf::from("posts.jsonl")));
                assert!(dry_run);
            }
            _ => panic!("Expected rate command"),
        }
    }

    #[test]
    fn test_prompt_command() {
        let cli = Cli::try_parse_from(["postrank", "prompt", "--input", "posts.jsonl"]).unwrap();
        match cli.command {
            Commands::Prompt { input } => assert_eq!(input, Some(PathBuf::from("posts.jsonl"))),
            _ => panic!("Expected prompt command"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["postrank", "config", "--verbose"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Config));
    }

    #[test]
    fn test_help_works() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["postrank", "--version"]);
        assert!(result.is_err());
    }
}

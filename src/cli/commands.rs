//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - serve: start the web UI (default)
//! - run: execute one draft/critique run in the terminal

use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Draftgate - draft, review, revise with two LLM agents
#[derive(Parser, Debug)]
#[command(name = "draftgate")]
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
    pub command: Option<Commands>,
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
    /// Serve the web UI
    Serve {
        /// Address to bind, overrides the config file
        #[arg(short, long)]
        bind: Option<SocketAddr>,
    },

    /// Run the loop once for a task and print the result
    Run {
        /// Task description
        task: String,

        /// Write the final report to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args should result in None command (serve mode)
        let cli = Cli::try_parse_from(["draftgate"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["draftgate", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["draftgate", "-c", "/path/to/draftgate.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/draftgate.yml")));
    }

    #[test]
    fn test_serve_with_bind() {
        let cli = Cli::try_parse_from(["draftgate", "serve", "--bind", "0.0.0.0:9000"]).unwrap();
        match cli.command {
            Some(Commands::Serve { bind }) => {
                assert_eq!(bind, Some("0.0.0.0:9000".parse().unwrap()));
            }
            _ => panic!("Expected serve command"),
        }
    }

    #[test]
    fn test_serve_rejects_bad_address() {
        assert!(Cli::try_parse_from(["draftgate", "serve", "--bind", "not-an-addr"]).is_err());
    }

    #[test]
    fn test_run_with_output() {
        let cli = Cli::try_parse_from([
            "draftgate",
            "run",
            "Analyze 2026 cybersecurity risks for Fintech",
            "-o",
            "report.md",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Run { task, output }) => {
                assert_eq!(task, "Analyze 2026 cybersecurity risks for Fintech");
                assert_eq!(output, Some(PathBuf::from("report.md")));
            }
            _ => panic!("Expected run command"),
        }
    }

    #[test]
    fn test_run_requires_task() {
        assert!(Cli::try_parse_from(["draftgate", "run"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["draftgate", "run", "t", "--verbose"]).unwrap();
        assert!(cli.verbose);
    }

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }
}

//! CLI command definitions for the `factsink` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod memory;
pub mod process;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::state::BackendOptions;

/// Extract durable user facts from conversation transcripts.
#[derive(Parser)]
#[command(name = "factsink", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Detailed output (-v for debug, -vv for trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// TOML config file (defaults to $FACTSINK_CONFIG).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Read payloads from <DIR>/<bucket>/<key> instead of S3.
    #[arg(long, global = true, value_name = "DIR")]
    pub local_root: Option<PathBuf>,

    /// Store records in a local SQLite file instead of AgentCore Memory.
    #[arg(long, global = true, value_name = "PATH")]
    pub sqlite: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub fn backend_options(&self) -> BackendOptions {
        BackendOptions {
            local_root: self.local_root.clone(),
            sqlite: self.sqlite.clone(),
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as a Lambda custom runtime (reads AWS_LAMBDA_RUNTIME_API).
    Lambda,

    /// Serve the SNS HTTP(S) subscription endpoint.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Process one event file: a Lambda SNS event, an SNS message or a bare
    /// delivery notification. Use `-` for stdin.
    Process {
        /// Event file path, or `-`.
        input: String,
    },

    /// Inspect or write memory records.
    Memory {
        #[command(subcommand)]
        action: memory::MemoryCommand,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "factsink",
            "process",
            "event.json",
            "--local-root",
            "/tmp/payloads",
            "--sqlite",
            "/tmp/m.db",
            "--json",
            "-vv",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        let options = cli.backend_options();
        assert_eq!(options.local_root, Some(PathBuf::from("/tmp/payloads")));
        assert_eq!(options.sqlite, Some(PathBuf::from("/tmp/m.db")));
        assert!(matches!(cli.command, Commands::Process { ref input } if input == "event.json"));
    }

    #[test]
    fn test_memory_list_defaults() {
        let cli = Cli::try_parse_from(["factsink", "memory", "list"]).unwrap();
        match cli.command {
            Commands::Memory {
                action: memory::MemoryCommand::List { namespace, limit },
            } => {
                assert_eq!(namespace, "/");
                assert_eq!(limit, 20);
            }
            _ => panic!("expected memory list"),
        }
    }

    #[test]
    fn test_serve_defaults() {
        let cli = Cli::try_parse_from(["factsink", "serve", "--port", "9000"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Serve { port: 9000, ref host } if host == "127.0.0.1"
        ));
    }
}

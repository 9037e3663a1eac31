//! CLI argument definitions for Brief.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("BRIEF_GIT_COMMIT"),
    ", built ",
    env!("BRIEF_BUILD_TIMESTAMP"),
    ")"
);

/// Brief - Upload, analyze and question legal documents.
///
/// Run without a subcommand to open the terminal UI.
#[derive(Parser, Debug)]
#[command(name = "brief")]
#[command(author, version, long_version = LONG_VERSION, about = "A terminal client for the Legal Document AI Assistant", long_about = None)]
pub struct Cli {
    /// Output in human-readable format instead of JSON
    #[arg(short = 'H', long = "human", global = true)]
    pub human_readable: bool,

    /// Backend origin (overrides BRIEF_BACKEND_URL and config.kdl)
    #[arg(long = "backend-url", global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive terminal UI (default)
    Tui,

    /// List uploaded documents
    List {
        /// Only show documents whose filename contains this text
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Show one document, including any cached analysis
    Show {
        /// Document ID
        id: String,
    },

    /// Upload a document (.pdf, .doc, .docx, .txt)
    Upload {
        /// Path to the file
        path: PathBuf,
    },

    /// Run AI analysis on a document
    ///
    /// Uses the cached analysis when the document is already completed,
    /// unless --force is given.
    Analyze {
        /// Document ID
        id: String,

        /// Re-run analysis even if a cached result exists
        #[arg(long)]
        force: bool,
    },

    /// Ask a question about a document
    Ask {
        /// Document ID
        id: String,
        /// The question, sent as typed
        question: String,
    },

    /// Show the question/answer history of a document
    Chat {
        /// Document ID
        id: String,
    },

    /// Delete one or more documents
    Delete {
        /// Document IDs
        #[arg(required = true)]
        ids: Vec<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Configuration commands
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show resolved configuration values and where they came from
    Show,

    /// Set a value in config.kdl
    Set {
        /// Configuration key (backend-url, settle-delay-ms, request-timeout-secs, log-level)
        key: String,
        /// Configuration value
        value: String,
    },
}

impl Cli {
    /// Whether this invocation runs the terminal UI.
    pub fn is_tui(&self) -> bool {
        matches!(self.command, None | Some(Commands::Tui))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_tui() {
        let cli = Cli::parse_from(["brief"]);
        assert!(cli.is_tui());
        let cli = Cli::parse_from(["brief", "-v", "tui"]);
        assert!(cli.is_tui());
        assert!(cli.verbose);
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::parse_from(["brief", "list", "-H", "--backend-url", "http://x:1"]);
        assert!(cli.human_readable);
        assert_eq!(cli.backend_url.as_deref(), Some("http://x:1"));
        assert!(matches!(cli.command, Some(Commands::List { search: None })));
    }

    #[test]
    fn test_delete_requires_ids() {
        assert!(Cli::try_parse_from(["brief", "delete"]).is_err());
        let cli = Cli::parse_from(["brief", "delete", "a", "b", "--yes"]);
        match cli.command {
            Some(Commands::Delete { ids, yes }) => {
                assert_eq!(ids, ["a", "b"]);
                assert!(yes);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_ask_keeps_question_verbatim() {
        let cli = Cli::parse_from(["brief", "ask", "doc-1", "  What is the term?  "]);
        match cli.command {
            Some(Commands::Ask { question, .. }) => assert_eq!(question, "  What is the term?  "),
            other => panic!("unexpected {other:?}"),
        }
    }
}

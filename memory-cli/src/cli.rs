//! CLI parser.

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "cmem")]
#[command(about = "Conversation memory CLI: chat, retrieve, summarize, delete", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Interactive chat; turns are buffered and written when the session ends.
    Chat {
        /// User id (generated when omitted).
        #[arg(short, long)]
        user: Option<String>,
        /// Thread id (generated when omitted).
        #[arg(short, long)]
        thread: Option<String>,
        /// Buffered turns sent as context with each message.
        #[arg(long, default_value = "20")]
        history: usize,
    },
    /// Most recent turns of a user and/or thread, newest first.
    Recent {
        #[arg(short, long, default_value = "10")]
        k: usize,
        #[arg(short, long)]
        user: Option<String>,
        #[arg(short, long)]
        thread: Option<String>,
        #[arg(long)]
        details: bool,
    },
    /// Semantic search over stored turns.
    Search {
        query: String,
        #[arg(short, long, default_value = "5")]
        k: usize,
        #[arg(short, long)]
        user: Option<String>,
        #[arg(short, long)]
        thread: Option<String>,
        #[arg(long)]
        details: bool,
        #[arg(long)]
        score: bool,
    },
    /// All turns of a thread, oldest first.
    Thread {
        id: String,
        #[arg(long)]
        details: bool,
    },
    /// All turns of a user, oldest first.
    User {
        id: String,
        #[arg(long)]
        details: bool,
    },
    /// One stored document by id.
    Get { id: String },
    /// Latest stored summary of a thread.
    Summary {
        thread: String,
        #[arg(long)]
        details: bool,
    },
    /// Summarize a stored thread with the LLM.
    Summarize {
        thread: String,
        /// Embed and store the summary.
        #[arg(long)]
        write: bool,
    },
    /// Delete one stored document by id.
    Delete { id: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_chat_defaults() {
        let cli = Cli::try_parse_from(["cmem", "chat", "-u", "u1"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Chat {
                user: Some("u1".to_string()),
                thread: None,
                history: 20
            }
        );
    }

    #[test]
    fn test_parse_search_flags() {
        let cli = Cli::try_parse_from([
            "cmem", "search", "rust lifetimes", "-k", "3", "-t", "t1", "--score",
        ])
        .unwrap();
        assert_eq!(
            cli.command,
            Commands::Search {
                query: "rust lifetimes".to_string(),
                k: 3,
                user: None,
                thread: Some("t1".to_string()),
                details: false,
                score: true,
            }
        );
    }

    #[test]
    fn test_parse_summarize_write() {
        let cli = Cli::try_parse_from(["cmem", "summarize", "t1", "--write"]).unwrap();
        assert_eq!(
            cli.command,
            Commands::Summarize {
                thread: "t1".to_string(),
                write: true
            }
        );
    }

    #[test]
    fn test_missing_argument_is_rejected() {
        assert!(Cli::try_parse_from(["cmem", "get"]).is_err());
    }
}

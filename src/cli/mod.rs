//! CLI for the `folio-update` binary.
//!
//! Uses clap for argument parsing and owo-colors for colored terminal
//! output.

pub mod output;

use clap::Parser;
use std::path::PathBuf;

/// folio-update - rebuild the portfolio knowledge base
///
/// Processes the configured resources (resume, profiles, project pages),
/// chunks and embeds them, and updates the vector database the chat
/// assistant retrieves from.
#[derive(Parser, Debug)]
#[command(
    name = "folio-update",
    version,
    about = "Update the portfolio RAG vector database",
    after_help = "EXAMPLES:\n    \
                  folio-update                      # Incremental update\n    \
                  folio-update --force              # Drop and rebuild the collection\n    \
                  folio-update --stats              # Show database stats after the run\n    \
                  folio-update --resources-dir ./r  # Use a custom resources directory"
)]
pub struct Cli {
    /// Drop and recreate the collection before processing
    #[arg(short, long)]
    pub force: bool,

    /// Enable verbose (debug) logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Print database statistics after the update
    #[arg(short, long)]
    pub stats: bool,

    /// Directory containing resources.yaml and resource files
    #[arg(long, default_value = "resources")]
    pub resources_dir: PathBuf,

    /// Vector database directory
    #[arg(long, default_value = "./vector_db")]
    pub db_path: PathBuf,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["folio-update"]);
        assert!(!cli.force);
        assert!(!cli.verbose);
        assert!(!cli.stats);
        assert_eq!(cli.resources_dir, PathBuf::from("resources"));
        assert_eq!(cli.db_path, PathBuf::from("./vector_db"));
    }

    #[test]
    fn test_all_flags() {
        let cli = Cli::parse_from([
            "folio-update",
            "--force",
            "--verbose",
            "--stats",
            "--resources-dir",
            "/tmp/resources",
            "--db-path",
            "/tmp/db",
            "--no-color",
        ]);
        assert!(cli.force && cli.verbose && cli.stats && cli.no_color);
        assert_eq!(cli.resources_dir, PathBuf::from("/tmp/resources"));
        assert_eq!(cli.db_path, PathBuf::from("/tmp/db"));
    }
}

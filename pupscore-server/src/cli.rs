use clap::{Parser, Subcommand};
use std::path::PathBuf;

const HELP_EPILOG: &str = r#"Server options can also be provided via environment variables:
  CONFIG_PATH (default: ./config.yaml)
  DB_PATH     (default: data/app.db)
  PORT        (default: 5252 or config.listen_port)

The `stats` command prints one user's achievements, challenges and totals
as JSON, read straight from the database.
"#;

#[derive(Debug, Parser)]
#[command(
    name = "pupscore-server",
    version,
    about = "PupScore progress server",
    long_about = None,
    after_long_help = HELP_EPILOG,
)]
pub struct Cli {
    /// Optional subcommand. Without one, runs the server.
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print a user's profile (achievements, challenges, stats) as JSON
    Stats {
        /// User whose progress to read
        #[arg(long)]
        user: String,
        /// Database path (overrides DB_PATH)
        #[arg(long)]
        db_path: Option<PathBuf>,
        /// Print only the aggregated totals
        #[arg(long)]
        summary: bool,
    },
}

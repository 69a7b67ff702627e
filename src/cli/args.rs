use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::common::config::CONFIG_ENV;

/// filepurge: rule-driven file expiration
#[derive(Parser, Debug)]
#[command(
    name = "filepurge",
    version,
    about = "Remove files older than a given age, empty directories and expired cache entries",
    long_about = "filepurge walks the directories named by each configured rule set and deletes\n\
                  files past their age threshold, optionally removing directories left empty.\n\
                  It can also purge expired entries from a file-based cache store.",
    after_help = "EXAMPLES:\n  \
        filepurge files                          Purge every configured rule set\n  \
        filepurge files --rule-set logs -y       Purge one rule set without asking\n  \
        filepurge files --dry-run --debug        Show what would be removed\n  \
        filepurge cache --path ./cache/data      Purge expired cache files\n  \
        filepurge config init                    Write a starter config file\n  \
        filepurge completions zsh                Generate shell completions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ~/.filepurge/config.toml)
    #[arg(long, global = true, value_name = "FILE", env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Also write logs to a daily-rotated file in this directory
    #[arg(long, global = true, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Remove old files according to configured rule sets
    Files {
        /// Rule set to purge (repeatable; default: all configured)
        #[arg(long = "rule-set", value_name = "NAME")]
        rule_sets: Vec<String>,

        /// Show which files/directories would be removed, delete nothing
        #[arg(long)]
        dry_run: bool,

        /// Print every candidate
        #[arg(long)]
        debug: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Remove expired cache files
    Cache {
        /// Cache directory (overrides [cache].path)
        #[arg(long, value_name = "DIR")]
        path: Option<PathBuf>,

        /// Show which cache files would be removed, delete nothing
        #[arg(long)]
        dry_run: bool,

        /// Print every cache file
        #[arg(long)]
        debug: bool,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the effective configuration
    Show,

    /// Print the config file location
    Path,

    /// Write a starter config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_repeated_rule_sets() {
        let cli = Cli::parse_from([
            "filepurge", "files", "--rule-set", "logs", "--rule-set", "tmp", "--dry-run",
        ]);
        match cli.command {
            Commands::Files {
                rule_sets, dry_run, ..
            } => {
                assert_eq!(rule_sets, vec!["logs", "tmp"]);
                assert!(dry_run);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}

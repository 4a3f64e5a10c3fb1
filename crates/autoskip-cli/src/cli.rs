//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// autoskip - inspect and maintain skip settings and override files
#[derive(Parser, Debug)]
#[command(name = "autoskip")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file or directory (AUTOSKIP_CONFIG takes precedence when set)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Show effective settings and discovered override files
    Show {
        /// Output as JSON for scripting
        #[arg(long)]
        json: bool,
    },

    /// Resolve one override section for an item
    ///
    /// Examples:
    ///   autoskip resolve 101 --section offsets --snapshot library.json
    ///   autoskip resolve 101 --section markers --chain 101,200,300,global
    Resolve {
        /// Item key (rating key or GUID); ignored with --chain
        item: String,

        /// Section to resolve: markers, offsets, allowed, blocked or clients
        #[arg(short, long)]
        section: String,

        /// Library snapshot used to build the scope chain
        #[arg(long, conflicts_with = "chain", required_unless_present = "chain")]
        snapshot: Option<PathBuf>,

        /// Explicit scope chain, most specific first
        #[arg(long, value_delimiter = ',')]
        chain: Option<Vec<String>>,
    },

    /// Rewrite every override file into another key namespace
    Convert {
        /// Namespace to convert to
        #[arg(long, value_enum)]
        to: Target,

        /// Library snapshot providing the rating key <-> GUID table
        #[arg(long)]
        snapshot: PathBuf,
    },
}

/// Key namespaces an override file can be converted to
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Guids,
    RatingKeys,
}

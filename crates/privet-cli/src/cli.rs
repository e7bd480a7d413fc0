//! CLI argument parsing and command definitions.
//!
//! Global flags (configuration, verbosity) plus the access-list commands
//! an operator runs against the metadata and catalog files.

use clap::{Parser, Subcommand};

// ============================================================================
// CLI argument types
// ============================================================================

/// Top-level CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "privet", author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to configuration file.
    #[arg(short, long, env = "PRIVET_CONFIG")]
    pub config: Option<String>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-essential output.
    #[arg(short, long)]
    pub quiet: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show an item's access list.
    Show {
        /// Item id.
        item: String,
    },

    /// Save an item's access list through the editor path.
    ///
    /// With no --viewer the list is cleared and the item becomes public.
    Save {
        /// Item id.
        item: String,

        /// Viewer id to allow (repeatable).
        #[arg(long = "viewer", value_name = "ID")]
        viewers: Vec<String>,

        /// Verification token (minted from the configured secret if omitted).
        #[arg(long)]
        token: Option<String>,
    },

    /// Mint a verification token for an item.
    Token {
        /// Item id.
        item: String,
    },

    /// Check whether a viewer may see an item.
    Check {
        /// Item id.
        item: String,

        /// Viewer id (anonymous if omitted).
        #[arg(long)]
        viewer: Option<String>,
    },

    /// Run a catalog listing as a viewer would see it.
    List(ListArgs),

    /// Filter related-item candidates for a source item.
    Related {
        /// Item the recommendations are for.
        item: String,

        /// Candidate item ids, in recommender order.
        #[arg(required = true)]
        candidates: Vec<String>,
    },

    /// Print version information.
    Version,

    /// Configuration operations.
    Config(ConfigCommand),
}

/// Arguments for `privet list`.
#[derive(Parser, Debug, Clone)]
pub struct ListArgs {
    /// Viewer id (anonymous if omitted).
    #[arg(long)]
    pub viewer: Option<String>,

    /// Post type to list.
    #[arg(long, default_value = "product")]
    pub post_type: String,

    /// Category slug to list.
    #[arg(long)]
    pub category: Option<String>,

    /// 1-based page number.
    #[arg(long, default_value_t = 1)]
    pub page: usize,

    /// Page size (all results if omitted).
    #[arg(long)]
    pub per_page: Option<usize>,

    /// List as a back-office request (no filtering).
    #[arg(long)]
    pub admin: bool,
}

/// Config-specific subcommands.
#[derive(Parser, Debug)]
pub struct ConfigCommand {
    /// Config subcommand to execute.
    #[command(subcommand)]
    pub command: ConfigAction,
}

/// Available config subcommands.
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show the resolved config file path.
    Path,

    /// Get a configuration value by dotted key.
    Get {
        /// Dotted key (e.g., "access.meta_key").
        key: String,
    },

    /// Set a configuration value by dotted key.
    Set {
        /// Dotted key (e.g., "access.meta_key").
        key: String,

        /// Value to set.
        value: String,
    },

    /// Create a default configuration file.
    Init {
        /// Output file path (defaults to XDG config path).
        #[arg(short, long)]
        file: Option<String>,

        /// Overwrite existing file.
        #[arg(long)]
        force: bool,
    },

    /// Export configuration as environment variables.
    Export {
        /// Format as Docker --env flags.
        #[arg(long)]
        docker_env: bool,
    },
}

// ============================================================================
// Tests
// ============================================================================

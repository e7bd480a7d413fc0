//! The `privet` application.
//!
//! [`PrivetCli`] owns the loaded configuration, sets up logging, and routes
//! parsed commands to their handlers.

use crate::cli::{CliArgs, Command};
use crate::config::PrivetConfig;
use crate::{acl_handlers, config_handlers};
use privet_acl::SaveOutcome;
use privet_core::{AppState, Error, Result};
use tracing_subscriber::EnvFilter;

// ============================================================================
// PrivetCli
// ============================================================================

/// The command-line application.
pub struct PrivetCli {
    name: String,
    state: AppState<PrivetConfig>,
    version: String,
}

impl PrivetCli {
    /// Create from CLI args, loading config from file/env.
    pub fn from_args(name: impl Into<String>, args: &CliArgs) -> Result<Self> {
        let config = PrivetConfig::load(args.config.as_deref())?;
        Ok(Self::new(name, config))
    }

    /// Create an application around an already loaded config.
    pub fn new(name: impl Into<String>, config: PrivetConfig) -> Self {
        Self {
            name: name.into(),
            state: AppState::new(config),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Override the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// The loaded configuration.
    pub fn config(&self) -> &PrivetConfig {
        self.state.config()
    }

    /// Initialise tracing-based logging.
    ///
    /// Uses `RUST_LOG` if set, otherwise picks a level from the verbosity
    /// flags. Library crates log through `log`; the subscriber picks those
    /// records up as well.
    pub fn init_logging(&self, verbose: bool, quiet: bool) {
        let filter = if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else if quiet {
            EnvFilter::new("warn")
        } else if verbose {
            EnvFilter::new("debug")
        } else {
            EnvFilter::new("info")
        };

        // A subscriber may already be installed (tests).
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }

    /// Run the CLI with the given arguments.
    pub async fn run(&self, args: CliArgs) -> Result<()> {
        self.init_logging(args.verbose, args.quiet);
        tracing::debug!(project = self.state.project_name(), "Starting {}", self.name);

        let config = self.config();
        match args.command {
            Some(Command::Show { item }) => acl_handlers::handle_show(config, &item).map(drop),
            Some(Command::Save {
                item,
                viewers,
                token,
            }) => match acl_handlers::handle_save(config, &item, viewers, token)? {
                SaveOutcome::Rejected => Err(Error::operation(format!(
                    "Save for {item} was rejected"
                ))),
                _ => Ok(()),
            },
            Some(Command::Token { item }) => acl_handlers::handle_token(config, &item).map(drop),
            Some(Command::Check { item, viewer }) => {
                acl_handlers::handle_check(config, &item, viewer).map(drop)
            }
            Some(Command::List(list)) => acl_handlers::handle_list(config, list).map(drop),
            Some(Command::Related { item, candidates }) => {
                acl_handlers::handle_related(config, &item, candidates).map(drop)
            }
            Some(Command::Version) => {
                println!("{} {}", self.name, self.version);
                Ok(())
            }
            Some(Command::Config(config_cmd)) => {
                config_handlers::handle_config_command(args.config.as_deref(), config_cmd.command)
            }
            None => {
                println!("{} {}: use --help for usage", self.name, self.version);
                Ok(())
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Operator command line for Privet.
//!
//! Inspect and edit per-item allow-lists, mint editor tokens, and preview
//! catalog listings and recommendations exactly as a viewer would get them.
//!
//! # Key Abstractions
//!
//! - [`PrivetCli`]: the application, holding the loaded config
//! - [`PrivetConfig`]: layered TOML/env configuration via `confyg`
//! - [`CliArgs`]: `clap` argument tree

#![doc = include_str!("../README.md")]

pub mod acl_handlers;
pub mod app;
pub mod cli;
pub mod config;
pub mod config_handlers;

pub use app::PrivetCli;
pub use cli::{CliArgs, Command, ConfigAction, ConfigCommand, ListArgs};
pub use config::PrivetConfig;

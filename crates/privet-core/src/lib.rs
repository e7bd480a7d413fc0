//! Privet Core: shared types, traits, and errors.
//!
//! This crate provides the foundational types used across all Privet crates.
//! It has no internal Privet dependencies.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`state`]: Generic application state container
//! - [`traits`]: Core traits for configuration

#![doc = include_str!("../README.md")]

pub mod error;
pub mod state;
pub mod traits;

// Re-export key types at crate root for convenience
pub use error::{Error, Result};
pub use state::AppState;
pub use traits::ConfigProvider;

//! Application state management.
//!
//! Provides [`AppState<C>`], a thread-safe container for shared application
//! state that is generic over the configuration provider.
//!
//! `AppState` holds only the configuration. The access-control crate wraps
//! it together with its stores when it builds a dispatcher.
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use privet_core::{AppState, ConfigProvider, Result};
//!
//! #[derive(Clone)]
//! struct MyConfig {
//!     base: PathBuf,
//! }
//!
//! impl ConfigProvider for MyConfig {
//!     fn project_name(&self) -> &str { "my-shop" }
//!     fn base_path(&self) -> Result<PathBuf> { Ok(self.base.clone()) }
//!     fn data_path(&self, k: &str) -> Result<PathBuf> { Ok(self.base.join(k)) }
//! }
//!
//! let state = AppState::new(MyConfig { base: PathBuf::from("/data") });
//! assert_eq!(state.project_name(), "my-shop");
//! ```

use std::sync::Arc;

use crate::traits::ConfigProvider;

/// Thread-safe shared application state.
///
/// Cloning is an `Arc` clone; every clone sees the same configuration.
#[derive(Debug)]
pub struct AppState<C: ConfigProvider> {
    config: Arc<C>,
}

impl<C: ConfigProvider> AppState<C> {
    /// Create a new AppState wrapping the given configuration.
    pub fn new(config: C) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Get a reference to the configuration.
    pub fn config(&self) -> &C {
        &self.config
    }

    /// Get the project name from the configuration.
    pub fn project_name(&self) -> &str {
        self.config.project_name()
    }
}

impl<C: ConfigProvider> Clone for AppState<C> {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
        }
    }
}

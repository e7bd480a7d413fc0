//! Configuration for the `privet` command line.
//!
//! [`PrivetConfig`] loads from TOML files, environment variables, and
//! defaults using the `confyg` crate.
//!
//! # Loading Priority
//!
//! 1. Explicit `--config <path>` flag
//! 2. `PRIVET_CONFIG` environment variable
//! 3. XDG default: `~/.config/privet/config.toml`
//! 4. Built-in defaults

use confyg::{Confygery, env};
use privet_acl::{AccessSettings, DEFAULT_TOKEN_ACTION, KeyedTokenVerifier};
use privet_core::traits::ConfigProvider;
use privet_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment prefix for every setting.
pub const ENV_PREFIX: &str = "PRIVET";

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "PRIVET_CONFIG";

// ============================================================================
// Configuration structs
// ============================================================================

/// Main configuration for the `privet` command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrivetConfig {
    /// Project name, used for default paths.
    pub project_name: String,

    /// Directory holding the data files when no explicit path is set.
    pub base_path: Option<String>,

    /// Metadata key and related-items wiring.
    pub access: AccessSettings,

    /// Metadata file location.
    pub store: StoreConfig,

    /// Catalog file location.
    pub catalog: CatalogConfig,

    /// Editor token settings.
    pub editor: EditorConfig,
}

/// Metadata file configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path to the metadata JSON file.
    pub path: Option<String>,
}

/// Catalog file configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Path to the catalog JSON file.
    pub path: Option<String>,
}

/// Editor token configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Shared secret tokens are derived from. Saving needs one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,

    /// Action name bound into every token.
    pub action: String,
}

// ============================================================================
// Default implementations
// ============================================================================

impl Default for PrivetConfig {
    fn default() -> Self {
        Self {
            project_name: "privet".to_string(),
            base_path: None,
            access: AccessSettings::default(),
            store: StoreConfig::default(),
            catalog: CatalogConfig::default(),
            editor: EditorConfig::default(),
        }
    }
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            secret: None,
            action: DEFAULT_TOKEN_ACTION.to_string(),
        }
    }
}

// ============================================================================
// Config loading
// ============================================================================

impl PrivetConfig {
    /// Load configuration from file, environment, and defaults.
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder =
            Confygery::new().map_err(|e| Error::config(format!("config init: {e}")))?;

        if let Some(path) = Self::resolve_config_path(config_path) {
            if path.exists() {
                log::debug!("Loading config from {}", path.display());
                builder
                    .add_file(&path.to_string_lossy())
                    .map_err(|e| Error::config(format!("config file: {e}")))?;
            }
        }

        let mut env_opts = env::Options::with_top_level(ENV_PREFIX);
        env_opts.add_section("access");
        env_opts.add_section("store");
        env_opts.add_section("catalog");
        env_opts.add_section("editor");
        builder
            .add_env(env_opts)
            .map_err(|e| Error::config(format!("config env: {e}")))?;

        builder
            .build()
            .map_err(|e| Error::config(format!("config build: {e}")))
    }

    /// Resolve the config file path from explicit flag, env var, or XDG default.
    pub fn resolve_config_path(explicit: Option<&str>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(PathBuf::from(path));
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(path));
        }

        Self::default_config_path()
    }

    /// Return the XDG default config path.
    pub fn default_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("privet").join("config.toml"))
    }

    /// Serialize this config to a pretty-printed TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::config(e.to_string()))
    }

    /// A copy of this config with the editor secret removed, for display.
    pub fn redacted(&self) -> Self {
        let mut redacted = self.clone();
        redacted.editor.secret = None;
        redacted
    }

    /// Flatten this config into `PRIVET_`-prefixed environment variable pairs.
    ///
    /// The editor secret is never exported.
    pub fn to_env_vars(&self) -> Result<Vec<(String, String)>> {
        let value: toml::Value =
            toml::Value::try_from(self.redacted()).map_err(|e| Error::config(e.to_string()))?;
        let mut vars = Vec::new();
        flatten_toml_value(&value, ENV_PREFIX, &mut vars);
        Ok(vars)
    }

    /// Build the token verifier from the editor settings.
    ///
    /// # Errors
    ///
    /// Fails when no secret is configured.
    pub fn token_verifier(&self) -> Result<KeyedTokenVerifier> {
        match self.editor.secret.as_deref() {
            Some(secret) if !secret.is_empty() => {
                Ok(KeyedTokenVerifier::new(secret, self.editor.action.clone()))
            }
            _ => Err(Error::config(
                "No editor secret configured; set editor.secret or PRIVET_EDITOR_SECRET",
            )),
        }
    }
}

// ============================================================================
// ConfigProvider implementation
// ============================================================================

impl ConfigProvider for PrivetConfig {
    fn project_name(&self) -> &str {
        &self.project_name
    }

    fn base_path(&self) -> Result<PathBuf> {
        match &self.base_path {
            Some(p) => Ok(PathBuf::from(p)),
            None => std::env::current_dir()
                .map_err(|e| Error::config(format!("Could not determine base path: {e}"))),
        }
    }

    fn data_path(&self, kind: &str) -> Result<PathBuf> {
        let explicit = match kind {
            "meta" => self.store.path.as_deref(),
            "catalog" => self.catalog.path.as_deref(),
            _ => None,
        };
        match explicit {
            Some(p) => Ok(PathBuf::from(p)),
            None => Ok(self.base_path()?.join(format!("{kind}.json"))),
        }
    }
}

// ============================================================================
// Helper: flatten TOML to env vars
// ============================================================================

/// Recursively flatten a TOML value into `KEY=value` pairs.
fn flatten_toml_value(value: &toml::Value, prefix: &str, out: &mut Vec<(String, String)>) {
    match value {
        toml::Value::Table(table) => {
            for (key, val) in table {
                let env_key = format!("{}_{}", prefix, key.to_uppercase());
                flatten_toml_value(val, &env_key, out);
            }
        }
        toml::Value::Array(arr) => {
            if let Ok(json) = serde_json::to_string(arr) {
                out.push((prefix.to_string(), json));
            }
        }
        toml::Value::String(s) => out.push((prefix.to_string(), s.clone())),
        toml::Value::Integer(i) => out.push((prefix.to_string(), i.to_string())),
        toml::Value::Float(f) => out.push((prefix.to_string(), f.to_string())),
        toml::Value::Boolean(b) => out.push((prefix.to_string(), b.to_string())),
        toml::Value::Datetime(dt) => out.push((prefix.to_string(), dt.to_string())),
    }
}

// ============================================================================
// Tests
// ============================================================================

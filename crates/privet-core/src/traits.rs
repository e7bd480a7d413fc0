//! Core traits for Privet.
//!
//! The primary trait is [`ConfigProvider`], which abstracts where an
//! application keeps its metadata and catalog files.

use std::path::PathBuf;

use crate::Result;

/// Trait for application configuration.
///
/// Every Privet-based application implements this trait to tell the
/// subsystems where their data lives.
///
/// # Bounds
///
/// - `Send + Sync`: Configuration must be shareable across threads
/// - `Clone`: Configuration can be duplicated for passing to subsystems
/// - `'static`: Configuration lifetime is not borrowed
///
/// # Example
///
/// ```
/// use std::path::PathBuf;
/// use privet_core::traits::ConfigProvider;
/// use privet_core::Result;
///
/// #[derive(Clone)]
/// struct ShopConfig {
///     data_dir: PathBuf,
/// }
///
/// impl ConfigProvider for ShopConfig {
///     fn project_name(&self) -> &str {
///         "shop"
///     }
///
///     fn base_path(&self) -> Result<PathBuf> {
///         Ok(self.data_dir.clone())
///     }
///
///     fn data_path(&self, kind: &str) -> Result<PathBuf> {
///         Ok(self.data_dir.join(format!("{kind}.json")))
///     }
/// }
/// ```
pub trait ConfigProvider: Send + Sync + Clone + 'static {
    /// The project name, used for env var prefixes and default paths.
    fn project_name(&self) -> &str;

    /// Base path for all project data.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be determined.
    fn base_path(&self) -> Result<PathBuf>;

    /// Path for a specific data file.
    ///
    /// `kind` is a key such as `"meta"` (the per-item metadata file) or
    /// `"catalog"` (the product catalog). The implementation decides how
    /// to map these to filesystem paths.
    ///
    /// # Errors
    ///
    /// Returns an error if the kind is unknown or the path cannot be
    /// resolved.
    fn data_path(&self, kind: &str) -> Result<PathBuf>;
}

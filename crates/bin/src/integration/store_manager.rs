//! Record store location.
//!
//! The SQLite store lives in a platform-specific data directory unless a path
//! is given on the command line or in the config file.

use std::path::{Path, PathBuf};
use vesta_data::error::DataError;
use vesta_data::store::SqliteStore;

/// Get the default data directory path.
///
/// Uses platform-specific data directories:
/// - Linux: `~/.local/share/vesta/`
/// - macOS: `~/Library/Application Support/vesta/`
/// - Windows: `%APPDATA%\vesta\`
pub(crate) fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vesta")
}

/// Get the default store database path.
pub(crate) fn default_store_path() -> PathBuf {
    default_data_dir().join("vesta.db")
}

/// Open the store at `path`, creating the directory if needed.
pub(crate) fn open_store(path: &Path) -> Result<SqliteStore, DataError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    SqliteStore::new(path)
}

//! Canonical file paths for the `DuckDB` store.

use std::path::{Path, PathBuf};

/// Environment variable overriding [`db_path`].
pub const DB_PATH_ENV: &str = "LEXICON_DB_PATH";

/// Returns the workspace root directory.
///
/// Resolved at compile time from `CARGO_MANIFEST_DIR`.
#[must_use]
pub fn project_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .ancestors()
        .nth(2)
        .unwrap_or(manifest_dir)
        .to_path_buf()
}

/// Returns the `data/` directory path.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_root().join("data")
}

/// Returns the store path: `LEXICON_DB_PATH` if set, otherwise
/// `data/lexicon.duckdb`.
#[must_use]
pub fn db_path() -> PathBuf {
    std::env::var_os(DB_PATH_ENV)
        .filter(|path| !path.is_empty())
        .map_or_else(|| data_dir().join("lexicon.duckdb"), PathBuf::from)
}

/// Ensures a directory exists, creating it if necessary.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created.
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.as_os_str().is_empty() && !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn project_root_contains_workspace_manifest() {
        assert!(project_root().join("Cargo.toml").exists());
        assert!(project_root().join("packages").is_dir());
    }

    #[test]
    fn default_store_lives_under_data_dir() {
        assert!(data_dir().ends_with("data"));
    }
}

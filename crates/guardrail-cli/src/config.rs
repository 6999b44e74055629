//! Configuration and path resolution for the CLI.
//!
//! All state lives under one data directory: the chunk database and,
//! optionally, the citation source table. The directory defaults to the
//! platform standard location and can be overridden with `--data-dir`.

use anyhow::{anyhow, Result};
use directories::ProjectDirs;
use std::path::PathBuf;

/// Database file name
const DATABASE_FILENAME: &str = "chunks.redb";

/// Default citation table file name inside the data directory
const SOURCES_FILENAME: &str = "sources.json";

/// Returns the data directory.
///
/// - macOS: `~/Library/Application Support/io.guardrail.Guardrail/`
/// - Linux: `~/.local/share/guardrail/`
/// - Windows: `%APPDATA%\guardrail\Guardrail\data\`
pub fn get_data_dir(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = custom_dir {
        return Ok(dir.clone());
    }

    ProjectDirs::from("io", "guardrail", "Guardrail")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| anyhow!("Could not determine data directory"))
}

/// Returns the path to the chunk database, creating the data directory if
/// needed.
pub fn database_path(custom_dir: Option<&PathBuf>) -> Result<PathBuf> {
    let data_dir = get_data_dir(custom_dir)?;
    std::fs::create_dir_all(&data_dir)?;
    Ok(data_dir.join(DATABASE_FILENAME))
}

/// Returns the citation table path to use, if any.
///
/// An explicit `--sources` path wins; otherwise `sources.json` inside the
/// data directory is used when it exists. No table at all is fine, lookups
/// simply resolve to no URL.
pub fn sources_path(
    custom_sources: Option<&PathBuf>,
    custom_dir: Option<&PathBuf>,
) -> Result<Option<PathBuf>> {
    if let Some(path) = custom_sources {
        if !path.exists() {
            return Err(anyhow!("Sources file not found: {}", path.display()));
        }
        return Ok(Some(path.clone()));
    }

    let default = get_data_dir(custom_dir)?.join(SOURCES_FILENAME);
    Ok(default.exists().then_some(default))
}

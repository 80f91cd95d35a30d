//! HAR file repository
//!
//! Each interaction is stored as one HTTP Archive file. The interaction name
//! is the file path; names without an extension get the configured one.

pub mod convert;
pub mod format;

use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::InteractionRepository;
use crate::interaction::Interaction;
use crate::{HartapeError, Result};

pub use format::HttpArchive;

/// Serialization conventions for archive files
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArchiveSettings {
    /// Write indented JSON
    pub pretty: bool,
    /// Drop null-valued fields from the output
    pub omit_nulls: bool,
    /// Extension appended to names that have none
    pub extension: String,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            pretty: true,
            omit_nulls: true,
            extension: "har".to_string(),
        }
    }
}

impl ArchiveSettings {
    /// File path for an interaction name
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        let path = PathBuf::from(name);
        if path.extension().is_some() || self.extension.is_empty() {
            path
        } else {
            path.with_extension(&self.extension)
        }
    }

    /// Serialize an interaction to archive text
    ///
    /// # Errors
    ///
    /// Returns `RepositoryFailure` if serialization fails
    pub fn encode(&self, interaction: &Interaction) -> Result<String> {
        let archive = convert::to_archive(interaction);
        let mut value = serde_json::to_value(&archive)
            .map_err(|e| HartapeError::repository(&interaction.name, e))?;

        if self.omit_nulls {
            strip_nulls(&mut value);
        }

        let text = if self.pretty {
            serde_json::to_string_pretty(&value)
        } else {
            serde_json::to_string(&value)
        };
        text.map_err(|e| HartapeError::repository(&interaction.name, e))
    }

    /// Parse archive text into an interaction named `name`
    ///
    /// # Errors
    ///
    /// Returns `RepositoryFailure` if the text is not a valid archive
    pub fn decode(&self, text: &str, name: &str) -> Result<Interaction> {
        let archive: HttpArchive = serde_json::from_str(text)
            .map_err(|e| HartapeError::repository(name, format!("invalid archive: {e}")))?;
        convert::to_interaction(&archive, name)
    }
}

/// Remove null-valued object fields, recursively
fn strip_nulls(value: &mut serde_json::Value) {
    match value {
        serde_json::Value::Object(map) => {
            map.retain(|_, field| !field.is_null());
            map.values_mut().for_each(strip_nulls);
        }
        serde_json::Value::Array(items) => items.iter_mut().for_each(strip_nulls),
        _ => {}
    }
}

/// Write `contents` to `temp`, then rename it over `path`
///
/// Runs to completion on the blocking pool even if the caller stops waiting,
/// and removes `temp` when either step fails.
fn write_atomically(temp: &Path, path: &Path, contents: &[u8]) -> io::Result<()> {
    let result = std::fs::write(temp, contents).and_then(|()| std::fs::rename(temp, path));
    if result.is_err() {
        let _ = std::fs::remove_file(temp);
    }
    result
}

/// Repository storing interactions as HAR files
#[derive(Debug, Clone, Default)]
pub struct HarRepository {
    settings: ArchiveSettings,
}

impl HarRepository {
    /// Repository with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Repository with explicit settings
    #[must_use]
    pub fn with_settings(settings: ArchiveSettings) -> Self {
        Self { settings }
    }

    /// Active settings
    #[must_use]
    pub fn settings(&self) -> &ArchiveSettings {
        &self.settings
    }
}

impl InteractionRepository for HarRepository {
    async fn exists(&self, name: &str) -> Result<bool> {
        let path = self.settings.path_for(name);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| HartapeError::repository(name, e))
    }

    async fn load(&self, name: &str) -> Result<Interaction> {
        let path = self.settings.path_for(name);

        let text = tokio::fs::read_to_string(&path).await.map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                HartapeError::repository(name, format!("archive not found at {}", path.display()))
            } else {
                HartapeError::repository(name, e)
            }
        })?;

        let interaction = self.settings.decode(&text, name)?;
        debug!(
            "Loaded interaction {} ({} messages)",
            path.display(),
            interaction.len()
        );
        Ok(interaction)
    }

    async fn store(&self, interaction: &Interaction) -> Result<Interaction> {
        let name = interaction.name.as_str();
        let path = self.settings.path_for(name);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| HartapeError::repository(name, e))?;
        }

        let text = self.settings.encode(interaction)?;

        // Write the whole archive beside the target, then swap it in.
        let mut temp = OsString::from(path.as_os_str());
        temp.push(".tmp");
        let temp = PathBuf::from(temp);

        let target = path.clone();
        tokio::task::spawn_blocking(move || write_atomically(&temp, &target, text.as_bytes()))
            .await
            .map_err(|e| HartapeError::repository(name, e))?
            .map_err(|e| HartapeError::repository(name, e))?;

        debug!(
            "Stored interaction {} ({} messages)",
            path.display(),
            interaction.len()
        );

        convert::to_interaction(&convert::to_archive(interaction), name)
    }
}

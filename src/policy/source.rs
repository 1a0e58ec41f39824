//! Configuration sources: where permission rules come from and how a settings
//! document is decoded.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Where to find one settings document, and how much it outranks the others.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SourceDescriptor {
    /// Label used in logs and by overlay `remove_sources`.
    pub name: String,
    /// Filesystem path. `~` and `$VAR` are expanded at load time.
    pub path: String,
    /// Higher rank = higher precedence.
    #[serde(default)]
    pub rank: i32,
}

/// Rules contributed by a single configuration source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub allow: Vec<String>,
    pub deny: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("cannot expand path {path:?}: {message}")]
    Expand { path: String, message: String },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

// Settings documents carry many other keys; only `permissions` is read.
#[derive(Debug, Deserialize, Default)]
struct SettingsDocument {
    #[serde(default)]
    permissions: Permissions,
}

#[derive(Debug, Deserialize, Default)]
struct Permissions {
    #[serde(default)]
    allow: Vec<String>,
    #[serde(default)]
    deny: Vec<String>,
}

impl Source {
    /// Decode a settings document (`{"permissions": {"allow": [..], "deny": [..]}}`).
    pub fn from_json(name: &str, text: &str) -> Result<Self, serde_json::Error> {
        let doc: SettingsDocument = serde_json::from_str(text)?;
        Ok(Self {
            name: name.to_string(),
            allow: doc.permissions.allow,
            deny: doc.permissions.deny,
        })
    }
}

impl SourceDescriptor {
    pub fn new(name: &str, path: impl AsRef<Path>, rank: i32) -> Self {
        Self {
            name: name.to_string(),
            path: path.as_ref().to_string_lossy().into_owned(),
            rank,
        }
    }

    /// Expand `~` and environment variables in the configured path.
    pub fn resolve_path(&self) -> Result<PathBuf, SourceError> {
        shellexpand::full(&self.path)
            .map(|p| PathBuf::from(p.as_ref()))
            .map_err(|e| SourceError::Expand {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }

    /// Read and decode the document. A file that does not exist is not an
    /// error: it yields `Ok(None)`.
    pub fn load(&self) -> Result<Option<Source>, SourceError> {
        let path = self.resolve_path()?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SourceError::Io { path, source }),
        };
        Source::from_json(&self.name, &text)
            .map(Some)
            .map_err(|source| SourceError::Parse { path, source })
    }
}

/// Load every readable source, ordered highest precedence first.
///
/// Failures are logged and the source is skipped; the remaining sources
/// still contribute. Sources with equal rank keep their configured order.
pub fn load_sources(descriptors: &[SourceDescriptor]) -> Vec<Source> {
    let mut ordered: Vec<&SourceDescriptor> = descriptors.iter().collect();
    ordered.sort_by(|a, b| b.rank.cmp(&a.rank));

    let mut sources = Vec::new();
    for desc in ordered {
        match desc.load() {
            Ok(Some(source)) => {
                log::debug!(
                    "source {} ({}): {} allow, {} deny",
                    desc.name,
                    desc.path,
                    source.allow.len(),
                    source.deny.len()
                );
                sources.push(source);
            }
            Ok(None) => log::debug!("source {} ({}): not present", desc.name, desc.path),
            Err(e) => log::warn!("cc-permgate: skipping source {}: {e}", desc.name),
        }
    }
    sources
}

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::launch::Strategy;
use crate::policy::SourceDescriptor;

/// Embedded default configuration.
const DEFAULT_CONFIG: &str = include_str!("../config.default.toml");

/// Environment variable naming an alternate overlay file.
pub const CONFIG_ENV_VAR: &str = "CC_PERMGATE_CONFIG";

// ── Final (merged) config types ──

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub wrapper: WrapperConfig,
    #[serde(default)]
    pub heuristic: HeuristicConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Permission sources; order among equal ranks is preserved.
    #[serde(default)]
    pub sources: Vec<SourceDescriptor>,
}

/// The wrapped tool and how approval is injected into its arguments.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct WrapperConfig {
    /// Program to hand control to. Bare names are resolved through `PATH`.
    #[serde(default)]
    pub program: String,
    #[serde(default)]
    pub strategy: Strategy,
    /// Flag inserted right after the program name on approval.
    #[serde(default)]
    pub approval_flag: String,
    /// Any of these already present means the caller chose approval behavior.
    #[serde(default)]
    pub override_flags: Vec<String>,
    #[serde(default)]
    pub allowed_tools_flag: String,
    #[serde(default)]
    pub disallowed_tools_flag: String,
}

/// Known-safe command substrings consulted when no rule decides.
#[derive(Debug, Deserialize, Serialize, Default)]
pub struct HeuristicConfig {
    #[serde(default)]
    pub safe_substrings: Vec<String>,
}

#[derive(Debug, Deserialize, Serialize, Default)]
pub struct LoggingConfig {
    /// `off`, `error`, `warn`, `info`, `debug` or `trace`.
    #[serde(default)]
    pub level: String,
    /// Debug log file; empty disables file logging.
    #[serde(default)]
    pub file: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ── Overlay types (user config that merges with defaults) ──

#[derive(Debug, Deserialize, Default)]
struct ConfigOverlay {
    #[serde(default)]
    replace_sources: bool,
    #[serde(default)]
    remove_sources: Vec<String>,
    #[serde(default)]
    sources: Vec<SourceDescriptor>,
    #[serde(default)]
    wrapper: WrapperOverlay,
    #[serde(default)]
    heuristic: HeuristicOverlay,
    #[serde(default)]
    logging: LoggingOverlay,
}

#[derive(Debug, Deserialize, Default)]
struct WrapperOverlay {
    program: Option<String>,
    strategy: Option<Strategy>,
    approval_flag: Option<String>,
    allowed_tools_flag: Option<String>,
    disallowed_tools_flag: Option<String>,
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    override_flags: Vec<String>,
    #[serde(default)]
    remove_override_flags: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct HeuristicOverlay {
    #[serde(default)]
    replace: bool,
    #[serde(default)]
    safe_substrings: Vec<String>,
    #[serde(default)]
    remove_safe_substrings: Vec<String>,
}

#[derive(Debug, Deserialize, Default)]
struct LoggingOverlay {
    level: Option<String>,
    file: Option<String>,
}

// ── Merge logic ──

/// Merge a user list into a default list.
/// In replace mode: user list replaces default entirely.
/// In merge mode: remove items first, then extend with additions (deduped).
fn merge_list(base: &mut Vec<String>, add: Vec<String>, remove: &[String], replace: bool) {
    if replace {
        *base = add;
    } else {
        base.retain(|item| !remove.contains(item));
        for item in add {
            if !base.contains(&item) {
                base.push(item);
            }
        }
    }
}

/// Like `merge_list`, keyed by source name. An added source whose name is
/// already present takes over that entry's slot.
fn merge_sources(
    base: &mut Vec<SourceDescriptor>,
    add: Vec<SourceDescriptor>,
    remove: &[String],
    replace: bool,
) {
    if replace {
        *base = add;
        return;
    }
    base.retain(|s| !remove.contains(&s.name));
    for source in add {
        match base.iter_mut().find(|s| s.name == source.name) {
            Some(existing) => *existing = source,
            None => base.push(source),
        }
    }
}

fn set_if_some<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

impl Config {
    /// Load the default embedded configuration.
    pub fn default_config() -> Self {
        toml::from_str(DEFAULT_CONFIG).expect("embedded default config must parse")
    }

    /// Load configuration with resolution order:
    /// 1. Start with embedded defaults
    /// 2. Merge the overlay from `$CC_PERMGATE_CONFIG`, or
    ///    `~/.config/cc-permgate/config.toml` (if it exists)
    ///
    /// Lists extend, scalars override. Set `replace = true` in a section to
    /// replace its defaults, or use `remove_<field>` lists to subtract items.
    /// A broken overlay is reported and ignored.
    pub fn load() -> Self {
        let mut config = Self::default_config();
        let Some(path) = Self::overlay_path() else {
            return config;
        };
        match Self::load_overlay(&path) {
            Ok(Some(overlay)) => config.apply_overlay(overlay),
            Ok(None) => {}
            // Logging is configured from this file, so stderr is all we have.
            Err(e) => eprintln!("cc-permgate: {e}"),
        }
        config
    }

    /// Location of the user overlay.
    pub fn overlay_path() -> Option<PathBuf> {
        if let Some(p) = std::env::var_os(CONFIG_ENV_VAR).filter(|p| !p.is_empty()) {
            return Some(PathBuf::from(p));
        }
        let home = std::env::var_os("HOME")?;
        Some(Path::new(&home).join(".config/cc-permgate/config.toml"))
    }

    /// Read an overlay file. A missing file is `Ok(None)`.
    fn load_overlay(path: &Path) -> Result<Option<ConfigOverlay>, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        toml::from_str(&content)
            .map(Some)
            .map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Load the defaults merged with the overlay at `path`.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default_config();
        if let Some(overlay) = Self::load_overlay(path)? {
            config.apply_overlay(overlay);
        }
        Ok(config)
    }

    /// Apply an overlay on top of this config (merge semantics).
    fn apply_overlay(&mut self, overlay: ConfigOverlay) {
        merge_sources(
            &mut self.sources,
            overlay.sources,
            &overlay.remove_sources,
            overlay.replace_sources,
        );

        // Wrapper
        let w = overlay.wrapper;
        set_if_some(&mut self.wrapper.program, w.program);
        set_if_some(&mut self.wrapper.strategy, w.strategy);
        set_if_some(&mut self.wrapper.approval_flag, w.approval_flag);
        set_if_some(&mut self.wrapper.allowed_tools_flag, w.allowed_tools_flag);
        set_if_some(&mut self.wrapper.disallowed_tools_flag, w.disallowed_tools_flag);
        merge_list(
            &mut self.wrapper.override_flags,
            w.override_flags,
            &w.remove_override_flags,
            w.replace,
        );

        // Heuristic
        let h = overlay.heuristic;
        merge_list(
            &mut self.heuristic.safe_substrings,
            h.safe_substrings,
            &h.remove_safe_substrings,
            h.replace,
        );

        // Logging
        let l = overlay.logging;
        set_if_some(&mut self.logging.level, l.level);
        set_if_some(&mut self.logging.file, l.file);
    }

    /// Apply an overlay from a TOML string. Used for testing.
    #[cfg(test)]
    fn apply_overlay_str(&mut self, toml_str: &str) {
        let overlay: ConfigOverlay = toml::from_str(toml_str).unwrap();
        self.apply_overlay(overlay);
    }
}

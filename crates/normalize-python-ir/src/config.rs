//! Normalizer configuration.
//!
//! Loads config from:
//! 1. Global: $XDG_CONFIG_HOME/normalize/python-ir.toml (or ~/.config/...)
//! 2. Per-project: .normalize/python-ir.toml (overrides global)
//!
//! An explicit file passed by the caller is merged last.
//!
//! Example python-ir.toml:
//! ```toml
//! [normalize]
//! clean_docstrings = true
//! distinguish_references = true
//! resolve_bare_annotations = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::signature::AnnotationMode;

/// Options that change the shape of the produced IR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Clean docstring indentation instead of returning it verbatim.
    pub clean_docstrings: bool,
    /// Tag bare identifiers as `reference` rather than `string`.
    pub distinguish_references: bool,
    /// Resolve non-subscripted annotations into `declared_type`.
    pub resolve_bare_annotations: bool,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            clean_docstrings: true,
            distinguish_references: true,
            resolve_bare_annotations: true,
        }
    }
}

impl NormalizeConfig {
    pub fn annotation_mode(&self) -> AnnotationMode {
        if self.resolve_bare_annotations {
            AnnotationMode::Uniform
        } else {
            AnnotationMode::SubscriptedOnly
        }
    }

    /// Load configuration for a project.
    ///
    /// Missing files are skipped; a file that exists but does not parse is
    /// an error.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        Self::load_layered(Self::global_config_path().as_deref(), root)
    }

    /// Like [`load`](Self::load) with an explicit global config path.
    pub fn load_layered(global: Option<&Path>, root: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(global) = global
            && global.is_file()
        {
            config = config.merge(ConfigFile::load(global)?);
        }

        let project = root.join(".normalize").join("python-ir.toml");
        if project.is_file() {
            config = config.merge(ConfigFile::load(&project)?);
        }

        Ok(config)
    }

    /// Get the global config path.
    pub fn global_config_path() -> Option<PathBuf> {
        let config_home = std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .ok()
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))?;
        Some(config_home.join("normalize").join("python-ir.toml"))
    }

    /// Overlay the options a config file sets explicitly.
    pub fn merge(self, file: ConfigFile) -> Self {
        let set = file.normalize;
        Self {
            clean_docstrings: set.clean_docstrings.unwrap_or(self.clean_docstrings),
            distinguish_references: set
                .distinguish_references
                .unwrap_or(self.distinguish_references),
            resolve_bare_annotations: set
                .resolve_bare_annotations
                .unwrap_or(self.resolve_bare_annotations),
        }
    }
}

/// On-disk form: every option optional so layers only override what they set.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    pub normalize: PartialConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    pub clean_docstrings: Option<bool>,
    pub distinguish_references: Option<bool>,
    pub resolve_bare_annotations: Option<bool>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config {path}: {source}")]
    Toml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

//! Traits for source readers.

use crate::ast::Module;
use std::path::PathBuf;

/// Error that can occur when reading source code into a syntax tree.
#[derive(Debug, thiserror::Error)]
pub enum ReadError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("failed to load grammar: {0}")]
    Grammar(String),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// A reader parses source code into the host syntax tree.
pub trait Reader: Send + Sync {
    /// Language identifier (e.g., "python").
    fn language(&self) -> &'static str;

    /// File extensions this reader handles (e.g., &["py", "pyi"]).
    fn extensions(&self) -> &'static [&'static str];

    /// Parse source code into a module.
    fn read(&self, source: &str) -> Result<Module, ReadError>;
}

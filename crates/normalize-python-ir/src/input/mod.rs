//! Input readers - parse source code into the host syntax tree.

#[cfg(feature = "read-python")]
pub mod python;

#[cfg(feature = "read-python")]
pub use python::{PYTHON_READER, PythonReader, python_syntax_tree, read_python, read_python_file};

use crate::traits::Reader;

static READERS: &[&dyn Reader] = &[
    #[cfg(feature = "read-python")]
    &PYTHON_READER,
];

/// Readers compiled into this build.
pub fn readers() -> &'static [&'static dyn Reader] {
    READERS
}

/// Get a reader by language name.
pub fn reader_for_language(lang: &str) -> Option<&'static dyn Reader> {
    readers().iter().find(|r| r.language() == lang).copied()
}

/// Get a reader by file extension.
pub fn reader_for_extension(ext: &str) -> Option<&'static dyn Reader> {
    readers()
        .iter()
        .find(|r| r.extensions().contains(&ext))
        .copied()
}

//! Errors raised while reading, rewriting or packaging PySH scripts.
//!
//! Malformed section markers are the only parse failures; anything that
//! does not look like a PySH script at all is treated as plain content
//! rather than rejected. Filesystem errors pass through untouched.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Shorthand for results carrying a crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
/// Failure modes of script generation.
pub enum Error {
    /// An end marker names a different section than the one currently open.
    #[error(
        "{line}: {column}: section end name (\"{found}\") doesn't match start name (\"{expected}\")"
    )]
    SectionMismatch {
        /// 1-based line number of the offending end marker.
        line: usize,
        /// 1-based column where the end marker's section name begins.
        column: usize,
        /// Name of the section that is open.
        expected: String,
        /// Name found in the end marker.
        found: String,
    },

    /// Input ended while a section was still open.
    #[error("reached end of file when looking for section \"{name}\" end marker")]
    UnterminatedSection {
        /// Name of the section left open.
        name: String,
    },

    /// A bootstrap setting cannot be embedded safely in the generated script.
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidBootstrap {
        /// Setting that was rejected.
        field: &'static str,
        /// Rejected value.
        value: String,
        /// What the value must look like.
        reason: &'static str,
    },

    /// The support-library tree contained nothing to archive.
    #[error("no runtime sources found under {}", path.display())]
    EmptyRuntime {
        /// Root of the tree that was searched.
        path: PathBuf,
    },

    /// Walking the support-library tree failed.
    #[error("cannot read runtime tree: {0}")]
    Walk(#[from] walkdir::Error),

    /// Building the embedded archive failed.
    #[error("cannot build runtime archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    /// Rendering a document outline failed.
    #[error("cannot render outline: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem or stream error, passed through unchanged.
    #[error(transparent)]
    Io(#[from] io::Error),
}

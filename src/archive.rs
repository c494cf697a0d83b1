//! Packs the runtime module into text that can ride along inside a script.
//!
//! The payload is a zip archive (so Python can import straight from it once
//! it is on `sys.path`), base64 encoded and wrapped in a triple-quoted string
//! literal. Entries are sorted and carry fixed timestamps and permissions, so
//! archiving an unchanged tree always yields the same text.

use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, DateTime, ZipWriter};

/// Width of the base64 lines in the payload block.
const PAYLOAD_WIDTH: usize = 76;

/// Literal delimiting the payload block on both sides.
const PAYLOAD_QUOTE: &str = "\"\"\"";

#[derive(Clone, Debug, PartialEq, Eq)]
/// Encoded runtime archive ready to be appended to a script.
pub struct Payload {
    encoded: String,
}

impl Payload {
    #[must_use]
    /// Wraps raw archive bytes.
    pub fn from_archive(bytes: &[u8]) -> Self {
        Self {
            encoded: STANDARD.encode(bytes),
        }
    }

    #[must_use]
    /// Base64 text of the archive.
    pub fn encoded(&self) -> &str {
        &self.encoded
    }

    #[must_use]
    /// Lines written after the embedded notice.
    ///
    /// The block opens and closes with `"""` and ends with an empty line so
    /// the script finishes with a newline.
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines = vec![PAYLOAD_QUOTE.to_string()];
        lines.extend(
            self.encoded
                .as_bytes()
                .chunks(PAYLOAD_WIDTH)
                .map(|chunk| String::from_utf8_lossy(chunk).into_owned()),
        );
        lines.push(PAYLOAD_QUOTE.to_string());
        lines.push(String::new());
        lines
    }

    #[must_use]
    /// Whether `lines` have the shape produced by [`Payload::to_lines`].
    pub fn is_block(lines: &[String]) -> bool {
        let [open, body @ .., close, last] = lines else {
            return false;
        };
        if open != PAYLOAD_QUOTE || close != PAYLOAD_QUOTE || !last.is_empty() {
            return false;
        }
        body.iter().all(|line| {
            line.len() <= PAYLOAD_WIDTH
                && line
                    .bytes()
                    .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'='))
        })
    }
}

#[derive(Clone, Debug)]
/// Where the runtime sources live and how they are named inside the archive.
pub struct RuntimeSource {
    /// Root of the runtime source tree.
    pub root: PathBuf,
    /// Top-level package name the files are stored under.
    pub module: String,
    /// File suffixes to include, without the dot.
    pub extensions: Vec<String>,
}

impl RuntimeSource {
    /// Collects the matching files under `root` as `(archive name, path)` pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked.
    pub fn files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(&self.root).sort_by_file_name() {
            let entry = entry?;
            if !entry.file_type().is_file() || !self.wants(entry.path()) {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(&self.root) else {
                continue;
            };

            let mut name = self.module.clone();
            for component in relative.components() {
                name.push('/');
                name.push_str(&component.as_os_str().to_string_lossy());
            }
            files.push((name, entry.into_path()));
        }

        files.sort();
        Ok(files)
    }

    /// Builds the zip archive of the runtime and encodes it.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be read, holds no matching files,
    /// or the archive cannot be written.
    pub fn archive(&self) -> Result<Payload> {
        let files = self.files()?;
        if files.is_empty() {
            return Err(Error::EmptyRuntime {
                path: self.root.clone(),
            });
        }

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(DateTime::default())
            .unix_permissions(0o644);

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        for (name, path) in &files {
            let bytes = fs::read(path)?;
            debug!(member = %name, size = bytes.len(), "archiving runtime file");
            zip.start_file(name.as_str(), options)?;
            zip.write_all(&bytes)?;
        }
        let bytes = zip.finish()?.into_inner();

        debug!(
            root = %self.root.display(),
            members = files.len(),
            size = bytes.len(),
            "built runtime archive"
        );
        Ok(Payload::from_archive(&bytes))
    }

    fn wants(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|wanted| wanted == ext))
    }
}

#[cfg(test)]
#[path = "tests/archive.rs"]
mod tests;

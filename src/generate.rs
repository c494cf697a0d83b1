//! Turns a script on disk (or on stdin) into a PySH script.
//!
//! A file is regenerated in place: the new text goes to a hidden sibling
//! temporary file which is synced, made executable and renamed over the
//! original. Until that rename the original is never touched, and a failure
//! anywhere before it leaves no temporary file behind.

use crate::archive::{Payload, RuntimeSource};
use crate::bootstrap::Bootstrap;
use crate::config::Config;
use crate::document::{Document, ParseOptions};
use crate::error::Result;
use std::fmt;
use std::fs::{self, File, Permissions};
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

#[derive(Clone, Debug, PartialEq, Eq)]
/// Where a script is read from and written back to.
pub enum ScriptPath {
    /// Read stdin, write stdout.
    Stdio,
    /// Rewrite a file in place.
    File(PathBuf),
}

impl ScriptPath {
    #[must_use]
    /// Interprets `-` as stdin/stdout and anything else as a file.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        if path.as_os_str() == "-" {
            Self::Stdio
        } else {
            Self::File(path)
        }
    }
}

impl fmt::Display for ScriptPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdio => f.write_str("<stdin>"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// What the generated script carries.
pub enum Mode {
    /// Bootstrap only; the runtime must be installed where the script runs.
    Header,
    /// Bootstrap plus the runtime embedded as a payload.
    Distributable,
}

#[derive(Clone, Debug)]
/// Generates scripts with fixed bootstrap and runtime settings.
pub struct Generator {
    bootstrap: Bootstrap,
    runtime: RuntimeSource,
    options: ParseOptions,
}

impl Generator {
    #[must_use]
    /// Generator using `bootstrap`, archiving `runtime` when distributing.
    pub fn new(bootstrap: Bootstrap, runtime: RuntimeSource) -> Self {
        Self {
            bootstrap,
            runtime,
            options: ParseOptions::default(),
        }
    }

    /// Generator described by a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured bootstrap settings are invalid.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(config.bootstrap()?, config.runtime_source()))
    }

    #[must_use]
    /// Replaces the options used to parse input scripts.
    pub fn with_options(mut self, options: ParseOptions) -> Self {
        self.options = options;
        self
    }

    /// Parses a script without changing it.
    ///
    /// # Errors
    ///
    /// Returns an error if the script cannot be read or has malformed markers.
    pub fn read(&self, script: &ScriptPath) -> Result<Document> {
        match script {
            ScriptPath::Stdio => Document::parse_with(io::stdin().lock(), self.options),
            ScriptPath::File(path) => {
                Document::parse_with(BufReader::new(File::open(path)?), self.options)
            }
        }
    }

    /// Parses `input` and returns it normalized for `mode`.
    ///
    /// # Errors
    ///
    /// Returns an error if the input has malformed markers or, when
    /// distributing, the runtime cannot be archived.
    pub fn render<R: BufRead>(&self, input: R, mode: Mode) -> Result<Document> {
        let mut document = Document::parse_with(input, self.options)?;
        let payload = self.payload(mode)?;
        document.normalize(&self.bootstrap, payload.as_ref());
        Ok(document)
    }

    /// Regenerates `script`, in place for a file or from stdin to stdout.
    ///
    /// # Errors
    ///
    /// Returns an error if reading, parsing, archiving or writing fails. A
    /// file is left unchanged on error.
    pub fn generate(&self, script: &ScriptPath, mode: Mode) -> Result<()> {
        match script {
            ScriptPath::Stdio => {
                let document = self.render(io::stdin().lock(), mode)?;
                document.write(BufWriter::new(io::stdout().lock()))?;
            }
            ScriptPath::File(path) => {
                let document = self.render(BufReader::new(File::open(path)?), mode)?;
                replace_file(path, &document)?;
            }
        }
        info!(script = %script, ?mode, "generated script");
        Ok(())
    }

    fn payload(&self, mode: Mode) -> Result<Option<Payload>> {
        match mode {
            Mode::Header => Ok(None),
            Mode::Distributable => self.runtime.archive().map(Some),
        }
    }
}

/// Writes `document` over `path` through a synced temporary sibling.
fn replace_file(path: &Path, document: &Document) -> Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .map_or_else(|| "script".into(), |name| name.to_string_lossy());
    let permissions = fs::metadata(path)?.permissions();

    let mut temp = tempfile::Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(".tmp")
        .tempfile_in(parent)?;
    debug!(temp = %temp.path().display(), "writing temporary file");

    let mut out = BufWriter::new(temp.as_file_mut());
    document.write(&mut out)?;
    drop(out);

    let file = temp.as_file();
    file.sync_all()?;
    file.set_permissions(executable(&permissions))?;

    temp.persist(path).map_err(|e| e.error)?;
    debug!(path = %path.display(), "replaced script");
    Ok(())
}

#[cfg(unix)]
fn executable(permissions: &Permissions) -> Permissions {
    use std::os::unix::fs::PermissionsExt;
    Permissions::from_mode((permissions.mode() & 0o7777) | 0o100)
}

#[cfg(not(unix))]
fn executable(permissions: &Permissions) -> Permissions {
    permissions.clone()
}

#[cfg(test)]
#[path = "tests/generate.rs"]
mod tests;

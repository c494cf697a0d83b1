//! Configuration to acknowledge developer preferences as well as set defaults.
//!
//! We look for a pysh.toml in the working directory (or the file passed with
//! `--config`), and if present load settings from there. This provides the
//! interpreter ranking, the runtime module name and where its sources live.

use crate::archive::RuntimeSource;
use crate::bootstrap::{default_interpreters, Bootstrap, DEFAULT_INSTALL_HINT, DEFAULT_MODULE};
use crate::error::Result;
use facet::Facet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File looked up in the working directory when no path is given.
pub const CONFIG_FILE_NAME: &str = "pysh.toml";

#[derive(Facet, Clone, Debug, PartialEq, Eq)]
/// User preferences loaded from pysh.toml or falling back to defaults.
pub struct Config {
    #[facet(default = default_interpreters())]
    /// Interpreter binaries the bootstrap tries, preferred first.
    pub interpreters: Vec<String>,
    #[facet(default = DEFAULT_MODULE.to_string())]
    /// Module the driver imports and the top-level name inside the archive.
    pub runtime_module: String,
    #[facet(default = DEFAULT_MODULE.to_string())]
    /// Source tree archived when distributing.
    pub runtime_dir: String,
    #[facet(default = vec!["py".to_string()])]
    /// File suffixes collected from the runtime tree.
    pub runtime_extensions: Vec<String>,
    #[facet(default = DEFAULT_INSTALL_HINT.to_string())]
    /// Command shown when no interpreter can load the runtime.
    pub install_hint: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::parse("").unwrap_or_else(|| Self {
            interpreters: default_interpreters(),
            runtime_module: DEFAULT_MODULE.to_string(),
            runtime_dir: DEFAULT_MODULE.to_string(),
            runtime_extensions: vec!["py".to_string()],
            install_hint: DEFAULT_INSTALL_HINT.to_string(),
        })
    }
}

impl Config {
    #[must_use]
    /// Load configuration from pysh.toml if present.
    pub fn load() -> Self {
        Self::load_from(Path::new(CONFIG_FILE_NAME))
    }

    #[must_use]
    /// Load configuration from `path`, using defaults if it is missing or malformed.
    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|| {
                warn!(path = %path.display(), "ignoring malformed configuration");
                Self::default()
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no configuration file, using defaults");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "cannot read configuration");
                Self::default()
            }
        }
    }

    #[must_use]
    /// Parse TOML text, with every missing key taking its default.
    pub fn parse(contents: &str) -> Option<Self> {
        facet_toml::from_str::<Self>(contents).ok()
    }

    /// Bootstrap settings described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an interpreter, the runtime module or the install
    /// hint cannot be embedded in a script.
    pub fn bootstrap(&self) -> Result<Bootstrap> {
        Bootstrap::new(
            self.interpreters.clone(),
            self.runtime_module.as_str(),
            self.install_hint.as_str(),
        )
    }

    #[must_use]
    /// Runtime tree to archive when distributing.
    pub fn runtime_source(&self) -> RuntimeSource {
        RuntimeSource {
            root: PathBuf::from(&self.runtime_dir),
            module: self.runtime_module.clone(),
            extensions: self.runtime_extensions.clone(),
        }
    }
}

#[cfg(test)]
#[path = "tests/config.rs"]
mod tests;

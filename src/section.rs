//! Named metadata sections and the marker grammar that delimits them.
//!
//! A section is written as
//!
//! ```text
//! <leading lines>
//! # <name> -->
//! <content lines>
//! # <-- <name>
//! ```
//!
//! Both marker lines are shell comments, so sections are inert when the
//! script runs. Names are restricted to letters, digits, spaces and dashes.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static START_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^# ([A-Za-z0-9 -]+) -->$").expect("valid start marker pattern"));

static END_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^# <-- ([A-Za-z0-9 -]+)$").expect("valid end marker pattern"));

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
/// Named block of metadata lines inside a script.
pub struct Section {
    /// Lines between the previous section (or the directive) and the start marker.
    pub leading: Vec<String>,
    /// Section name as it appears in both markers.
    pub name: String,
    /// Lines between the start and end markers.
    pub content: Vec<String>,
}

impl Section {
    #[must_use]
    /// Builds a section from its parts.
    pub fn new(leading: Vec<String>, name: impl Into<String>, content: Vec<String>) -> Self {
        Self {
            leading,
            name: name.into(),
            content,
        }
    }

    #[must_use]
    /// The `# <name> -->` line opening this section.
    pub fn start_marker(&self) -> String {
        format!("# {} -->", self.name)
    }

    #[must_use]
    /// The `# <-- <name>` line closing this section.
    pub fn end_marker(&self) -> String {
        format!("# <-- {}", self.name)
    }
}

/// Name opened by `line`, if it is a start marker.
pub(crate) fn match_start(line: &str) -> Option<String> {
    START_MARKER
        .captures(line)
        .map(|caps| caps[1].to_string())
}

/// Name closed by `line` and the 1-based column it starts at, if it is an end marker.
pub(crate) fn match_end(line: &str) -> Option<(String, usize)> {
    let caps = END_MARKER.captures(line)?;
    let name = caps.get(1)?;
    Some((name.as_str().to_string(), name.start() + 1))
}

#[cfg(test)]
#[path = "tests/section.rs"]
mod tests;

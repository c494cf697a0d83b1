//! A PySH script as named sections around an opaque body.
//!
//! Parsing never interprets the script body; it only recognises the directive
//! line, section markers and the embedded-payload notice. Text that does not
//! look like a PySH script at all parses as pure content, so any file can be
//! turned into one.
//!
//! [`Document::normalize`] rebuilds the two reserved sections (information
//! first, bootstrap last) and keeps every other section in place, which makes
//! regeneration idempotent. [`Document::write`] joins every output line with
//! `\n`, the exact inverse of how the scanner splits its input, so a written
//! document parses back to the same sections and content.

use crate::archive::Payload;
use crate::bootstrap::{Bootstrap, EMBEDDED_NOTICE};
use crate::error::{Error, Result};
use crate::scanner::LineScanner;
use crate::section::{self, Section};
use serde::Serialize;
use std::io::{self, BufRead, Write};
use tracing::{debug, warn};

/// First line of every generated script.
pub const DIRECTIVE: &str = "#!/bin/sh -e";

/// Name of the reserved section describing the script.
pub const INFO_SECTION_NAME: &str = "PySH Information";

/// Name of the reserved section holding the shell bootstrap.
pub const BOOTSTRAP_SECTION_NAME: &str = "PySH Bootstrap";

/// Revision of the on-disk layout, quoted in the information section.
pub const FORMAT_VERSION: u32 = 1;

#[must_use]
/// Content of the information section.
pub fn info_lines() -> Vec<String> {
    vec![
        format!("# This is a PySH script (format {FORMAT_VERSION}), a shell script written in Python."),
        "# It requires Python 3 and the `pysh` package.".to_string(),
    ]
}

#[derive(Clone, Copy, Debug, Default)]
/// Knobs for [`Document::parse_with`].
pub struct ParseOptions {
    /// Only accept the exact [`DIRECTIVE`] as a directive line, not any `#!` line.
    pub canonical_directive: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Parsed script: ordered unique sections, trailing content, optional payload.
pub struct Document {
    directive: bool,
    sections: Vec<Section>,
    content: Vec<String>,
    embedded: Option<Vec<String>>,
}

#[derive(Serialize)]
/// Serialisable view of a document's structure.
pub struct Outline<'a> {
    /// Whether the first line was recognised as a directive.
    pub directive: bool,
    /// Sections in file order.
    pub sections: &'a [Section],
    /// Untagged body lines.
    pub content: &'a [String],
    /// Whether a runtime payload is embedded.
    pub distributable: bool,
}

impl Document {
    /// Parses a script with default options.
    ///
    /// # Errors
    ///
    /// Returns an error on mismatched or unterminated section markers, or if
    /// reading fails.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self> {
        Self::parse_with(reader, ParseOptions::default())
    }

    /// Parses a script held in memory.
    ///
    /// # Errors
    ///
    /// Returns an error on mismatched or unterminated section markers.
    pub fn parse_str(text: &str) -> Result<Self> {
        Self::parse(text.as_bytes())
    }

    /// Parses a script.
    ///
    /// # Errors
    ///
    /// Returns an error on mismatched or unterminated section markers, or if
    /// reading fails.
    pub fn parse_with<R: BufRead>(reader: R, options: ParseOptions) -> Result<Self> {
        let mut scanner = LineScanner::new(reader);

        let directive = scanner
            .peek()?
            .is_some_and(|line| is_directive(line, options));
        if directive {
            scanner.fetch(true);
        }

        let mut document = Self {
            directive,
            ..Self::default()
        };
        while let Some(section) = parse_section(&mut scanner)? {
            debug!(name = %section.name, lines = section.content.len(), "parsed section");
            document.insert_section(section);
        }

        let mut content = scanner.fetch(true).lines;
        if let Some(notice) = content.iter().position(|line| line == EMBEDDED_NOTICE) {
            document.embedded = Some(content.split_off(notice + 1));
            content.truncate(notice);
        }

        if !directive && document.sections.is_empty() {
            debug!("no directive or sections found, treating the whole file as content");
        }
        document.content = content;

        Ok(document)
    }

    #[must_use]
    /// Whether the first line was recognised as a directive.
    pub fn has_directive(&self) -> bool {
        self.directive
    }

    #[must_use]
    /// Sections in file order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    #[must_use]
    /// Looks up a section by name.
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|section| section.name == name)
    }

    #[must_use]
    /// Untagged body lines following the sections.
    pub fn content(&self) -> &[String] {
        &self.content
    }

    #[must_use]
    /// Whether a runtime payload follows the content.
    pub fn is_distributable(&self) -> bool {
        self.embedded.is_some()
    }

    #[must_use]
    /// Lines written after the embedded notice, if any.
    pub fn embedded(&self) -> Option<&[String]> {
        self.embedded.as_deref()
    }

    #[must_use]
    /// Structure of the document for display.
    pub fn outline(&self) -> Outline<'_> {
        Outline {
            directive: self.directive,
            sections: &self.sections,
            content: &self.content,
            distributable: self.is_distributable(),
        }
    }

    /// Adds `section`, replacing a section of the same name in its original position.
    pub fn insert_section(&mut self, section: Section) {
        match self.sections.iter_mut().find(|s| s.name == section.name) {
            Some(existing) => *existing = section,
            None => self.sections.push(section),
        }
    }

    /// Rebuilds the reserved sections and attaches or drops the payload.
    ///
    /// The information section comes first and the bootstrap section last;
    /// older copies of either are discarded. Other sections keep their order,
    /// and one with no leading lines gets a blank separator line. Passing a
    /// payload makes the script distributable.
    pub fn normalize(&mut self, bootstrap: &Bootstrap, payload: Option<&Payload>) {
        let previous = std::mem::take(&mut self.sections);

        self.sections.push(Section::new(
            vec!["#".to_string()],
            INFO_SECTION_NAME,
            info_lines(),
        ));
        for mut section in previous {
            if is_reserved(&section.name) {
                continue;
            }
            if section.leading.is_empty() {
                section.leading.push(String::new());
            }
            self.sections.push(section);
        }
        self.sections.push(Section::new(
            vec![String::new()],
            BOOTSTRAP_SECTION_NAME,
            bootstrap.lines(payload.is_some()),
        ));

        if let (None, Some(dropped)) = (payload, &self.embedded) {
            if Payload::is_block(dropped) {
                debug!("dropping embedded runtime payload");
            } else {
                warn!(
                    lines = dropped.len(),
                    "dropping lines that follow the embedded-module notice"
                );
            }
        }

        self.directive = true;
        self.embedded = payload.map(Payload::to_lines);
    }

    /// Serialises the document.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write<W: Write>(&self, mut out: W) -> io::Result<()> {
        let mut first = true;
        let mut emit = |line: &str| -> io::Result<()> {
            if !first {
                out.write_all(b"\n")?;
            }
            first = false;
            out.write_all(line.as_bytes())
        };

        emit(DIRECTIVE)?;
        for section in &self.sections {
            for line in &section.leading {
                emit(line.as_str())?;
            }
            emit(section.start_marker().as_str())?;
            for line in &section.content {
                emit(line.as_str())?;
            }
            emit(section.end_marker().as_str())?;
        }
        for line in &self.content {
            emit(line.as_str())?;
        }
        if let Some(embedded) = &self.embedded {
            emit(EMBEDDED_NOTICE)?;
            for line in embedded {
                emit(line.as_str())?;
            }
        }

        out.flush()
    }

    #[must_use]
    /// Serialises the document to a string.
    ///
    /// # Panics
    ///
    /// Never in practice: writing into a `Vec` cannot fail and every line is
    /// already a `String`.
    pub fn to_text(&self) -> String {
        let mut buf = Vec::new();
        self.write(&mut buf).expect("writing into a Vec cannot fail");
        String::from_utf8(buf).expect("document lines are valid UTF-8")
    }
}

fn is_directive(line: &str, options: ParseOptions) -> bool {
    line.starts_with("#!") && (!options.canonical_directive || line == DIRECTIVE)
}

fn is_reserved(name: &str) -> bool {
    name == INFO_SECTION_NAME || name == BOOTSTRAP_SECTION_NAME
}

/// Reads the next section, or `None` once no start marker remains.
///
/// Lines before the start marker become the section's leading lines. When
/// `None` is returned every remaining line has been consumed into the
/// scanner's window.
fn parse_section<R: BufRead>(scanner: &mut LineScanner<R>) -> Result<Option<Section>> {
    let name = loop {
        let Some(line) = scanner.peek()? else {
            return Ok(None);
        };
        if let Some(name) = section::match_start(line) {
            break name;
        }
        scanner.advance()?;
    };
    let leading = scanner.fetch(false).lines;
    scanner.advance()?;
    scanner.fetch(true);

    loop {
        let Some(line) = scanner.peek()? else {
            return Err(Error::UnterminatedSection { name });
        };
        if let Some((found, column)) = section::match_end(line) {
            if found != name {
                return Err(Error::SectionMismatch {
                    line: scanner.peek_line_number(),
                    column,
                    expected: name,
                    found,
                });
            }
            let content = scanner.fetch(false).lines;
            scanner.advance()?;
            scanner.fetch(true);
            return Ok(Some(Section::new(leading, name, content)));
        }
        scanner.advance()?;
    }
}

#[cfg(test)]
#[path = "tests/document.rs"]
mod tests;

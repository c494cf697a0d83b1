//! Pull-based line reader with one line of lookahead and a capture window.
//!
//! Every consumed line is appended to the current window; [`LineScanner::fetch`]
//! hands the window back and starts a new one. The section parser uses this to
//! slice a script into "lines before a marker", "lines between markers" and
//! "everything after", without ever holding more than one unconsumed line.
//!
//! Line terminators are stripped. If the input ends with a terminator, one
//! extra empty line is produced before end-of-input, so `"a\n"` scans as
//! `["a", ""]` while `"a"` scans as `["a"]`. Joining the lines with `\n`
//! therefore reproduces the original text.

use std::io::{self, BufRead};
use std::mem;

#[derive(Debug, Default, PartialEq, Eq)]
/// Lines consumed since the previous fetch.
pub struct Capture {
    /// Line number of the first captured line, if any were captured.
    pub start: Option<usize>,
    /// Captured lines, terminators stripped.
    pub lines: Vec<String>,
}

/// Line reader over any buffered source.
pub struct LineScanner<R> {
    reader: R,
    peeked: Option<String>,
    peek_line_number: usize,
    ended_with_terminator: bool,
    exhausted: bool,
    window: Vec<String>,
    window_start: Option<usize>,
}

impl<R: BufRead> LineScanner<R> {
    /// Wraps `reader`; nothing is read until the first peek.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            peeked: None,
            peek_line_number: 0,
            ended_with_terminator: false,
            exhausted: false,
            window: Vec::new(),
            window_start: None,
        }
    }

    /// Returns the next unconsumed line without consuming it.
    ///
    /// Repeated calls return the same line and leave the line counter alone.
    /// `None` signals end of input.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails or yields invalid UTF-8.
    pub fn peek(&mut self) -> io::Result<Option<&str>> {
        if self.peeked.is_none() {
            self.peeked = self.read_line()?;
        }
        Ok(self.peeked.as_deref())
    }

    /// Consumes the peeked line (peeking first if needed) into the window.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reader fails or yields invalid UTF-8.
    pub fn advance(&mut self) -> io::Result<Option<&str>> {
        self.peek()?;
        if !self.commit_peeked() {
            return Ok(None);
        }
        Ok(self.window.last().map(String::as_str))
    }

    #[must_use]
    /// 1-based number of the most recently peeked line (0 before any peek).
    pub fn peek_line_number(&self) -> usize {
        self.peek_line_number
    }

    /// Hands back the current window and starts a new one.
    ///
    /// With `include_peeked` set, a line that has been peeked but not consumed is
    /// consumed first and ends up in the returned capture. Without it, that line
    /// stays pending and becomes the first line of the next window.
    pub fn fetch(&mut self, include_peeked: bool) -> Capture {
        if include_peeked {
            self.commit_peeked();
        }
        Capture {
            start: self.window_start.take(),
            lines: mem::take(&mut self.window),
        }
    }

    fn commit_peeked(&mut self) -> bool {
        let Some(line) = self.peeked.take() else {
            return false;
        };
        if self.window.is_empty() {
            self.window_start = Some(self.peek_line_number);
        }
        self.window.push(line);
        true
    }

    fn read_line(&mut self) -> io::Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            self.exhausted = true;
            if !self.ended_with_terminator {
                return Ok(None);
            }
        } else {
            self.ended_with_terminator = line.ends_with('\n');
            let kept = line.trim_end_matches(['\r', '\n']).len();
            line.truncate(kept);
        }

        self.peek_line_number += 1;
        Ok(Some(line))
    }
}

#[cfg(test)]
#[path = "tests/scanner.rs"]
mod tests;

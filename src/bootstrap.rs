//! Shell statements that find a Python interpreter and hand the script to it.
//!
//! The bootstrap section is read twice, by two different parsers:
//!
//! * `/bin/sh` executes it. Every line is `"eval" "word" "word" ...`, so the
//!   shell strips one level of double-quote escaping and `eval` runs the rest.
//! * The PySH runtime later compiles the whole file as Python. There the same
//!   line is a run of adjacent string literals, a harmless expression.
//!
//! Both readers agree because every word goes through [`quote_word`], which
//! only produces escapes that are valid inside both kinds of double-quoted
//! string. The Python driver itself is embedded as one shell variable and is
//! escaped twice: once for the `py="..."` assignment run by `eval`, and once
//! more as a word of the outer `eval` line.
//!
//! At run time each candidate interpreter is tried in order. The driver exits
//! with [`SENTINEL_EXIT_CODE`] when it cannot import the runtime module, which
//! tells the shell to move on to the next candidate. Any other status is the
//! script's own and is returned immediately.

use crate::error::{Error, Result};
use regex::Regex;
use std::sync::LazyLock;

static INTERPRETER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9_./+][A-Za-z0-9_./+-]*$").expect("valid interpreter pattern")
});

static MODULE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$")
        .expect("valid module pattern")
});

/// Exit status meaning "the driver ran but the runtime module is missing".
pub const SENTINEL_EXIT_CODE: u8 = 253;

/// Line separating the script content from the embedded runtime payload.
pub const EMBEDDED_NOTICE: &str = "# PySH: Module embedded below";

/// Runtime module imported by the driver unless configured otherwise.
pub const DEFAULT_MODULE: &str = "pysh";

/// Install instruction printed when no interpreter can load the runtime.
pub const DEFAULT_INSTALL_HINT: &str =
    "pip install https://github.com/areusch/pysh/archive/master.zip";

#[must_use]
/// Interpreters tried by default, preferred first.
pub fn default_interpreters() -> Vec<String> {
    vec!["python3".to_string(), "python".to_string()]
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Settings that shape the generated bootstrap.
pub struct Bootstrap {
    interpreters: Vec<String>,
    module: String,
    install_hint: String,
}

impl Default for Bootstrap {
    fn default() -> Self {
        Self {
            interpreters: default_interpreters(),
            module: DEFAULT_MODULE.to_string(),
            install_hint: DEFAULT_INSTALL_HINT.to_string(),
        }
    }
}

impl Bootstrap {
    /// Bootstrap trying `interpreters` in order and importing `module`.
    ///
    /// Every value ends up inside shell text run by `eval` or inside the
    /// Python driver, so only values that need no quoting there are accepted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBootstrap`] if no interpreter is given, an
    /// interpreter is not a plain command name or path, the module is not a
    /// dotted Python identifier, or the hint holds a quote, backquote,
    /// backslash or line break.
    pub fn new(
        interpreters: Vec<String>,
        module: impl Into<String>,
        install_hint: impl Into<String>,
    ) -> Result<Self> {
        let module = module.into();
        let install_hint = install_hint.into();

        if interpreters.is_empty() {
            return Err(Error::InvalidBootstrap {
                field: "interpreters",
                value: String::new(),
                reason: "at least one interpreter is required",
            });
        }
        if let Some(bad) = interpreters.iter().find(|name| !INTERPRETER.is_match(name)) {
            return Err(Error::InvalidBootstrap {
                field: "interpreter",
                value: bad.clone(),
                reason: "expected a command name or path made of letters, digits and ._/+-",
            });
        }
        if !MODULE.is_match(&module) {
            return Err(Error::InvalidBootstrap {
                field: "runtime module",
                value: module,
                reason: "expected a dotted Python identifier",
            });
        }
        if install_hint.contains(['"', '`', '\\', '\n', '\r']) {
            return Err(Error::InvalidBootstrap {
                field: "install hint",
                value: install_hint,
                reason: "must not contain quotes, backquotes, backslashes or line breaks",
            });
        }

        Ok(Self {
            interpreters,
            module,
            install_hint,
        })
    }

    #[must_use]
    /// Candidate interpreter binaries, preferred first.
    pub fn interpreters(&self) -> &[String] {
        &self.interpreters
    }

    #[must_use]
    /// Name of the runtime module the driver imports.
    pub fn module(&self) -> &str {
        &self.module
    }

    #[must_use]
    /// Python program fed to the interpreter.
    ///
    /// `$0` is left in place; the shell substitutes the script path when it
    /// assigns the program to its variable.
    pub fn driver(&self, distribute: bool) -> String {
        let module = &self.module;
        if distribute {
            format!(
                "from base64 import b64decode\n\
                 import sys\n\
                 import tempfile\n\
                 with open('$0') as script_f:\n\
                 \x20 with tempfile.NamedTemporaryFile(suffix='.zip') as f:\n\
                 \x20   f.write(b64decode(eval(script_f.read().split('{EMBEDDED_NOTICE}\\n', 1)[1])))\n\
                 \x20   f.flush()\n\
                 \x20   sys.path.insert(0, f.name)\n\
                 \x20   import {module}\n\
                 \x20   {module}.main('$0')\n"
            )
        } else {
            format!(
                "import sys\n\
                 try:\n\
                 \x20 import {module}\n\
                 except ImportError:\n\
                 \x20 sys.exit({SENTINEL_EXIT_CODE})\n\
                 {module}.main('$0')\n"
            )
        }
    }

    #[must_use]
    /// Content lines of the bootstrap section.
    pub fn lines(&self, distribute: bool) -> Vec<String> {
        let py = escape_backslashes(&self.driver(distribute)).replace('\n', "\\n");
        let sentinel = SENTINEL_EXIT_CODE;

        let mut statements: Vec<Vec<String>> = vec![vec![
            format!("py=\"{py}\""),
            format!("code={sentinel};"),
            "if (set -o pipefail) 2>/dev/null; then set -o pipefail; fi".to_string(),
        ]];

        let fall_through = format!("if [ $code -ne {sentinel} ]; then exit $code; fi;");
        for interpreter in &self.interpreters {
            let lookup = format!("python_bin=`command -v {interpreter} || true`;");
            statements.push(
                [
                    lookup.as_str(),
                    "if [ -n \"${python_bin}\" ]; then",
                    "code=0;",
                    "(",
                    "printf",
                    "'%b'",
                    "\"${py}\"",
                    "|",
                    "(",
                    "\"${python_bin}\"",
                    "/dev/fd/3",
                    "\"$@\"",
                    "0<&4",
                    ")",
                    "3<&0",
                    ")",
                    "4<&0",
                    "||",
                    "code=$?;",
                    fall_through.as_str(),
                    "fi",
                ]
                .iter()
                .map(ToString::to_string)
                .collect(),
            );
        }

        statements.push(vec![
            format!("if [ $code -eq {sentinel} ]; then"),
            format!(
                "echo \"pysh: script $0 requires the {} package. Install it with:\" >&2;",
                self.module
            ),
            format!("echo \"      $ {}\" >&2;", self.install_hint),
            "fi".to_string(),
        ]);
        statements.push(vec!["exit".to_string(), "$code".to_string()]);

        statements
            .iter()
            .map(|words| {
                std::iter::once("eval")
                    .chain(words.iter().map(String::as_str))
                    .map(quote_word)
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect()
    }
}

#[must_use]
/// Bootstrap lines for the default interpreters and runtime module.
pub fn make_bootstrap_lines(distribute: bool) -> Vec<String> {
    Bootstrap::default().lines(distribute)
}

#[must_use]
/// Triples every backslash escape so it survives one extra unescaping pass.
///
/// A backslash followed by any character other than a newline becomes three
/// backslashes followed by that character. A backslash at the very end is
/// doubled so it cannot swallow a closing quote.
pub fn escape_backslashes(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            push_escaped_backslash(&mut escaped, chars.next());
        } else {
            escaped.push(c);
        }
    }
    escaped
}

#[must_use]
/// Quotes `word` as a double-quoted string readable by both sh and Python.
///
/// Backslash escapes are tripled as in [`escape_backslashes`]; a bare `"` or
/// `$` gets a single backslash so the outer shell neither ends the word nor
/// expands a parameter. The character after an escaping backslash is never
/// escaped again.
pub fn quote_word(word: &str) -> String {
    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('"');

    let mut chars = word.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => push_escaped_backslash(&mut quoted, chars.next()),
            '"' | '$' => {
                quoted.push('\\');
                quoted.push(c);
            }
            _ => quoted.push(c),
        }
    }

    quoted.push('"');
    quoted
}

fn push_escaped_backslash(out: &mut String, next: Option<char>) {
    match next {
        Some('\n') => out.push_str("\\\n"),
        Some(c) => {
            out.push_str("\\\\\\");
            out.push(c);
        }
        None => out.push_str("\\\\"),
    }
}

#[cfg(test)]
#[path = "tests/bootstrap.rs"]
mod tests;

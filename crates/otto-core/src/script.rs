//! Command script format.
//!
//! A command script is a plain text file run by an interpreter:
//!
//! ```text
//! #!/bin/sh
//! # command: Ping
//! # args: host [count]
//! # Ping a host a few times.
//! ping -c "${2:-3}" "$1"
//! ```
//!
//! - Line 1 may be a shebang naming the interpreter (default `sh`).
//! - The `command:` declaration names the executable unit. It must match the
//!   capitalized command name for the script to load under that name.
//! - The optional `args:` line declares the argument signature: plain names
//!   are required, `[name]` optional, and a final `name...` takes the rest.
//! - Other comment lines in the leading block are the command's docs.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

static DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[ \t]*command:(.*)$").expect("valid regex"));

static SIGNATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#[ \t]*args:(.*)$").expect("valid regex"));

static SYMBOL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_-]*$").expect("valid regex"));

static DECLARATION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(#[ \t]*command:[ \t]*)[A-Za-z_][A-Za-z0-9_-]*").expect("valid regex")
});

/// Interpreter used when a script has no shebang.
pub const DEFAULT_INTERPRETER: &str = "sh";

/// Errors raised while reading a script.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The script could not be read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Script path.
        path: PathBuf,
        /// Underlying IO failure.
        source: std::io::Error,
    },

    /// The script header is malformed.
    #[error("Syntax error found:\nFile:{} ({line}, {column})\n{message}", path.display())]
    Syntax {
        /// Script path.
        path: PathBuf,
        /// 1-based line number.
        line: usize,
        /// 1-based column of the offending text.
        column: usize,
        /// What is wrong.
        message: String,
    },
}

/// Declared argument signature of a script.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Signature {
    /// Arguments that must be supplied.
    pub required: Vec<String>,
    /// Arguments that may be supplied, in order, after the required ones.
    pub optional: Vec<String>,
    /// Name of the trailing argument that swallows the rest, if any.
    pub rest: Option<String>,
}

impl Signature {
    /// Parse the text after `args:`.
    pub fn parse(text: &str) -> Result<Self, String> {
        let mut sig = Self::default();
        let tokens: Vec<&str> = text.split_whitespace().collect();

        for (i, token) in tokens.iter().enumerate() {
            if sig.rest.is_some() {
                return Err(format!("'{token}' follows a rest argument"));
            }
            if let Some(name) = token.strip_suffix("...") {
                if i + 1 != tokens.len() {
                    return Err(format!("rest argument '{token}' must come last"));
                }
                if name.is_empty() {
                    return Err(format!("rest argument '{token}' needs a name"));
                }
                sig.rest = Some(name.to_string());
            } else if let Some(name) = token.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
                if name.is_empty() {
                    return Err(format!("optional argument '{token}' needs a name"));
                }
                sig.optional.push(name.to_string());
            } else if sig.optional.is_empty() {
                sig.required.push((*token).to_string());
            } else {
                return Err(format!("required argument '{token}' follows an optional one"));
            }
        }
        Ok(sig)
    }

    /// Whether `count` arguments satisfy the signature.
    pub fn accepts(&self, count: usize) -> bool {
        count >= self.required.len()
            && (self.rest.is_some() || count <= self.required.len() + self.optional.len())
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self.required.clone();
        parts.extend(self.optional.iter().map(|o| format!("[{o}]")));
        if let Some(rest) = &self.rest {
            parts.push(format!("[{rest} ...]"));
        }
        f.write_str(&parts.join(" "))
    }
}

/// A parsed command script header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Script {
    /// Where the script lives.
    pub path: PathBuf,
    /// Interpreter and its leading arguments (from the shebang).
    pub interpreter: Vec<String>,
    /// Declared symbol, if any.
    pub symbol: Option<String>,
    /// Declared argument signature, if any.
    pub signature: Option<Signature>,
    /// Documentation from the leading comment block.
    pub docs: Option<String>,
}

impl Script {
    /// Read and parse a script file.
    pub fn load(path: &Path) -> Result<Self, LoadError> {
        let source = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(path, &source)
    }

    /// Parse script text read from `path`.
    pub fn parse(path: &Path, source: &str) -> Result<Self, LoadError> {
        let syntax = |line: usize, column: usize, message: String| LoadError::Syntax {
            path: path.to_path_buf(),
            line,
            column,
            message,
        };

        let mut interpreter = vec![DEFAULT_INTERPRETER.to_string()];
        let mut symbol: Option<String> = None;
        let mut signature = None;
        let mut docs = Vec::new();
        let mut in_header = true;

        for (idx, line) in source.lines().enumerate() {
            let lineno = idx + 1;

            if idx == 0 {
                if let Some(shebang) = line.strip_prefix("#!") {
                    let parts: Vec<String> =
                        shebang.split_whitespace().map(str::to_string).collect();
                    if parts.is_empty() {
                        return Err(syntax(1, 3, "empty shebang".to_string()));
                    }
                    interpreter = parts;
                    continue;
                }
            }

            if let Some(caps) = DECLARATION.captures(line) {
                let rest = caps.get(1).map_or("", |m| m.as_str());
                let start = caps.get(1).map_or(line.len(), |m| m.start());
                let trimmed = rest.trim();
                let column = start + (rest.len() - rest.trim_start().len()) + 1;
                if !SYMBOL.is_match(trimmed) {
                    return Err(syntax(
                        lineno,
                        column,
                        format!("invalid command declaration: '{trimmed}'"),
                    ));
                }
                if symbol.is_some() {
                    return Err(syntax(
                        lineno,
                        column,
                        "duplicate command declaration".to_string(),
                    ));
                }
                symbol = Some(trimmed.to_string());
                continue;
            }

            if in_header {
                if let Some(caps) = SIGNATURE.captures(line) {
                    let rest = caps.get(1).map_or("", |m| m.as_str());
                    let column = caps.get(1).map_or(1, |m| m.start() + 1);
                    signature = Some(Signature::parse(rest).map_err(|m| syntax(lineno, column, m))?);
                } else if let Some(comment) = line.strip_prefix('#') {
                    docs.push(comment.strip_prefix(' ').unwrap_or(comment).to_string());
                } else if !line.trim().is_empty() {
                    in_header = false;
                }
            }
        }

        let docs = docs.join("\n").trim().to_string();
        Ok(Self {
            path: path.to_path_buf(),
            interpreter,
            symbol,
            signature,
            docs: (!docs.is_empty()).then_some(docs),
        })
    }
}

/// The first well-formed declared symbol in `source`, ignoring malformed
/// lines. Used when rebuilding indexes from scripts of unknown quality.
pub fn declared_symbol(source: &str) -> Option<String> {
    source.lines().find_map(|line| {
        let caps = DECLARATION.captures(line)?;
        let symbol = caps.get(1)?.as_str().trim();
        SYMBOL.is_match(symbol).then(|| symbol.to_string())
    })
}

/// Rewrite every declaration in `source` to declare `symbol`.
pub fn rename_symbol(source: &str, symbol: &str) -> String {
    DECLARATION_LINE
        .replace_all(source, |caps: &regex::Captures<'_>| format!("{}{symbol}", &caps[1]))
        .into_owned()
}

/// Boilerplate for a new command script.
pub fn template(symbol: &str, args: &[String]) -> String {
    let mut out = format!("#!/bin/sh\n# command: {symbol}\n");
    if !args.is_empty() {
        out.push_str(&format!("# args: {}\n", args.join(" ")));
    }
    out.push('\n');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const PING: &str = "#!/usr/bin/env bash -e\n# command: Ping\n# args: host [count]\n# Ping a host.\n#\n# Defaults to three packets.\nping -c \"${2:-3}\" \"$1\"\n# not docs\n";

    #[test]
    fn test_parse_full_header() {
        let script = Script::parse(Path::new("/p/ping.sh"), PING).unwrap();

        assert_eq!(script.interpreter, vec!["/usr/bin/env", "bash", "-e"]);
        assert_eq!(script.symbol.as_deref(), Some("Ping"));
        let sig = script.signature.unwrap();
        assert_eq!(sig.required, vec!["host"]);
        assert_eq!(sig.optional, vec!["count"]);
        assert_eq!(
            script.docs.as_deref(),
            Some("Ping a host.\n\nDefaults to three packets.")
        );
    }

    #[test]
    fn test_default_interpreter() {
        let script = Script::parse(Path::new("x"), "# command: X\necho hi\n").unwrap();
        assert_eq!(script.interpreter, vec!["sh"]);
        assert!(script.signature.is_none());
        assert!(script.docs.is_none());
    }

    #[test]
    fn test_missing_declaration_is_not_an_error() {
        let script = Script::parse(Path::new("x"), "echo hi\n").unwrap();
        assert!(script.symbol.is_none());
    }

    #[test]
    fn test_malformed_declaration_reports_position() {
        let err = Script::parse(Path::new("/p/bad.sh"), "#!/bin/sh\n# command: Not Valid\n")
            .unwrap_err();
        match err {
            LoadError::Syntax { line, column, .. } => {
                assert_eq!(line, 2);
                assert_eq!(column, 12);
            }
            LoadError::Io { .. } => panic!("expected syntax error"),
        }
    }

    #[test]
    fn test_duplicate_declaration_is_syntax_error() {
        let err = Script::parse(Path::new("x"), "# command: A\n# command: B\n").unwrap_err();
        assert!(matches!(err, LoadError::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_signature_rules() {
        let sig = Signature::parse("a [b] rest...").unwrap();
        assert!(!sig.accepts(0));
        assert!(sig.accepts(1));
        assert!(sig.accepts(7));
        assert_eq!(sig.to_string(), "a [b] [rest ...]");

        let fixed = Signature::parse("a b").unwrap();
        assert!(fixed.accepts(2));
        assert!(!fixed.accepts(3));

        assert!(Signature::parse("[a] b").is_err());
        assert!(Signature::parse("a... b").is_err());
        assert!(Signature::parse("a ...").is_err());
        assert!(Signature::parse("[]").is_err());
    }

    #[test]
    fn test_declared_symbol_skips_malformed() {
        assert_eq!(
            declared_symbol("# command: bad one\n# command: Good\n").as_deref(),
            Some("Good")
        );
        assert_eq!(declared_symbol("echo\n"), None);
    }

    #[test]
    fn test_rename_symbol() {
        let renamed = rename_symbol(PING, "Pong");
        assert!(renamed.contains("# command: Pong\n"));
        assert!(!renamed.contains("Ping\n"));
        assert!(renamed.contains("# Ping a host."));
    }

    #[test]
    fn test_template_declares_symbol() {
        let text = template("Deploy", &["env".to_string()]);
        let script = Script::parse(Path::new("d.sh"), &text).unwrap();
        assert_eq!(script.symbol.as_deref(), Some("Deploy"));
        assert_eq!(script.signature.unwrap().required, vec!["env"]);
    }
}

//! Error types and reporting for the shell.
//!
//! Every failure the core can produce is a `ShellError` carrying:
//! - an `ErrorKind` that tells the executor whether it is stage-local or
//!   fatal to the current line
//! - a human-readable message (with the OS description for I/O failures)
//! - optional hint text and the input line/column that triggered it

use std::fmt;
use std::io;

/// Categorized error types for better diagnostics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The underlying input stream failed
    Read,
    /// Lexical error, e.g. an unterminated quoted string
    Tokenize,
    /// A token appeared where the grammar does not allow it
    UnexpectedToken,
    /// `<` or `>` was not followed by a path
    MissingRedirectTarget,
    /// A redirection target could not be opened
    OpenRedirect,
    /// An anonymous pipe could not be created
    Pipe,
    /// A process could not be spawned
    Spawn,
    /// A builtin reported a failure
    Builtin,
    /// Error loading/parsing configuration
    Config,
}

impl ErrorKind {
    /// Whether the rest of the current line must be abandoned.
    pub fn aborts_line(self) -> bool {
        !matches!(self, ErrorKind::Spawn | ErrorKind::Builtin)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::Read => write!(f, "Read error"),
            ErrorKind::Tokenize => write!(f, "Syntax error"),
            ErrorKind::UnexpectedToken => write!(f, "Parse error"),
            ErrorKind::MissingRedirectTarget => write!(f, "Parse error"),
            ErrorKind::OpenRedirect => write!(f, "Redirection error"),
            ErrorKind::Pipe => write!(f, "Pipe error"),
            ErrorKind::Spawn => write!(f, "Execution error"),
            ErrorKind::Builtin => write!(f, "Builtin error"),
            ErrorKind::Config => write!(f, "Config error"),
        }
    }
}

/// Rich error type with context information
#[derive(Debug, Clone)]
pub struct ShellError {
    pub kind: ErrorKind,
    pub message: String,
    /// Additional context explaining what was being processed
    pub context: Option<String>,
    /// 1-based input line the error was raised on
    pub line: Option<usize>,
    /// 1-based column within that line
    pub position: Option<usize>,
}

impl ShellError {
    /// Create a new error with just the kind and message
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        ShellError {
            kind,
            message: message.into(),
            context: None,
            line: None,
            position: None,
        }
    }

    /// Wrap an OS failure, keeping its description in the message.
    pub fn io(kind: ErrorKind, what: impl fmt::Display, err: &io::Error) -> Self {
        ShellError::new(kind, format!("{what}: {}", describe_io_error(err)))
    }

    /// Add context string (e.g., "Expected: cmd < filename")
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Record where in the input the error was detected
    pub fn at(mut self, line: usize, column: usize) -> Self {
        self.line = Some(line);
        self.position = Some(column);
        self
    }

    /// Simplified display without location
    pub fn display_simple(&self) -> String {
        let mut msg = format!("{}: {}", self.kind, self.message);
        if let Some(context) = &self.context {
            msg.push_str(&format!("\n  hint: {}", context));
        }
        msg
    }
}

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        match (self.line, self.position) {
            (Some(line), Some(col)) => write!(f, " (line {line}, column {col})")?,
            (Some(line), None) => write!(f, " (line {line})")?,
            _ => {}
        }
        if let Some(context) = &self.context {
            write!(f, "\n  hint: {}", context)?;
        }
        Ok(())
    }
}

impl std::error::Error for ShellError {}

/// Strip the "(os error N)" suffix std appends, leaving the strerror text.
fn describe_io_error(err: &io::Error) -> String {
    let text = err.to_string();
    match text.find(" (os error") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

/// Convenience type alias for Results with ShellError
pub type ShellResult<T> = Result<T, ShellError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_os_description() {
        let err = io::Error::from_raw_os_error(libc::ENOENT);
        let shell_err = ShellError::io(ErrorKind::OpenRedirect, "in.txt", &err);
        assert_eq!(shell_err.message, "in.txt: No such file or directory");
        assert_eq!(shell_err.kind, ErrorKind::OpenRedirect);
    }

    #[test]
    fn display_includes_location_and_hint() {
        let err = ShellError::new(ErrorKind::MissingRedirectTarget, "expected a path after `<`")
            .at(3, 5)
            .with_context("Expected: cmd < filename");
        assert_eq!(
            err.to_string(),
            "Parse error: expected a path after `<` (line 3, column 5)\n  hint: Expected: cmd < filename"
        );
        assert_eq!(
            err.display_simple(),
            "Parse error: expected a path after `<`\n  hint: Expected: cmd < filename"
        );
    }

    #[test]
    fn only_stage_errors_keep_the_line_running() {
        assert!(!ErrorKind::Spawn.aborts_line());
        assert!(!ErrorKind::Builtin.aborts_line());
        assert!(ErrorKind::OpenRedirect.aborts_line());
        assert!(ErrorKind::UnexpectedToken.aborts_line());
    }
}

//! Tokens and commands shared by the tokenizer, parser and executor.
//!
//! - `Token` is what the tokenizer emits, one at a time.
//! - `Command` is one pipeline stage as assembled by the parser.
//! - `Terminator` tells the executor whether the pipeline continues.
use std::ffi::{OsStr, OsString};
use std::fmt;

mod command_parser;
mod redirection_parser;
mod tokenizer;

pub use command_parser::{parse_command, ParsedCommand};
pub use tokenizer::{Delimiter, Tokenizer};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Keyword {
    Pwd,
    Cd,
    Help,
    Exit,
}

impl Keyword {
    pub const ALL: [Keyword; 4] = [Keyword::Pwd, Keyword::Cd, Keyword::Help, Keyword::Exit];

    /// Exact, case-sensitive lookup.
    pub fn from_word(word: &str) -> Option<Keyword> {
        Keyword::from_bytes(word.as_bytes())
    }

    pub fn from_bytes(word: &[u8]) -> Option<Keyword> {
        Keyword::ALL.into_iter().find(|kw| kw.as_str().as_bytes() == word)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Pwd => "pwd",
            Keyword::Cd => "cd",
            Keyword::Help => "help",
            Keyword::Exit => "exit",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    Keyword(Keyword),
    QuotedString(OsString),
    Word(OsString),
    Pipe,
    RedirectIn,
    RedirectOut,
    EndOfLine,
    EndOfStream,
}

impl Token {
    /// Bytes a token contributes as an argument or path, if any.
    pub fn text(&self) -> Option<&OsStr> {
        match self {
            Token::Keyword(kw) => Some(OsStr::new(kw.as_str())),
            Token::QuotedString(text) | Token::Word(text) => Some(text),
            _ => None,
        }
    }

    pub fn into_text(self) -> Option<OsString> {
        match self {
            Token::Keyword(kw) => Some(OsString::from(kw.as_str())),
            Token::QuotedString(text) | Token::Word(text) => Some(text),
            _ => None,
        }
    }

    pub fn ends_line(&self) -> bool {
        matches!(self, Token::EndOfLine | Token::EndOfStream)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Token::Keyword(kw) => write!(f, "`{kw}`"),
            Token::QuotedString(text) => write!(f, "\"{}\"", text.to_string_lossy()),
            Token::Word(text) => write!(f, "`{}`", text.to_string_lossy()),
            Token::Pipe => f.write_str("`|`"),
            Token::RedirectIn => f.write_str("`<`"),
            Token::RedirectOut => f.write_str("`>`"),
            Token::EndOfLine => f.write_str("end of line"),
            Token::EndOfStream => f.write_str("end of input"),
        }
    }
}

/// The token that ended a command.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Terminator {
    Pipe,
    EndOfLine,
    EndOfStream,
}

/// Argument vector and redirections common to both command kinds.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct CommandSpec {
    /// argv-style; `args[0]` is the command name as typed.
    pub args: Vec<OsString>,
    pub stdin: Option<OsString>,
    pub stdout: Option<OsString>,
    pub feeds_pipe: bool,
}

impl CommandSpec {
    pub fn new(name: impl Into<OsString>) -> Self {
        Self {
            args: vec![name.into()],
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Command {
    Executable { path: OsString, spec: CommandSpec },
    Builtin { keyword: Keyword, spec: CommandSpec },
}

impl Command {
    pub fn spec(&self) -> &CommandSpec {
        match self {
            Command::Executable { spec, .. } | Command::Builtin { spec, .. } => spec,
        }
    }

    pub(crate) fn spec_mut(&mut self) -> &mut CommandSpec {
        match self {
            Command::Executable { spec, .. } | Command::Builtin { spec, .. } => spec,
        }
    }

    pub fn args(&self) -> &[OsString] {
        &self.spec().args
    }

    pub fn name(&self) -> &OsStr {
        match self {
            Command::Executable { path, .. } => path,
            Command::Builtin { keyword, .. } => OsStr::new(keyword.as_str()),
        }
    }

    pub fn feeds_pipe(&self) -> bool {
        self.spec().feeds_pipe
    }
}

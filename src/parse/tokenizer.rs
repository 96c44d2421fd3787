//! Tokenizer for shell input.
//!
//! Pulls bytes from a `ByteReader` and emits one token per call. A word that
//! ends on `|`, `<`, `>` or a newline leaves that delimiter in a one-slot
//! pushback so the next call can replay it.
use std::ffi::OsString;
use std::io::Read;
use std::os::unix::ffi::OsStringExt;

use log::debug;

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::{Keyword, Token};
use crate::reader::ByteReader;

/// Single-byte tokens that also end a bare word.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Delimiter {
    Newline,
    Pipe,
    RedirectIn,
    RedirectOut,
}

impl Delimiter {
    pub fn from_byte(byte: u8) -> Option<Delimiter> {
        match byte {
            b'\n' => Some(Delimiter::Newline),
            b'|' => Some(Delimiter::Pipe),
            b'<' => Some(Delimiter::RedirectIn),
            b'>' => Some(Delimiter::RedirectOut),
            _ => None,
        }
    }

    pub fn token(self) -> Token {
        match self {
            Delimiter::Newline => Token::EndOfLine,
            Delimiter::Pipe => Token::Pipe,
            Delimiter::RedirectIn => Token::RedirectIn,
            Delimiter::RedirectOut => Token::RedirectOut,
        }
    }
}

type Position = (usize, usize);

pub struct Tokenizer<R> {
    reader: ByteReader<R>,
    // Reused across tokens; every token copies its text out.
    lexeme: Vec<u8>,
    pending: Option<(Delimiter, Position)>,
    line: usize,
    column: usize,
    last_pos: Position,
    token_start: Position,
    // True when the last emitted token was EndOfLine/EndOfStream.
    line_finished: bool,
    exhausted: bool,
}

impl<R: Read> Tokenizer<R> {
    pub fn new(reader: ByteReader<R>) -> Self {
        Self {
            reader,
            lexeme: Vec::new(),
            pending: None,
            line: 1,
            column: 1,
            last_pos: (1, 1),
            token_start: (1, 1),
            line_finished: true,
            exhausted: false,
        }
    }

    pub fn from_read(inner: R) -> Self {
        Self::new(ByteReader::new(inner))
    }

    /// Current 1-based input line.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Line and column where the most recent token started.
    pub fn token_start(&self) -> (usize, usize) {
        self.token_start
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn next_token(&mut self) -> ShellResult<Token> {
        match self.scan() {
            Ok(token) => {
                self.line_finished = token.ends_line();
                debug!(
                    "token event=emit token={:?} line={} col={}",
                    token, self.token_start.0, self.token_start.1
                );
                Ok(token)
            }
            Err(err) => {
                self.line_finished = false;
                Err(err)
            }
        }
    }

    /// Skip whatever remains of the current line after an error.
    pub fn discard_line(&mut self) -> ShellResult<()> {
        if let Some((delim, _)) = self.pending.take() {
            if delim == Delimiter::Newline {
                self.line_finished = true;
                return Ok(());
            }
        }
        if self.line_finished {
            return Ok(());
        }
        let mut skipped = 0usize;
        while let Some(byte) = self.read()? {
            if byte == b'\n' {
                break;
            }
            skipped += 1;
        }
        debug!("token event=discard bytes={}", skipped);
        self.line_finished = true;
        Ok(())
    }

    fn read(&mut self) -> ShellResult<Option<u8>> {
        let byte = self
            .reader
            .next_byte()
            .map_err(|err| err.at(self.line, self.column))?;
        self.last_pos = (self.line, self.column);
        match byte {
            Some(b'\n') => {
                self.line += 1;
                self.column = 1;
            }
            Some(_) => self.column += 1,
            None => {}
        }
        Ok(byte)
    }

    fn scan(&mut self) -> ShellResult<Token> {
        if let Some((delim, pos)) = self.pending.take() {
            self.token_start = pos;
            return Ok(delim.token());
        }

        let first = loop {
            match self.read()? {
                Some(b' ' | b'\t') => continue,
                Some(byte) => {
                    self.token_start = self.last_pos;
                    break byte;
                }
                None => {
                    self.token_start = (self.line, self.column);
                    return Ok(Token::EndOfStream);
                }
            }
        };

        if let Some(delim) = Delimiter::from_byte(first) {
            return Ok(delim.token());
        }
        self.lexeme.clear();
        if first == b'"' {
            return self.scan_quoted();
        }
        self.scan_word(first)
    }

    fn scan_quoted(&mut self) -> ShellResult<Token> {
        loop {
            match self.read()? {
                Some(b'"') => break,
                Some(b'\\') => match self.read()? {
                    Some(byte @ (b'"' | b'\\')) => self.lexeme.push(byte),
                    Some(other) => {
                        self.lexeme.push(b'\\');
                        self.lexeme.push(other);
                    }
                    None => return Err(self.unterminated_quote()),
                },
                Some(byte) => self.lexeme.push(byte),
                None => return Err(self.unterminated_quote()),
            }
        }
        Ok(Token::QuotedString(self.take_lexeme()))
    }

    fn scan_word(&mut self, first: u8) -> ShellResult<Token> {
        let mut next = Some(first);
        while let Some(byte) = next {
            match byte {
                b' ' | b'\t' => break,
                b'\\' => match self.read()? {
                    Some(escaped) if is_escapable(escaped) => self.lexeme.push(escaped),
                    Some(other) => {
                        self.lexeme.push(b'\\');
                        self.lexeme.push(other);
                    }
                    None => {
                        self.lexeme.push(b'\\');
                        break;
                    }
                },
                _ => {
                    if let Some(delim) = Delimiter::from_byte(byte) {
                        self.pending = Some((delim, self.last_pos));
                        break;
                    }
                    self.lexeme.push(byte);
                }
            }
            next = self.read()?;
        }

        if let Some(keyword) = Keyword::from_bytes(&self.lexeme) {
            self.lexeme.clear();
            return Ok(Token::Keyword(keyword));
        }
        Ok(Token::Word(self.take_lexeme()))
    }

    fn take_lexeme(&mut self) -> OsString {
        let text = OsString::from_vec(self.lexeme.clone());
        self.lexeme.clear();
        text
    }

    fn unterminated_quote(&self) -> ShellError {
        ShellError::new(ErrorKind::Tokenize, "unterminated quoted string")
            .at(self.token_start.0, self.token_start.1)
            .with_context("Close the string with a matching \"")
    }
}

impl<R: Read> Iterator for Tokenizer<R> {
    type Item = ShellResult<Token>;

    /// Yields tokens up to and including `EndOfStream` or the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        let item = self.next_token();
        if matches!(item, Ok(Token::EndOfStream) | Err(_)) {
            self.exhausted = true;
        }
        Some(item)
    }
}

fn is_escapable(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'|' | b'<' | b'>' | b'\\')
}

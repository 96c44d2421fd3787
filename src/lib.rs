//! Byte-stream tokenizer, command parser and pipeline executor for a small
//! shell.
//!
//! The binary (feature `shell`) adds line editing, builtins and signal
//! handling on top. Fuzz targets and integration tests link only this
//! library.

pub mod cancel;
pub mod error;
pub mod execution;
pub mod parse;
pub mod reader;

pub use cancel::CancelToken;
pub use error::{ErrorKind, ShellError, ShellResult};
pub use execution::{BuiltinDispatcher, BuiltinStreams, Executor, LineOutcome, Reaped};
pub use parse::{
    parse_command, Command, CommandSpec, Keyword, ParsedCommand, Terminator, Token, Tokenizer,
};
pub use reader::ByteReader;

/// Tokenize a complete input string, including the final end-of-stream token.
pub fn tokenize_str(input: &str) -> ShellResult<Vec<Token>> {
    let mut tokenizer = Tokenizer::from_read(input.as_bytes());
    let mut tokens = Vec::new();
    loop {
        let token = tokenizer.next_token()?;
        let done = token == Token::EndOfStream;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

/// Parse the first line of `input` into its pipeline stages.
pub fn parse_line_str(input: &str) -> ShellResult<Vec<Command>> {
    let mut tokenizer = Tokenizer::from_read(input.as_bytes());
    let mut stages = Vec::new();
    loop {
        let parsed = parse_command(&mut tokenizer)?;
        stages.extend(parsed.command);
        if parsed.terminator != Terminator::Pipe {
            return Ok(stages);
        }
    }
}

/// Fuzz helper for parser-only targets.
pub fn fuzz_parse_bytes(data: &[u8]) {
    let mut tokenizer = Tokenizer::from_read(data);
    // Every call consumes input, so the loop is bounded by `data.len()`.
    loop {
        match parse_command(&mut tokenizer) {
            Ok(parsed) if parsed.terminator == Terminator::EndOfStream => return,
            Ok(_) => {}
            Err(err) if err.kind == ErrorKind::Read => return,
            Err(_) => {
                if tokenizer.discard_line().is_err() {
                    return;
                }
            }
        }
    }
}

use std::io::Read;

use log::debug;

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::redirection_parser::{apply_redirection, missing_target, RedirectSlot};
use crate::parse::{Command, CommandSpec, Terminator, Token, Tokenizer};

/// One parse step: the command (if the line was not empty) and the token
/// that ended it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParsedCommand {
    pub command: Option<Command>,
    pub terminator: Terminator,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ParseState {
    Args,
    ExpectPath(RedirectSlot),
}

/// Assemble one command, stopping after the `|` or line end that closes it.
pub fn parse_command<R: Read>(tokenizer: &mut Tokenizer<R>) -> ShellResult<ParsedCommand> {
    let token = tokenizer.next_token()?;
    let (line, col) = tokenizer.token_start();
    let command = match token {
        Token::Word(text) | Token::QuotedString(text) => Command::Executable {
            spec: CommandSpec::new(text.clone()),
            path: text,
        },
        Token::Keyword(keyword) => Command::Builtin {
            keyword,
            spec: CommandSpec::new(keyword.as_str()),
        },
        Token::EndOfLine => {
            return Ok(ParsedCommand {
                command: None,
                terminator: Terminator::EndOfLine,
            })
        }
        Token::EndOfStream => {
            return Ok(ParsedCommand {
                command: None,
                terminator: Terminator::EndOfStream,
            })
        }
        Token::RedirectIn => {
            return Err(redirect_before_command(tokenizer, RedirectSlot::Input, (line, col)))
        }
        Token::RedirectOut => {
            return Err(redirect_before_command(tokenizer, RedirectSlot::Output, (line, col)))
        }
        Token::Pipe => {
            return Err(ShellError::new(
                ErrorKind::UnexpectedToken,
                "expected a command, found `|`",
            )
            .at(line, col));
        }
    };
    debug!(
        "parse event=command kind={} name={}",
        kind_label(&command),
        command.name().to_string_lossy()
    );
    parse_arguments(tokenizer, command)
}

fn parse_arguments<R: Read>(
    tokenizer: &mut Tokenizer<R>,
    mut command: Command,
) -> ShellResult<ParsedCommand> {
    let mut state = ParseState::Args;
    loop {
        let token = tokenizer.next_token()?;
        match state {
            ParseState::ExpectPath(slot) => {
                apply_redirection(command.spec_mut(), slot, token, tokenizer.token_start())?;
                state = ParseState::Args;
            }
            ParseState::Args => {
                if let Some(slot) = RedirectSlot::from_token(&token) {
                    state = ParseState::ExpectPath(slot);
                    continue;
                }
                let terminator = match token {
                    Token::Pipe => Terminator::Pipe,
                    Token::EndOfLine => Terminator::EndOfLine,
                    Token::EndOfStream => Terminator::EndOfStream,
                    other => {
                        if let Some(text) = other.into_text() {
                            command.spec_mut().args.push(text);
                        }
                        continue;
                    }
                };
                command.spec_mut().feeds_pipe = terminator == Terminator::Pipe;
                debug!(
                    "parse event=done name={} argc={} terminator={:?}",
                    command.name().to_string_lossy(),
                    command.args().len(),
                    terminator
                );
                return Ok(ParsedCommand {
                    command: Some(command),
                    terminator,
                });
            }
        }
    }
}

/// `<` or `>` at the head of a command: a bare operator has no target,
/// anything else is a redirection with no command in front of it.
fn redirect_before_command<R: Read>(
    tokenizer: &mut Tokenizer<R>,
    slot: RedirectSlot,
    (line, col): (usize, usize),
) -> ShellError {
    let next = match tokenizer.next_token() {
        Ok(token) => token,
        Err(err) => return err,
    };
    if next.ends_line() || next == Token::Pipe {
        let (next_line, next_col) = tokenizer.token_start();
        return missing_target(slot, &next).at(next_line, next_col);
    }
    ShellError::new(
        ErrorKind::UnexpectedToken,
        "expected a command before redirection",
    )
    .at(line, col)
    .with_context("Redirections follow the command: cmd < in > out")
}

fn kind_label(command: &Command) -> &'static str {
    match command {
        Command::Executable { .. } => "executable",
        Command::Builtin { .. } => "builtin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsStr;
    use crate::parse::Keyword;

    fn parse_all(input: &str) -> ShellResult<Vec<ParsedCommand>> {
        let mut tokenizer = Tokenizer::from_read(input.as_bytes());
        let mut out = Vec::new();
        loop {
            let parsed = parse_command(&mut tokenizer)?;
            let last = parsed.terminator != Terminator::Pipe;
            out.push(parsed);
            if last {
                return Ok(out);
            }
        }
    }

    fn executable(parsed: &ParsedCommand) -> (&OsStr, &CommandSpec) {
        match parsed.command.as_ref().unwrap() {
            Command::Executable { path, spec } => (path.as_os_str(), spec),
            other => panic!("expected executable, got {other:?}"),
        }
    }

    #[test]
    fn three_stage_pipeline() {
        let parsed = parse_all("a | b | c\n").unwrap();
        assert_eq!(parsed.len(), 3);
        let names: Vec<&OsStr> = parsed.iter().map(|p| executable(p).0).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        let feeds: Vec<bool> = parsed.iter().map(|p| executable(p).1.feeds_pipe).collect();
        assert_eq!(feeds, vec![true, true, false]);
        assert_eq!(parsed[2].terminator, Terminator::EndOfLine);
    }

    #[test]
    fn redirections_in_and_out() {
        let parsed = parse_all("cat <in.txt >out.txt\n").unwrap();
        assert_eq!(parsed.len(), 1);
        let (path, spec) = executable(&parsed[0]);
        assert_eq!(path, "cat");
        assert_eq!(spec.args, vec!["cat"]);
        assert_eq!(spec.stdin.as_deref(), Some(OsStr::new("in.txt")));
        assert_eq!(spec.stdout.as_deref(), Some(OsStr::new("out.txt")));
        assert!(!spec.feeds_pipe);
    }

    #[test]
    fn redirections_between_arguments() {
        let parsed = parse_all("sort < in -r > out -u\n").unwrap();
        let (_, spec) = executable(&parsed[0]);
        assert_eq!(spec.args, vec!["sort", "-r", "-u"]);
        assert_eq!(spec.stdin.as_deref(), Some(OsStr::new("in")));
        assert_eq!(spec.stdout.as_deref(), Some(OsStr::new("out")));
    }

    #[test]
    fn lone_redirect_is_missing_target() {
        let err = parse_all("<\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingRedirectTarget);
        let err = parse_all(">").unwrap_err();
        assert_eq!(err.kind, ErrorKind::MissingRedirectTarget);
    }

    #[test]
    fn redirect_without_command_is_unexpected() {
        let err = parse_all("< in.txt cat\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
    }

    #[test]
    fn missing_target_before_pipe_or_newline() {
        assert_eq!(
            parse_all("cat > | wc\n").unwrap_err().kind,
            ErrorKind::MissingRedirectTarget
        );
        assert_eq!(
            parse_all("cat <\n").unwrap_err().kind,
            ErrorKind::MissingRedirectTarget
        );
        assert_eq!(
            parse_all("cat < > out\n").unwrap_err().kind,
            ErrorKind::UnexpectedToken
        );
    }

    #[test]
    fn empty_line_has_no_command() {
        let parsed = parse_all("\n").unwrap();
        assert_eq!(
            parsed,
            vec![ParsedCommand {
                command: None,
                terminator: Terminator::EndOfLine
            }]
        );
        let parsed = parse_all("   ").unwrap();
        assert_eq!(parsed[0].terminator, Terminator::EndOfStream);
        assert!(parsed[0].command.is_none());
    }

    #[test]
    fn quoted_arguments_reconstruct_argv() {
        let parsed = parse_all("echo \"a b\" c\n").unwrap();
        assert_eq!(executable(&parsed[0]).1.args, vec!["echo", "a b", "c"]);
    }

    #[test]
    fn quoted_head_is_executable() {
        let parsed = parse_all("\"/bin/my prog\" x\n").unwrap();
        let (path, spec) = executable(&parsed[0]);
        assert_eq!(path, "/bin/my prog");
        assert_eq!(spec.args[0].as_os_str(), path);
    }

    #[test]
    fn pipe_first_is_unexpected() {
        let err = parse_all("| cat\n").unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnexpectedToken);
        assert_eq!((err.line, err.position), (Some(1), Some(1)));
    }

    #[test]
    fn builtins_and_keyword_arguments() {
        let parsed = parse_all("cd /tmp\n").unwrap();
        match parsed[0].command.as_ref().unwrap() {
            Command::Builtin { keyword, spec } => {
                assert_eq!(*keyword, Keyword::Cd);
                assert_eq!(spec.args, vec!["cd", "/tmp"]);
            }
            other => panic!("expected builtin, got {other:?}"),
        }

        let parsed = parse_all("help pwd > out\n").unwrap();
        match parsed[0].command.as_ref().unwrap() {
            Command::Builtin { keyword, spec } => {
                assert_eq!(*keyword, Keyword::Help);
                assert_eq!(spec.args, vec!["help", "pwd"]);
                assert_eq!(spec.stdout.as_deref(), Some(OsStr::new("out")));
            }
            other => panic!("expected builtin, got {other:?}"),
        }

        let parsed = parse_all("echo cd exit\n").unwrap();
        assert_eq!(executable(&parsed[0]).1.args, vec!["echo", "cd", "exit"]);
    }

    #[test]
    fn last_line_without_newline() {
        let parsed = parse_all("ls -l").unwrap();
        assert_eq!(parsed[0].terminator, Terminator::EndOfStream);
        assert_eq!(executable(&parsed[0]).1.args, vec!["ls", "-l"]);
    }

    #[test]
    fn parsing_resumes_on_next_line() {
        let mut tokenizer = Tokenizer::from_read("a\nb | c\n".as_bytes());
        let first = parse_command(&mut tokenizer).unwrap();
        assert_eq!(first.terminator, Terminator::EndOfLine);
        let second = parse_command(&mut tokenizer).unwrap();
        assert_eq!(second.terminator, Terminator::Pipe);
        assert_eq!(second.command.unwrap().name(), "b");
    }
}

use pipesh::{parse_line_str, tokenize_str, Command, ErrorKind, Keyword, Token};

#[test]
fn pipeline_black_box() {
    let stages = parse_line_str("echo hi | cat\n").unwrap();
    assert_eq!(stages.len(), 2);
    assert_eq!(stages[0].args(), ["echo", "hi"]);
    assert!(stages[0].feeds_pipe());
    assert_eq!(stages[1].args(), ["cat"]);
    assert!(!stages[1].feeds_pipe());
}

#[test]
fn tokens_black_box() {
    let tokens = tokenize_str("ls -l|wc>out\n").unwrap();
    assert_eq!(
        tokens,
        vec![
            Token::Word("ls".into()),
            Token::Word("-l".into()),
            Token::Pipe,
            Token::Word("wc".into()),
            Token::RedirectOut,
            Token::Word("out".into()),
            Token::EndOfLine,
            Token::EndOfStream,
        ]
    );
}

#[test]
fn keywords_need_exact_match() {
    let tokens = tokenize_str("cdxyz cd").unwrap();
    assert_eq!(tokens[0], Token::Word("cdxyz".into()));
    assert_eq!(tokens[1], Token::Keyword(Keyword::Cd));
}

#[test]
fn builtin_stage_with_redirect() {
    let stages = parse_line_str("pwd >where.txt\n").unwrap();
    match &stages[0] {
        Command::Builtin { keyword, spec } => {
            assert_eq!(*keyword, Keyword::Pwd);
            assert_eq!(spec.stdout, Some("where.txt".into()));
        }
        other => panic!("expected builtin, got {other:?}"),
    }
}

#[test]
fn syntax_errors_black_box() {
    assert_eq!(parse_line_str("<\n").unwrap_err().kind, ErrorKind::MissingRedirectTarget);
    assert_eq!(parse_line_str("| wc\n").unwrap_err().kind, ErrorKind::UnexpectedToken);
    assert_eq!(tokenize_str("echo \"abc").unwrap_err().kind, ErrorKind::Tokenize);
}

#[test]
fn non_utf8_bytes_survive_parsing() {
    use std::ffi::OsStr;
    use std::os::unix::ffi::OsStrExt;

    let mut tokenizer = pipesh::Tokenizer::from_read(&b"cat <in\xff.txt a\xfe\n"[..]);
    let parsed = pipesh::parse_command(&mut tokenizer).unwrap();
    let spec = parsed.command.unwrap().spec().clone();
    assert_eq!(spec.stdin.as_deref(), Some(OsStr::from_bytes(b"in\xff.txt")));
    assert_eq!(spec.args[1].as_bytes(), b"a\xfe");
}

#[test]
fn empty_input_has_no_stages() {
    assert!(parse_line_str("\n").unwrap().is_empty());
    assert!(parse_line_str("").unwrap().is_empty());
}

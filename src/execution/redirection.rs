use std::ffi::OsStr;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use log::debug;
use nix::fcntl::OFlag;
use nix::unistd::pipe2;

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::CommandSpec;

/// Standard streams resolved for one stage. `None` inherits the shell's own.
#[derive(Debug, Default)]
pub(crate) struct StageIo {
    pub(crate) stdin: Option<File>,
    pub(crate) stdout: Option<File>,
}

/// Pick the stage's stdin: an explicit `<` file beats the previous stage's pipe.
pub(crate) fn resolve_stdin(cmd: &CommandSpec, inherited: Option<File>) -> ShellResult<Option<File>> {
    let Some(ref path) = cmd.stdin else {
        return Ok(inherited);
    };
    let file = open_input(path)?;
    if inherited.is_some() {
        debug!("fd event=override source=pipe target={}", Path::new(path).display());
    }
    Ok(Some(file))
}

/// Pick the stage's stdout and the read end the next stage will inherit.
///
/// When `>` and `|` are both present the file wins and the pipe's write end
/// is closed at once, so the next stage sees end of file.
pub(crate) fn resolve_stdout(cmd: &CommandSpec) -> ShellResult<(Option<File>, Option<File>)> {
    let (write_end, read_end) = if cmd.feeds_pipe {
        let (read_end, write_end) = create_pipe()?;
        (Some(write_end), Some(read_end))
    } else {
        (None, None)
    };
    match cmd.stdout {
        Some(ref path) => {
            let file = open_output(path)?;
            if write_end.is_some() {
                debug!("fd event=override source=pipe target={}", Path::new(path).display());
            }
            Ok((Some(file), read_end))
        }
        None => Ok((write_end, read_end)),
    }
}

pub(crate) fn open_input(path: &OsStr) -> ShellResult<File> {
    OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|err| {
            ShellError::io(ErrorKind::OpenRedirect, Path::new(path).display(), &err)
                .with_context("Input redirection target must be a readable file")
        })
}

pub(crate) fn open_output(path: &OsStr) -> ShellResult<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o644)
        .open(path)
        .map_err(|err| {
            ShellError::io(ErrorKind::OpenRedirect, Path::new(path).display(), &err)
                .with_context("Output redirection target must be writable")
        })
}

/// Anonymous pipe as `(read, write)`. Both ends are close-on-exec so only the
/// duplicated standard streams reach a child.
pub(crate) fn create_pipe() -> ShellResult<(File, File)> {
    let (read_fd, write_fd) = pipe2(OFlag::O_CLOEXEC).map_err(|errno| {
        ShellError::io(ErrorKind::Pipe, "cannot create pipe", &io::Error::from(errno))
    })?;
    Ok((File::from(read_fd), File::from(write_fd)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::{Read, Write};
    use tempfile::tempdir;

    fn spec(stdin: Option<&Path>, stdout: Option<&Path>, feeds_pipe: bool) -> CommandSpec {
        CommandSpec {
            args: vec!["cat".into()],
            stdin: stdin.map(|p| p.as_os_str().to_owned()),
            stdout: stdout.map(|p| p.as_os_str().to_owned()),
            feeds_pipe,
        }
    }

    #[test]
    fn pipe_carries_bytes() {
        let (mut read_end, mut write_end) = create_pipe().unwrap();
        write_end.write_all(b"through").unwrap();
        drop(write_end);
        let mut out = String::new();
        read_end.read_to_string(&mut out).unwrap();
        assert_eq!(out, "through");
    }

    #[test]
    fn stdin_file_overrides_inherited_pipe() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("in.txt");
        fs::write(&path, "from file").unwrap();
        let (read_end, _write_end) = create_pipe().unwrap();

        let cmd = spec(Some(path.as_path()), None, false);
        let mut file = resolve_stdin(&cmd, Some(read_end)).unwrap().unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        assert_eq!(out, "from file");
    }

    #[test]
    fn non_utf8_path_opens_the_named_file() {
        use std::os::unix::ffi::OsStrExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join(OsStr::from_bytes(b"in\xff.txt"));
        fs::write(&path, "payload").unwrap();
        let cmd = spec(Some(path.as_path()), None, false);
        let mut file = resolve_stdin(&cmd, None).unwrap().unwrap();
        let mut out = String::new();
        file.read_to_string(&mut out).unwrap();
        assert_eq!(out, "payload");
    }

    #[test]
    fn stdin_defaults_to_inherited() {
        let cmd = spec(None, None, false);
        assert!(resolve_stdin(&cmd, None).unwrap().is_none());
        let (read_end, _write_end) = create_pipe().unwrap();
        assert!(resolve_stdin(&cmd, Some(read_end)).unwrap().is_some());
    }

    #[test]
    fn missing_input_is_open_redirect_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.txt");
        let cmd = spec(Some(path.as_path()), None, false);
        let err = resolve_stdin(&cmd, None).unwrap_err();
        assert_eq!(err.kind, ErrorKind::OpenRedirect);
        assert!(err.message.ends_with("No such file or directory"), "{}", err.message);
    }

    #[test]
    fn output_redirect_truncates() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        fs::write(&path, "old contents that are long").unwrap();
        let cmd = spec(None, Some(path.as_path()), false);
        let (stdout, next) = resolve_stdout(&cmd).unwrap();
        assert!(next.is_none());
        stdout.unwrap().write_all(b"new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
    }

    #[test]
    fn output_redirect_leaves_next_stage_at_eof() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("out.txt");
        let cmd = spec(None, Some(path.as_path()), true);
        let (stdout, next) = resolve_stdout(&cmd).unwrap();
        assert!(stdout.is_some());
        let mut out = String::new();
        next.unwrap().read_to_string(&mut out).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn feeding_stage_gets_pipe_write_end() {
        let cmd = spec(None, None, true);
        let (stdout, next) = resolve_stdout(&cmd).unwrap();
        stdout.unwrap().write_all(b"x").unwrap();
        let mut out = String::new();
        next.unwrap().read_to_string(&mut out).unwrap();
        assert_eq!(out, "x");
    }
}

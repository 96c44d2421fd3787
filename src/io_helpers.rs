use std::env;
use std::fs::File;
use std::io::{self, Read};
use std::os::fd::{AsFd, AsRawFd};

use log::debug;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use rustyline::error::ReadlineError;
use rustyline::{Config, DefaultEditor, EditMode};

use crate::config::build_prompt;

/// `Read` adapter that pulls one edited line at a time from the terminal.
pub struct EditorSource {
    editor: DefaultEditor,
    prompt_template: String,
    // Bytes of the current line not yet handed to the reader.
    pending: Vec<u8>,
    offset: usize,
    eof: bool,
}

impl EditorSource {
    pub fn new(prompt_template: String) -> io::Result<Self> {
        let edit_mode = match env::var("PIPESH_EDITMODE").ok().as_deref() {
            Some("vi") | Some("VI") => EditMode::Vi,
            _ => EditMode::Emacs,
        };
        let config = Config::builder()
            .auto_add_history(false)
            .edit_mode(edit_mode)
            .build();
        let editor = DefaultEditor::with_config(config).map_err(io::Error::other)?;
        Ok(Self {
            editor,
            prompt_template,
            pending: Vec::new(),
            offset: 0,
            eof: false,
        })
    }

    fn fill(&mut self) -> io::Result<()> {
        let cwd = env::current_dir().unwrap_or_else(|_| "/".into());
        let prompt = build_prompt(&self.prompt_template, &cwd);
        let line = match self.editor.readline(&prompt) {
            Ok(line) => line,
            // Ctrl-C abandons the line being edited.
            Err(ReadlineError::Interrupted) => String::new(),
            Err(ReadlineError::Eof) => {
                self.eof = true;
                return Ok(());
            }
            Err(err) => return Err(io::Error::other(err)),
        };
        self.pending.clear();
        self.pending.extend_from_slice(line.as_bytes());
        self.pending.push(b'\n');
        self.offset = 0;
        Ok(())
    }
}

impl Read for EditorSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.offset >= self.pending.len() {
            if self.eof {
                return Ok(0);
            }
            self.fill()?;
            if self.eof {
                println!();
                return Ok(0);
            }
        }
        let available = &self.pending[self.offset..];
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.offset += count;
        Ok(count)
    }
}

/// Unbuffered, blocking handle on the shell's stdin descriptor.
pub fn raw_stdin() -> io::Result<File> {
    let fd = io::stdin().as_fd().try_clone_to_owned()?;
    let file = File::from(fd);
    make_blocking(&file)?;
    Ok(file)
}

/// Clear `O_NONBLOCK` inherited from whoever opened the descriptor.
pub fn make_blocking(file: &File) -> io::Result<()> {
    let fd = file.as_raw_fd();
    let flags = OFlag::from_bits_truncate(fcntl(fd, FcntlArg::F_GETFL)?);
    if flags.contains(OFlag::O_NONBLOCK) {
        fcntl(fd, FcntlArg::F_SETFL(flags - OFlag::O_NONBLOCK))?;
        debug!("fd event=clear-nonblock fd={}", fd);
    }
    Ok(())
}

pub fn open_script(path: &str) -> io::Result<File> {
    File::open(path).map_err(|err| io::Error::new(err.kind(), format!("{path}: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::pipe2;

    #[test]
    fn make_blocking_clears_nonblock() {
        let (read_fd, _write_fd) = pipe2(OFlag::O_NONBLOCK | OFlag::O_CLOEXEC).unwrap();
        let read_end = File::from(read_fd);
        make_blocking(&read_end).unwrap();
        let flags = OFlag::from_bits_truncate(fcntl(read_end.as_raw_fd(), FcntlArg::F_GETFL).unwrap());
        assert!(!flags.contains(OFlag::O_NONBLOCK));
        make_blocking(&read_end).unwrap();
    }
}

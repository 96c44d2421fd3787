use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::os::unix::ffi::OsStrExt;
use std::os::unix::process::CommandExt;
use std::path::Path;
use std::process::{Child, Command, Stdio};

use log::debug;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};

use crate::error::{ErrorKind, ShellError, ShellResult};

use super::redirection::StageIo;

/// Signals the interactive shell ignores for itself; children get defaults.
const RESET_IN_CHILD: [Signal; 2] = [Signal::SIGINT, Signal::SIGQUIT];

pub(crate) fn build_command(path: &OsStr, args: &[OsString], io: StageIo) -> Command {
    let mut command = Command::new(path);
    command.args(args.iter().skip(1));
    // Dropping the Command after spawn closes the parent's copies.
    if let Some(stdin) = io.stdin {
        command.stdin(Stdio::from(stdin));
    }
    if let Some(stdout) = io.stdout {
        command.stdout(Stdio::from(stdout));
    }
    unsafe {
        command.pre_exec(reset_ignored_signals);
    }
    command
}

pub(crate) fn spawn_stage(path: &OsStr, args: &[OsString], io: StageIo) -> ShellResult<Child> {
    let mut command = build_command(path, args, io);
    let child = command
        .spawn()
        .map_err(|err| wrap_spawn_error(path, err))?;
    debug!("job event=spawn name={} pid={}", path.to_string_lossy(), child.id());
    Ok(child)
}

fn reset_ignored_signals() -> io::Result<()> {
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    for &sig in &RESET_IN_CHILD {
        unsafe { sigaction(sig, &action) }.map_err(io::Error::from)?;
    }
    Ok(())
}

pub(crate) fn wrap_spawn_error(path: &OsStr, err: io::Error) -> ShellError {
    ShellError::new(ErrorKind::Spawn, spawn_error_message(Path::new(path), &err))
}

fn spawn_error_message(path: &Path, err: &io::Error) -> String {
    let cmd = path.display();
    match err.kind() {
        io::ErrorKind::NotFound => format!("{cmd}: command not found"),
        io::ErrorKind::PermissionDenied => format!("{cmd}: permission denied"),
        _ => {
            if path.as_os_str().as_bytes().contains(&b'/') {
                if let Ok(meta) = fs::metadata(path) {
                    if meta.is_dir() {
                        return format!("{cmd}: is a directory");
                    }
                }
            }
            ShellError::io(ErrorKind::Spawn, cmd, err).message
        }
    }
}

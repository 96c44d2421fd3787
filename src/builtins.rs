use std::env;
use std::ffi::{OsStr, OsString};
use std::io::{self, Write};
use std::os::unix::ffi::OsStrExt;
use std::path::PathBuf;

use log::debug;
use pipesh::{BuiltinDispatcher, BuiltinStreams, CancelToken, Keyword};

const HELP_OVERVIEW: &str = "These shell commands are defined internally. Type 'help' to see this list.\n\
Type 'help name' to find out more about the function 'name'.\n \
pwd\n \
cd path\n \
help command\n \
exit\n";

const HELP_PWD: &str = "pwd: pwd\n\
\tPrint the name of the current working directory.\n\
\tExit Status:\n\
\tReturns 0 unless the current directory cannot be read.\n";

const HELP_CD: &str = "cd: cd [dir]\n\
\tChange the shell working directory.\n\
\tWithout an argument, change to $HOME.\n";

const HELP_HELP: &str = "help: help [name]\n\
\tDisplay information about builtin commands.\n";

const HELP_EXIT: &str = "exit: exit [n]\n\
\tExit the shell with a status of N, or 0 if N is omitted.\n";

/// In-process implementations of `pwd`, `cd`, `help` and `exit`.
pub struct ShellBuiltins {
    cancel: CancelToken,
}

impl ShellBuiltins {
    pub fn new(cancel: CancelToken) -> Self {
        Self { cancel }
    }
}

impl BuiltinDispatcher for ShellBuiltins {
    fn dispatch(
        &mut self,
        keyword: Keyword,
        args: &[OsString],
        mut streams: BuiltinStreams,
    ) -> io::Result<()> {
        let mut out = streams.output();
        match keyword {
            Keyword::Pwd => {
                let cwd = env::current_dir()?;
                writeln!(out, "{}", cwd.display())?;
            }
            Keyword::Cd => {
                let target = match args.get(1) {
                    Some(dir) => PathBuf::from(dir),
                    None => env::var_os("HOME")
                        .map(PathBuf::from)
                        .ok_or_else(|| io::Error::other("HOME not set"))?,
                };
                env::set_current_dir(&target).map_err(|err| {
                    io::Error::new(err.kind(), format!("{}: {}", target.display(), err))
                })?;
                debug!("builtin event=cd target={}", target.display());
            }
            Keyword::Help => {
                let text = help_text(args.get(1).map(OsString::as_os_str))?;
                out.write_all(text.as_bytes())?;
            }
            Keyword::Exit => {
                let code = match args.get(1) {
                    Some(raw) => raw
                        .to_str()
                        .and_then(|text| text.parse::<i32>().ok())
                        .ok_or_else(|| {
                            io::Error::new(
                                io::ErrorKind::InvalidInput,
                                format!("{}: numeric argument required", raw.to_string_lossy()),
                            )
                        })?,
                    None => 0,
                };
                debug!("builtin event=exit code={}", code);
                self.cancel.cancel(code);
            }
        }
        out.flush()
    }
}

fn help_text(topic: Option<&OsStr>) -> io::Result<&'static str> {
    let Some(topic) = topic else {
        return Ok(HELP_OVERVIEW);
    };
    match Keyword::from_bytes(topic.as_bytes()) {
        Some(Keyword::Pwd) => Ok(HELP_PWD),
        Some(Keyword::Cd) => Ok(HELP_CD),
        Some(Keyword::Help) => Ok(HELP_HELP),
        Some(Keyword::Exit) => Ok(HELP_EXIT),
        None => Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no help topics match `{}'", topic.to_string_lossy()),
        )),
    }
}

//! Pipeline executor.
//!
//! Drives the parser one command at a time for a single input line, wiring
//! each stage's standard streams to the previous stage's pipe, to redirection
//! files, or to the shell's own streams, then spawns the stage or hands it to
//! the builtin dispatcher.
use std::ffi::OsString;
use std::fs::File;
use std::io::{self, Read, Write};

use log::{debug, warn};

use crate::cancel::CancelToken;
use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::{parse_command, Command, Keyword, Terminator, Tokenizer};

mod reaping;
mod redirection;
mod spawning;

pub use reaping::{exit_status_code, Reaped};

use reaping::ChildTable;
use redirection::{resolve_stdin, resolve_stdout, StageIo};
use spawning::spawn_stage;

/// Streams handed to a builtin. `None` means the shell's own stream.
#[derive(Debug, Default)]
pub struct BuiltinStreams {
    pub stdin: Option<File>,
    pub stdout: Option<File>,
}

impl BuiltinStreams {
    /// Writer for builtin output: the resolved file or pipe, else stdout.
    pub fn output(&mut self) -> Box<dyn Write + '_> {
        match self.stdout {
            Some(ref mut file) => Box::new(file),
            None => Box::new(io::stdout().lock()),
        }
    }
}

/// Runs builtins inside the shell process so they can change its state.
pub trait BuiltinDispatcher {
    fn dispatch(
        &mut self,
        keyword: Keyword,
        args: &[OsString],
        streams: BuiltinStreams,
    ) -> io::Result<()>;
}

/// What happened while running one line.
#[derive(Debug, Default)]
pub struct LineOutcome {
    /// Stages spawned or run as builtins.
    pub dispatched: usize,
    /// Stage-local failures, then the line-fatal one if the line was aborted.
    pub errors: Vec<ShellError>,
    pub aborted: bool,
    pub end_of_stream: bool,
}

// Iteration state carried from one stage to the next within a line.
#[derive(Default)]
struct PipelineState {
    previous_read_end: Option<File>,
    in_pipe: bool,
    stage: usize,
}

pub struct Executor<B> {
    builtins: B,
    children: ChildTable,
    cancel: CancelToken,
    trace: bool,
}

impl<B: BuiltinDispatcher> Executor<B> {
    pub fn new(builtins: B, cancel: CancelToken) -> Self {
        Self {
            builtins,
            children: ChildTable::default(),
            cancel,
            trace: false,
        }
    }

    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn builtins(&self) -> &B {
        &self.builtins
    }

    /// Parse and dispatch every command of the next input line.
    ///
    /// Only a failure of the input stream itself is returned as `Err`; every
    /// other error is recorded in the outcome and the rest of its line is
    /// discarded when the error is line-fatal.
    pub fn run_line<R: Read>(&mut self, tokenizer: &mut Tokenizer<R>) -> ShellResult<LineOutcome> {
        let mut outcome = LineOutcome::default();
        let mut pipeline = PipelineState::default();
        let result = self.drive_line(tokenizer, &mut pipeline, &mut outcome);
        if pipeline.previous_read_end.take().is_some() {
            debug!("fd event=close kind=pipe-read stage={}", pipeline.stage);
        }
        if let Err(err) = result {
            if err.kind == ErrorKind::Read {
                return Err(err);
            }
            tokenizer.discard_line()?;
            debug!("exec event=abort kind={:?}", err.kind);
            outcome.aborted = true;
            outcome.errors.push(err);
        }
        Ok(outcome)
    }

    fn drive_line<R: Read>(
        &mut self,
        tokenizer: &mut Tokenizer<R>,
        pipeline: &mut PipelineState,
        outcome: &mut LineOutcome,
    ) -> ShellResult<()> {
        loop {
            let parsed = parse_command(tokenizer)?;
            let Some(command) = parsed.command else {
                if pipeline.in_pipe {
                    let (line, col) = tokenizer.token_start();
                    return Err(ShellError::new(
                        ErrorKind::UnexpectedToken,
                        "expected a command after `|`",
                    )
                    .at(line, col));
                }
                outcome.end_of_stream = parsed.terminator == Terminator::EndOfStream;
                return Ok(());
            };

            if self.cancel.is_cancelled() {
                debug!("exec event=cancelled skip={}", command.name().to_string_lossy());
                if parsed.terminator == Terminator::Pipe {
                    tokenizer.discard_line()?;
                }
                outcome.end_of_stream = parsed.terminator == Terminator::EndOfStream;
                return Ok(());
            }

            match self.dispatch(command, pipeline) {
                Ok(()) => outcome.dispatched += 1,
                Err(err) if !err.kind.aborts_line() => {
                    warn!("exec event=stage-failed kind={:?} message={}", err.kind, err.message);
                    outcome.errors.push(err);
                }
                Err(err) => return Err(err),
            }

            match parsed.terminator {
                Terminator::Pipe => continue,
                Terminator::EndOfLine => return Ok(()),
                Terminator::EndOfStream => {
                    outcome.end_of_stream = true;
                    return Ok(());
                }
            }
        }
    }

    fn dispatch(&mut self, command: Command, pipeline: &mut PipelineState) -> ShellResult<()> {
        let stage = pipeline.stage;
        pipeline.stage += 1;
        self.trace_command(stage, &command);

        let inherited = pipeline.previous_read_end.take();
        let stdin = resolve_stdin(command.spec(), inherited)?;
        let (stdout, next_read_end) = resolve_stdout(command.spec())?;
        pipeline.previous_read_end = next_read_end;
        pipeline.in_pipe = command.feeds_pipe();
        let io = StageIo { stdin, stdout };

        match command {
            Command::Executable { path, spec } => {
                let child = spawn_stage(&path, &spec.args, io)?;
                debug!(
                    "job event=stage idx={} pid={} feeds_pipe={}",
                    stage,
                    child.id(),
                    spec.feeds_pipe
                );
                self.children.track(child, &path.to_string_lossy());
            }
            Command::Builtin { keyword, spec } => {
                debug!("job event=builtin idx={} name={}", stage, keyword);
                let streams = BuiltinStreams {
                    stdin: io.stdin,
                    stdout: io.stdout,
                };
                self.builtins
                    .dispatch(keyword, &spec.args, streams)
                    .map_err(|err| ShellError::io(ErrorKind::Builtin, keyword, &err))?;
            }
        }
        Ok(())
    }

    fn trace_command(&self, stage: usize, command: &Command) {
        if !self.trace {
            return;
        }
        eprintln!("trace: argv[{stage}]: {:?}", command.args());
        let spec = command.spec();
        if let Some(ref path) = spec.stdin {
            eprintln!("trace: redirect stdin < {}", path.to_string_lossy());
        }
        if let Some(ref path) = spec.stdout {
            eprintln!("trace: redirect stdout > {}", path.to_string_lossy());
        }
        if spec.feeds_pipe {
            eprintln!("trace: pipe stdout -> argv[{}]", stage + 1);
        }
    }

    /// Collect exited children without blocking.
    pub fn reap(&mut self) -> Vec<Reaped> {
        self.children.reap()
    }

    /// Block until every spawned child has exited.
    pub fn wait_all(&mut self) -> Vec<Reaped> {
        self.children.wait_all()
    }

    /// Children spawned but not yet reaped.
    pub fn outstanding(&self) -> usize {
        self.children.len()
    }
}

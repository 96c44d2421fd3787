use std::io::Read;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::{debug, warn};
use pipesh::{CancelToken, Executor, Reaped, Tokenizer};

use crate::builtins::ShellBuiltins;
use crate::config::ShellConfig;

pub(crate) struct ShellState {
    pub(crate) tokenizer: Tokenizer<Box<dyn Read>>,
    pub(crate) executor: Executor<ShellBuiltins>,
    pub(crate) config: ShellConfig,
    pub(crate) cancel: CancelToken,
    // SIGCHLD handler flips this; reaping happens in the main loop.
    pub(crate) sigchld_flag: Arc<AtomicBool>,
}

impl ShellState {
    pub(crate) fn new(
        input: Box<dyn Read>,
        config: ShellConfig,
        cancel: CancelToken,
        sigchld_flag: Arc<AtomicBool>,
        trace: bool,
    ) -> Self {
        let builtins = ShellBuiltins::new(cancel.clone());
        Self {
            tokenizer: Tokenizer::from_read(input),
            executor: Executor::new(builtins, cancel.clone()).with_trace(trace),
            config,
            cancel,
            sigchld_flag,
        }
    }
}

/// Run lines until end of input or a stop request; returns the exit status.
pub(crate) fn run(state: &mut ShellState) -> i32 {
    let mut status = 0;
    loop {
        if state.sigchld_flag.swap(false, Ordering::SeqCst) {
            log_reaped(state.executor.reap());
        }
        if state.cancel.is_cancelled() {
            break;
        }
        let outcome = match state.executor.run_line(&mut state.tokenizer) {
            Ok(outcome) => outcome,
            Err(err) => {
                eprintln!("pipesh: {err}");
                status = 1;
                break;
            }
        };
        for err in &outcome.errors {
            eprintln!("pipesh: {err}");
        }
        if state.config.wait {
            log_reaped(state.executor.wait_all());
        } else {
            log_reaped(state.executor.reap());
        }
        if outcome.end_of_stream {
            break;
        }
    }
    let outstanding = state.executor.outstanding();
    if outstanding > 0 {
        debug!("job event=drain outstanding={}", outstanding);
    }
    log_reaped(state.executor.wait_all());
    if state.cancel.is_cancelled() {
        return state.cancel.exit_code();
    }
    status
}

fn log_reaped(reaped: Vec<Reaped>) {
    for done in reaped {
        if done.status > 128 {
            warn!(
                "job event=signaled pid={} name={} status={}",
                done.pid, done.name, done.status
            );
        } else {
            debug!("job event=done pid={} name={} status={}", done.pid, done.name, done.status);
        }
    }
}

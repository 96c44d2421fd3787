use std::io;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use log::debug;
use nix::sys::signal::{sigaction, SaFlags, SigAction, SigHandler, SigSet, Signal};
use pipesh::CancelToken;
use signal_hook::consts::signal::{SIGCHLD, SIGHUP, SIGTERM};
use signal_hook::flag;

pub fn stdin_is_terminal() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) == 1 }
}

/// Keep keyboard interrupts from killing the interactive shell itself.
/// Spawned stages restore the defaults before exec.
pub fn ignore_interactive_signals() -> io::Result<()> {
    let action = SigAction::new(SigHandler::SigIgn, SaFlags::SA_RESTART, SigSet::empty());
    install_action(Signal::SIGINT, &action)?;
    install_action(Signal::SIGQUIT, &action)?;
    debug!("signal event=install mode=ignore");
    Ok(())
}

/// Route termination signals into `cancel` and child exits into a flag.
pub fn install_signal_handlers(cancel: &CancelToken) -> io::Result<Arc<AtomicBool>> {
    for sig in [SIGTERM, SIGHUP] {
        flag::register_usize(sig, cancel.signal_slot(), sig as usize)?;
    }
    let sigchld = Arc::new(AtomicBool::new(false));
    flag::register(SIGCHLD, Arc::clone(&sigchld))?;
    debug!("signal event=install mode=flag");
    Ok(sigchld)
}

fn install_action(signal: Signal, action: &SigAction) -> io::Result<()> {
    unsafe { sigaction(signal, action) }
        .map(|_| ())
        .map_err(|err| io::Error::other(err.to_string()))
}

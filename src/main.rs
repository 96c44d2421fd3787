use std::env;
use std::io::Read;
use std::process;

use pipesh::CancelToken;

mod builtins;
mod config;
mod io_helpers;
mod repl;
mod signals;

use config::load_config;
use io_helpers::{open_script, raw_stdin, EditorSource};
use repl::ShellState;
use signals::{ignore_interactive_signals, install_signal_handlers, stdin_is_terminal};

const USAGE: &str = "usage: pipesh [-x] [-w|--wait] [-h|--help] [SCRIPT]\n\
\n  -x          trace parsed commands to stderr\
\n  -w, --wait  wait for every stage before reading the next line\
\n  -h, --help  print this help\n";

#[derive(Debug, Default)]
struct CliOptions {
    trace: bool,
    wait: bool,
    script: Option<String>,
}

fn main() {
    init_logging();
    let options = match parse_args(env::args().skip(1)) {
        Ok(Some(options)) => options,
        Ok(None) => {
            print!("{USAGE}");
            return;
        }
        Err(msg) => {
            eprintln!("pipesh: {msg}");
            eprint!("{USAGE}");
            process::exit(2);
        }
    };
    process::exit(run_shell(options));
}

fn init_logging() {
    let env = env_logger::Env::default().filter_or("PIPESH_LOG", "warn");
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp_millis()
        .try_init();
}

/// `Ok(None)` means help was requested.
fn parse_args(args: impl Iterator<Item = String>) -> Result<Option<CliOptions>, String> {
    let mut options = CliOptions::default();
    for arg in args {
        match arg.as_str() {
            "-x" => options.trace = true,
            "-w" | "--wait" => options.wait = true,
            "-h" | "--help" => return Ok(None),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("unknown option '{flag}'"))
            }
            path => {
                if options.script.is_some() {
                    return Err(format!("unexpected argument '{path}'"));
                }
                options.script = Some(path.to_string());
            }
        }
    }
    Ok(Some(options))
}

fn run_shell(options: CliOptions) -> i32 {
    let mut config = match load_config() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("pipesh: {err}");
            Default::default()
        }
    };
    config.wait |= options.wait;

    let interactive = options.script.is_none() && stdin_is_terminal();
    if interactive {
        if let Err(err) = ignore_interactive_signals() {
            eprintln!("pipesh: {err}");
            return 1;
        }
    }
    let cancel = CancelToken::new();
    let sigchld_flag = match install_signal_handlers(&cancel) {
        Ok(flag) => flag,
        Err(err) => {
            eprintln!("pipesh: {err}");
            return 1;
        }
    };

    let input: std::io::Result<Box<dyn Read>> = match options.script {
        Some(ref path) => open_script(path).map(|file| Box::new(file) as Box<dyn Read>),
        None if interactive => EditorSource::new(config.prompt_template.clone())
            .map(|source| Box::new(source) as Box<dyn Read>),
        None => raw_stdin().map(|file| Box::new(file) as Box<dyn Read>),
    };
    let input = match input {
        Ok(input) => input,
        Err(err) => {
            eprintln!("pipesh: {err}");
            return 1;
        }
    };

    let mut state = ShellState::new(input, config, cancel, sigchld_flag, options.trace);
    repl::run(&mut state)
}

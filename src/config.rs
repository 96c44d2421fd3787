use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, warn};
use pipesh::{ErrorKind, ShellError, ShellResult};

pub const DEFAULT_PROMPT: &str = "{cwd} $ ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShellConfig {
    pub prompt_template: String,
    /// Wait for every stage of a line before reading the next one.
    pub wait: bool,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            prompt_template: DEFAULT_PROMPT.to_string(),
            wait: false,
        }
    }
}

pub fn config_path() -> Option<PathBuf> {
    env::var_os("HOME").map(|home| PathBuf::from(home).join(".pipeshrc"))
}

/// Load `~/.pipeshrc`. A missing file yields the defaults.
pub fn load_config() -> ShellResult<ShellConfig> {
    let Some(path) = config_path() else {
        return Ok(ShellConfig::default());
    };
    load_config_from(&path)
}

pub fn load_config_from(path: &Path) -> ShellResult<ShellConfig> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(ShellConfig::default()),
        Err(err) => return Err(ShellError::io(ErrorKind::Config, path.display(), &err)),
    };
    debug!("config event=load path={}", path.display());
    Ok(parse_config(&content))
}

/// Parse config text. Bad lines are reported and skipped.
pub fn parse_config(content: &str) -> ShellConfig {
    let mut config = ShellConfig::default();
    for (idx, raw) in content.lines().enumerate() {
        if let Err(err) = apply_line(&mut config, raw) {
            let err = err.at(idx + 1, 1);
            warn!("config event=skip line={} message={}", idx + 1, err.message);
            eprintln!("pipesh: {err}");
        }
    }
    config
}

fn apply_line(config: &mut ShellConfig, raw: &str) -> ShellResult<()> {
    let line = raw.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(());
    }
    let Some((key, value)) = line.split_once('=') else {
        return Err(ShellError::new(ErrorKind::Config, "unrecognized directive")
            .with_context("Expected: key = value"));
    };
    let value = strip_quotes(value.trim());
    match key.trim() {
        "prompt" | "PROMPT" => config.prompt_template = value.to_string(),
        "wait" => config.wait = parse_switch(value)?,
        other => {
            return Err(ShellError::new(
                ErrorKind::Config,
                format!("unknown setting '{other}'"),
            ))
        }
    }
    Ok(())
}

fn parse_switch(value: &str) -> ShellResult<bool> {
    match value {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        other => Err(ShellError::new(
            ErrorKind::Config,
            format!("invalid value '{other}' for wait"),
        )
        .with_context("Expected: on or off")),
    }
}

fn strip_quotes(input: &str) -> &str {
    let bytes = input.as_bytes();
    if bytes.len() >= 2 {
        let first = bytes[0];
        let last = bytes[bytes.len() - 1];
        if (first == b'"' && last == b'"') || (first == b'\'' && last == b'\'') {
            return &input[1..bytes.len() - 1];
        }
    }
    input
}

pub fn build_prompt(template: &str, cwd: &Path) -> String {
    template.replace("{cwd}", &cwd.display().to_string())
}

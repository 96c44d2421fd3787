use log::debug;

use crate::error::{ErrorKind, ShellError, ShellResult};
use crate::parse::{CommandSpec, Token};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub(crate) enum RedirectSlot {
    Input,
    Output,
}

impl RedirectSlot {
    pub(crate) fn from_token(token: &Token) -> Option<RedirectSlot> {
        match token {
            Token::RedirectIn => Some(RedirectSlot::Input),
            Token::RedirectOut => Some(RedirectSlot::Output),
            _ => None,
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            RedirectSlot::Input => "<",
            RedirectSlot::Output => ">",
        }
    }
}

/// Consume the token that follows `<` or `>` as the redirection path.
///
/// A later redirection in the same direction replaces an earlier one.
pub(crate) fn apply_redirection(
    current: &mut CommandSpec,
    slot: RedirectSlot,
    token: Token,
    (line, col): (usize, usize),
) -> ShellResult<()> {
    if token.ends_line() || token == Token::Pipe {
        return Err(missing_target(slot, &token).at(line, col));
    }
    if RedirectSlot::from_token(&token).is_some() {
        return Err(ShellError::new(
            ErrorKind::UnexpectedToken,
            format!("unexpected {token} after `{}`", slot.symbol()),
        )
        .at(line, col)
        .with_context(redirect_hint(slot)));
    }
    let Some(path) = token.into_text() else {
        return Err(missing_target(slot, &Token::EndOfLine).at(line, col));
    };
    let target = match slot {
        RedirectSlot::Input => &mut current.stdin,
        RedirectSlot::Output => &mut current.stdout,
    };
    if let Some(previous) = target.replace(path) {
        debug!(
            "parse event=redirect-replaced op={} previous={}",
            slot.symbol(),
            previous.to_string_lossy()
        );
    }
    Ok(())
}

pub(crate) fn missing_target(slot: RedirectSlot, found: &Token) -> ShellError {
    ShellError::new(
        ErrorKind::MissingRedirectTarget,
        format!("expected a path after `{}`, found {found}", slot.symbol()),
    )
    .with_context(redirect_hint(slot))
}

fn redirect_hint(slot: RedirectSlot) -> &'static str {
    match slot {
        RedirectSlot::Input => "Expected: cmd < filename",
        RedirectSlot::Output => "Expected: cmd > filename",
    }
}

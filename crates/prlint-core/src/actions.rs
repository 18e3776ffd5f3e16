//! GitHub Actions workflow commands.

/// Escape a message for use as workflow command data.
///
/// # Examples
///
/// ```
/// use prlint_core::actions::escape_data;
///
/// assert_eq!(escape_data("100%\nsure"), "100%25%0Asure");
/// ```
pub fn escape_data(message: &str) -> String {
    message
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

/// Workflow command that marks the current step as failed with `message`.
///
/// # Examples
///
/// ```
/// use prlint_core::actions::error_command;
///
/// assert_eq!(error_command("bad title"), "::error::bad title");
/// ```
pub fn error_command(message: &str) -> String {
    format!("::error::{}", escape_data(message))
}

/// Whether the runner was started with step debug logging enabled.
pub fn runner_debug() -> bool {
    std::env::var("RUNNER_DEBUG").is_ok_and(|v| v == "1")
}

/// Whether this process is running inside GitHub Actions.
pub fn in_actions() -> bool {
    std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_percent_first() {
        assert_eq!(escape_data("%0A"), "%250A");
    }

    #[test]
    fn escapes_carriage_return() {
        assert_eq!(escape_data("a\r\nb"), "a%0D%0Ab");
    }

    #[test]
    fn error_command_escapes_multiline_comment() {
        assert_eq!(
            error_command("Title must match\n`^feat`"),
            "::error::Title must match%0A`^feat`"
        );
    }
}

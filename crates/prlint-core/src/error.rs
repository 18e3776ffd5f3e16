use std::path::PathBuf;

/// Errors that can occur while linting a pull request title.
///
/// Each variant wraps a specific error domain. Library crates use this type
/// directly; the binary crate converts to `miette::Report` at the boundary.
///
/// # Examples
///
/// ```
/// use prlint_core::PrlintError;
///
/// let err = PrlintError::Config("title-regex is required".into());
/// assert!(err.to_string().contains("title-regex"));
/// ```
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum PrlintError {
    /// Filesystem I/O failure.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or missing configuration.
    #[error("configuration error: {0}")]
    #[diagnostic(
        code(prlint::config),
        help("set the action inputs, or run 'prlint init' to create .prlint.toml")
    )]
    Config(String),

    /// The title pattern could not be compiled.
    #[error("invalid title pattern: {0}")]
    #[diagnostic(code(prlint::regex))]
    Regex(#[from] regex::Error),

    /// The workflow event context is missing or malformed.
    #[error("event error: {0}")]
    #[diagnostic(
        code(prlint::event),
        help("outside GitHub Actions, pass --pr owner/repo#number and --title")
    )]
    Event(String),

    /// GitHub REST or GraphQL failure.
    #[error("GitHub error: {0}")]
    #[diagnostic(code(prlint::github))]
    GitHub(String),

    /// JSON serialization / deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML deserialization failure.
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A required file was not found.
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
}

use std::path::Path;

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::PrlintError;
use crate::types::MinimizeReason;

/// Placeholder in the failure comment that is replaced by the pattern source.
pub const REGEX_PLACEHOLDER: &str = "%regex%";

const DEFAULT_FAILURE_COMMENT: &str = "PR title does not match the pattern: %regex%";
const DEFAULT_DISMISS_COMMENT: &str = "PR title now matches the pattern.";

/// Names of the action inputs, in the order they are documented.
pub const INPUT_NAMES: [&str; 9] = [
    "repo-token",
    "title-regex",
    "on-failed-regex-fail-action",
    "on-failed-regex-create-review",
    "on-failed-regex-request-changes",
    "on-failed-regex-comment",
    "on-succeeded-regex-dismiss-review-comment",
    "on-succeeded-regex-minimize-comment",
    "on-minimize-comment-reason",
];

/// One layer of title policy settings, as read from `.prlint.toml` or from
/// action inputs.
///
/// Every field is optional so layers can be stacked with [`PolicyConfig::overlay`].
/// Keys use the same names as the action inputs.
///
/// # Examples
///
/// ```
/// use prlint_core::PolicyConfig;
///
/// let toml = r#"
/// title-regex = "^(feat|fix|chore):"
/// on-failed-regex-create-review = true
/// "#;
/// let config = PolicyConfig::from_toml(toml).unwrap();
/// assert_eq!(config.title_regex.as_deref(), Some("^(feat|fix|chore):"));
/// assert_eq!(config.on_failed_regex_create_review, Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct PolicyConfig {
    /// Pattern the title must match somewhere.
    pub title_regex: Option<String>,
    /// Mark the step failed when the title does not match.
    pub on_failed_regex_fail_action: Option<bool>,
    /// Manage a bot review on the pull request.
    pub on_failed_regex_create_review: Option<bool>,
    /// Submit new reviews as `REQUEST_CHANGES` instead of `COMMENT`.
    pub on_failed_regex_request_changes: Option<bool>,
    /// Failure comment template; `%regex%` is replaced by the pattern.
    pub on_failed_regex_comment: Option<String>,
    /// Message used when dismissing or superseding the bot review.
    pub on_succeeded_regex_dismiss_review_comment: Option<String>,
    /// Minimize stale bot feedback once the title matches.
    pub on_succeeded_regex_minimize_comment: Option<bool>,
    /// Classifier passed to the minimize mutation.
    pub on_minimize_comment_reason: Option<String>,
}

impl PolicyConfig {
    /// Load a policy layer from a TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`PrlintError::Io`] if the file cannot be read, or
    /// [`PrlintError::Toml`] if the content is not valid TOML.
    pub fn from_file(path: &Path) -> Result<Self, PrlintError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a policy layer from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`PrlintError::Toml`] if parsing fails.
    pub fn from_toml(content: &str) -> Result<Self, PrlintError> {
        let config: Self = toml::from_str(content)?;
        Ok(config)
    }

    /// Build a policy layer from action inputs.
    ///
    /// `lookup` receives the input name (e.g. `title-regex`) and returns its
    /// raw value. Empty values count as unset. Boolean inputs are `true` only
    /// for the exact string `"true"`.
    ///
    /// # Examples
    ///
    /// ```
    /// use prlint_core::PolicyConfig;
    ///
    /// let config = PolicyConfig::from_inputs(|name| match name {
    ///     "title-regex" => Some("^feat".into()),
    ///     "on-failed-regex-fail-action" => Some("yes".into()),
    ///     _ => None,
    /// });
    /// assert_eq!(config.title_regex.as_deref(), Some("^feat"));
    /// assert_eq!(config.on_failed_regex_fail_action, Some(false));
    /// assert_eq!(config.on_failed_regex_create_review, None);
    /// ```
    pub fn from_inputs(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let text = |name: &str| lookup(name).filter(|v| !v.is_empty());
        let flag = |name: &str| text(name).map(|v| v == "true");

        Self {
            title_regex: text("title-regex"),
            on_failed_regex_fail_action: flag("on-failed-regex-fail-action"),
            on_failed_regex_create_review: flag("on-failed-regex-create-review"),
            on_failed_regex_request_changes: flag("on-failed-regex-request-changes"),
            on_failed_regex_comment: text("on-failed-regex-comment"),
            on_succeeded_regex_dismiss_review_comment: text(
                "on-succeeded-regex-dismiss-review-comment",
            ),
            on_succeeded_regex_minimize_comment: flag("on-succeeded-regex-minimize-comment"),
            on_minimize_comment_reason: text("on-minimize-comment-reason"),
        }
    }

    /// Stack `top` over `self`; values set in `top` win.
    pub fn overlay(self, top: PolicyConfig) -> PolicyConfig {
        PolicyConfig {
            title_regex: top.title_regex.or(self.title_regex),
            on_failed_regex_fail_action: top
                .on_failed_regex_fail_action
                .or(self.on_failed_regex_fail_action),
            on_failed_regex_create_review: top
                .on_failed_regex_create_review
                .or(self.on_failed_regex_create_review),
            on_failed_regex_request_changes: top
                .on_failed_regex_request_changes
                .or(self.on_failed_regex_request_changes),
            on_failed_regex_comment: top
                .on_failed_regex_comment
                .or(self.on_failed_regex_comment),
            on_succeeded_regex_dismiss_review_comment: top
                .on_succeeded_regex_dismiss_review_comment
                .or(self.on_succeeded_regex_dismiss_review_comment),
            on_succeeded_regex_minimize_comment: top
                .on_succeeded_regex_minimize_comment
                .or(self.on_succeeded_regex_minimize_comment),
            on_minimize_comment_reason: top
                .on_minimize_comment_reason
                .or(self.on_minimize_comment_reason),
        }
    }
}

/// Environment variable GitHub Actions uses to pass an input.
///
/// # Examples
///
/// ```
/// use prlint_core::input_env_name;
///
/// assert_eq!(input_env_name("title-regex"), "INPUT_TITLE-REGEX");
/// ```
pub fn input_env_name(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Read an action input from the process environment.
pub fn env_input(name: &str) -> Option<String> {
    std::env::var(input_env_name(name))
        .ok()
        .map(|v| v.trim().to_string())
}

/// The resolved, immutable policy for one run.
///
/// Built once at startup from the stacked [`PolicyConfig`] layers and passed
/// by reference into every component.
#[derive(Debug, Clone)]
pub struct TitlePolicy {
    pub pattern: Regex,
    pub failure_comment: String,
    pub fail_action: bool,
    pub create_review: bool,
    pub request_changes: bool,
    pub dismiss_comment: String,
    pub minimize_on_success: bool,
    pub minimize_reason: MinimizeReason,
}

impl TitlePolicy {
    /// Resolve a policy from a fully stacked configuration.
    ///
    /// # Errors
    ///
    /// Returns [`PrlintError::Config`] if `title-regex` is missing or the
    /// minimize reason is not a known classifier, and [`PrlintError::Regex`]
    /// if the pattern does not compile.
    ///
    /// # Examples
    ///
    /// ```
    /// use prlint_core::{PolicyConfig, TitlePolicy};
    ///
    /// let config = PolicyConfig {
    ///     title_regex: Some("^(feat|fix):".into()),
    ///     on_failed_regex_comment: Some("Title must match `%regex%`".into()),
    ///     ..PolicyConfig::default()
    /// };
    /// let policy = TitlePolicy::from_config(&config).unwrap();
    /// assert_eq!(policy.rendered_comment(), "Title must match `^(feat|fix):`");
    /// assert!(!policy.create_review);
    /// ```
    pub fn from_config(config: &PolicyConfig) -> Result<Self, PrlintError> {
        let source = config
            .title_regex
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| PrlintError::Config("title-regex is required".into()))?;
        let pattern = Regex::new(source)?;

        let minimize_reason = match config.on_minimize_comment_reason.as_deref() {
            Some(raw) => raw.parse().map_err(PrlintError::Config)?,
            None => MinimizeReason::default(),
        };

        Ok(Self {
            pattern,
            failure_comment: config
                .on_failed_regex_comment
                .clone()
                .unwrap_or_else(|| DEFAULT_FAILURE_COMMENT.into()),
            fail_action: config.on_failed_regex_fail_action.unwrap_or(false),
            create_review: config.on_failed_regex_create_review.unwrap_or(false),
            request_changes: config.on_failed_regex_request_changes.unwrap_or(false),
            dismiss_comment: config
                .on_succeeded_regex_dismiss_review_comment
                .clone()
                .unwrap_or_else(|| DEFAULT_DISMISS_COMMENT.into()),
            minimize_on_success: config.on_succeeded_regex_minimize_comment.unwrap_or(false),
            minimize_reason,
        })
    }

    /// Source text of the title pattern.
    pub fn pattern_source(&self) -> &str {
        self.pattern.as_str()
    }

    /// The failure comment with the first `%regex%` replaced by the pattern source.
    pub fn rendered_comment(&self) -> String {
        self.failure_comment
            .replacen(REGEX_PLACEHOLDER, self.pattern_source(), 1)
    }
}

/// Read the API token from the `repo-token` input, then `GITHUB_TOKEN`, then `GH_TOKEN`.
///
/// # Errors
///
/// Returns [`PrlintError::Config`] if none is set.
pub fn resolve_token(explicit: Option<&str>) -> Result<String, PrlintError> {
    explicit
        .map(str::to_string)
        .or_else(|| env_input("repo-token"))
        .filter(|t| !t.is_empty())
        .or_else(|| std::env::var("GITHUB_TOKEN").ok().filter(|t| !t.is_empty()))
        .or_else(|| std::env::var("GH_TOKEN").ok().filter(|t| !t.is_empty()))
        .ok_or_else(|| {
            PrlintError::Config(
                "repo-token not set. Pass --repo-token or set INPUT_REPO-TOKEN / GITHUB_TOKEN"
                    .into(),
            )
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_toml_gives_empty_layer() {
        let config = PolicyConfig::from_toml("").unwrap();
        assert_eq!(config, PolicyConfig::default());
    }

    #[test]
    fn parse_full_toml() {
        let toml = r#"
title-regex = "^(feat|fix|chore):"
on-failed-regex-fail-action = true
on-failed-regex-create-review = true
on-failed-regex-request-changes = true
on-failed-regex-comment = "Use %regex%"
on-succeeded-regex-dismiss-review-comment = "Thanks!"
on-succeeded-regex-minimize-comment = true
on-minimize-comment-reason = "outdated"
"#;
        let config = PolicyConfig::from_toml(toml).unwrap();
        let policy = TitlePolicy::from_config(&config).unwrap();
        assert!(policy.fail_action);
        assert!(policy.create_review);
        assert!(policy.request_changes);
        assert!(policy.minimize_on_success);
        assert_eq!(policy.dismiss_comment, "Thanks!");
        assert_eq!(policy.minimize_reason, MinimizeReason::Outdated);
        assert_eq!(policy.rendered_comment(), "Use ^(feat|fix|chore):");
    }

    #[test]
    fn unknown_toml_key_is_rejected() {
        assert!(PolicyConfig::from_toml("title_regex = \"x\"").is_err());
    }

    #[test]
    fn invalid_toml_returns_error() {
        assert!(PolicyConfig::from_toml("{{invalid}}").is_err());
    }

    #[test]
    fn from_file_reads_layer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".prlint.toml");
        std::fs::write(&path, "title-regex = \"^fix\"\n").unwrap();

        let config = PolicyConfig::from_file(&path).unwrap();
        assert_eq!(config.title_regex.as_deref(), Some("^fix"));
    }

    #[test]
    fn from_file_missing_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PolicyConfig::from_file(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, PrlintError::Io(_)));
    }

    #[test]
    fn inputs_treat_only_exact_true_as_true() {
        let config = PolicyConfig::from_inputs(lookup_from(&[
            ("on-failed-regex-fail-action", "true"),
            ("on-failed-regex-create-review", "True"),
            ("on-failed-regex-request-changes", "1"),
        ]));
        assert_eq!(config.on_failed_regex_fail_action, Some(true));
        assert_eq!(config.on_failed_regex_create_review, Some(false));
        assert_eq!(config.on_failed_regex_request_changes, Some(false));
    }

    #[test]
    fn empty_inputs_count_as_unset() {
        let config = PolicyConfig::from_inputs(lookup_from(&[
            ("title-regex", ""),
            ("on-minimize-comment-reason", ""),
        ]));
        assert_eq!(config, PolicyConfig::default());
    }

    #[test]
    fn overlay_prefers_top_layer() {
        let file = PolicyConfig {
            title_regex: Some("^file".into()),
            on_failed_regex_create_review: Some(true),
            ..PolicyConfig::default()
        };
        let inputs = PolicyConfig {
            title_regex: Some("^input".into()),
            ..PolicyConfig::default()
        };
        let merged = file.overlay(inputs);
        assert_eq!(merged.title_regex.as_deref(), Some("^input"));
        assert_eq!(merged.on_failed_regex_create_review, Some(true));
    }

    #[test]
    fn missing_regex_is_config_error() {
        let err = TitlePolicy::from_config(&PolicyConfig::default()).unwrap_err();
        assert!(matches!(err, PrlintError::Config(_)));
    }

    #[test]
    fn invalid_regex_is_regex_error() {
        let config = PolicyConfig {
            title_regex: Some("(feat".into()),
            ..PolicyConfig::default()
        };
        let err = TitlePolicy::from_config(&config).unwrap_err();
        assert!(matches!(err, PrlintError::Regex(_)));
    }

    #[test]
    fn unknown_minimize_reason_is_config_error() {
        let config = PolicyConfig {
            title_regex: Some("^feat".into()),
            on_minimize_comment_reason: Some("fixed".into()),
            ..PolicyConfig::default()
        };
        let err = TitlePolicy::from_config(&config).unwrap_err();
        assert!(err.to_string().contains("unknown minimize reason"));
    }

    #[test]
    fn defaults_when_only_regex_given() {
        let config = PolicyConfig {
            title_regex: Some("^feat".into()),
            ..PolicyConfig::default()
        };
        let policy = TitlePolicy::from_config(&config).unwrap();
        assert!(!policy.fail_action);
        assert!(!policy.create_review);
        assert!(!policy.request_changes);
        assert!(!policy.minimize_on_success);
        assert_eq!(policy.minimize_reason, MinimizeReason::Resolved);
        assert_eq!(
            policy.rendered_comment(),
            "PR title does not match the pattern: ^feat"
        );
    }

    #[test]
    fn rendering_replaces_only_first_placeholder() {
        let config = PolicyConfig {
            title_regex: Some("^x".into()),
            on_failed_regex_comment: Some("%regex% and %regex%".into()),
            ..PolicyConfig::default()
        };
        let policy = TitlePolicy::from_config(&config).unwrap();
        assert_eq!(policy.rendered_comment(), "^x and %regex%");
    }

    #[test]
    fn input_env_name_uppercases_and_keeps_hyphens() {
        assert_eq!(
            input_env_name("on-failed-regex-comment"),
            "INPUT_ON-FAILED-REGEX-COMMENT"
        );
        assert_eq!(input_env_name("some input"), "INPUT_SOME_INPUT");
    }

    #[test]
    fn resolve_token_prefers_explicit() {
        assert_eq!(resolve_token(Some("ghp_explicit")).unwrap(), "ghp_explicit");
    }
}

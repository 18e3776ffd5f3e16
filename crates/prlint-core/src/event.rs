//! Reading the pull request under test from the GitHub Actions environment.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::error::PrlintError;
use crate::types::PullRequestRef;

/// The subset of a webhook event payload this tool reads.
#[derive(Debug, Default, Deserialize)]
struct EventPayload {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    pull_request: Option<PayloadPullRequest>,
    #[serde(default)]
    issue: Option<PayloadIssue>,
}

#[derive(Debug, Default, Deserialize)]
struct PayloadPullRequest {
    #[serde(default)]
    number: Option<u64>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct PayloadIssue {
    #[serde(default)]
    number: Option<u64>,
}

/// The pull request and title a run operates on.
///
/// # Examples
///
/// ```
/// use prlint_core::EventContext;
///
/// let payload = r#"{"pull_request": {"number": 7, "title": "feat: add parser"}}"#;
/// let ctx = EventContext::from_parts("octocat/hello-world", payload).unwrap();
/// assert_eq!(ctx.pr.to_string(), "octocat/hello-world#7");
/// assert_eq!(ctx.title, "feat: add parser");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    pub pr: PullRequestRef,
    /// Pull request title; empty when the payload carries none.
    pub title: String,
}

impl EventContext {
    /// Build a context from `GITHUB_REPOSITORY` (`owner/repo`) and the raw
    /// event payload JSON.
    ///
    /// The number is taken from `issue`, then `pull_request`, then the
    /// top-level `number` field.
    ///
    /// # Errors
    ///
    /// Returns [`PrlintError::Event`] if the repository is malformed or no
    /// number can be found, and [`PrlintError::Serialization`] if the payload
    /// is not valid JSON.
    pub fn from_parts(repository: &str, payload: &str) -> Result<Self, PrlintError> {
        let Some((owner, repo)) = repository.split_once('/') else {
            return Err(PrlintError::Event(format!(
                "invalid repository '{repository}', expected owner/repo"
            )));
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(PrlintError::Event(format!(
                "invalid repository '{repository}', expected owner/repo"
            )));
        }

        let payload: EventPayload = serde_json::from_str(payload)?;
        let number = payload
            .issue
            .as_ref()
            .and_then(|i| i.number)
            .or_else(|| payload.pull_request.as_ref().and_then(|p| p.number))
            .or(payload.number)
            .ok_or_else(|| {
                PrlintError::Event(
                    "event payload has no pull request number; run on pull_request events".into(),
                )
            })?;
        let title = payload
            .pull_request
            .and_then(|p| p.title)
            .unwrap_or_default();

        Ok(Self {
            pr: PullRequestRef::new(owner, repo, number),
            title,
        })
    }

    /// Build a context from `GITHUB_REPOSITORY` and the file at `GITHUB_EVENT_PATH`.
    ///
    /// # Errors
    ///
    /// Returns [`PrlintError::Event`] if either variable is unset, and
    /// [`PrlintError::FileNotFound`] if the payload file does not exist.
    pub fn from_env() -> Result<Self, PrlintError> {
        let repository = std::env::var("GITHUB_REPOSITORY")
            .map_err(|_| PrlintError::Event("GITHUB_REPOSITORY not set".into()))?;
        let event_path = std::env::var("GITHUB_EVENT_PATH")
            .map_err(|_| PrlintError::Event("GITHUB_EVENT_PATH not set".into()))?;
        let event_path = Path::new(&event_path);
        if !event_path.exists() {
            return Err(PrlintError::FileNotFound(event_path.to_path_buf()));
        }
        debug!(path = %event_path.display(), "reading event payload");
        let payload = std::fs::read_to_string(event_path)?;
        Self::from_parts(&repository, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_request_event() {
        let payload = r#"{"action": "edited", "number": 12, "pull_request": {"number": 12, "title": "fix: bug"}}"#;
        let ctx = EventContext::from_parts("o/r", payload).unwrap();
        assert_eq!(ctx.pr, PullRequestRef::new("o", "r", 12));
        assert_eq!(ctx.title, "fix: bug");
    }

    #[test]
    fn issue_number_takes_precedence() {
        let payload = r#"{"issue": {"number": 3}, "pull_request": {"number": 4}}"#;
        let ctx = EventContext::from_parts("o/r", payload).unwrap();
        assert_eq!(ctx.pr.number, 3);
    }

    #[test]
    fn missing_title_is_empty() {
        let ctx = EventContext::from_parts("o/r", r#"{"number": 5}"#).unwrap();
        assert_eq!(ctx.pr.number, 5);
        assert_eq!(ctx.title, "");
    }

    #[test]
    fn missing_number_is_event_error() {
        let err = EventContext::from_parts("o/r", r#"{"ref": "main"}"#).unwrap_err();
        assert!(matches!(err, PrlintError::Event(_)));
    }

    #[test]
    fn malformed_repository_is_event_error() {
        assert!(EventContext::from_parts("just-a-repo", r#"{"number": 1}"#).is_err());
        assert!(EventContext::from_parts("/repo", r#"{"number": 1}"#).is_err());
    }

    #[test]
    fn invalid_json_is_serialization_error() {
        let err = EventContext::from_parts("o/r", "not json").unwrap_err();
        assert!(matches!(err, PrlintError::Serialization(_)));
    }
}

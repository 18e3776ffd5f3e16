use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrlintError;

/// Login of the account that authors all feedback this tool manages.
pub const BOT_LOGIN: &str = "github-actions[bot]";

/// Identifies a pull request on GitHub.
///
/// Parses from and displays as `owner/repo#number`.
///
/// # Examples
///
/// ```
/// use prlint_core::PullRequestRef;
///
/// let pr: PullRequestRef = "octocat/hello-world#42".parse().unwrap();
/// assert_eq!(pr.owner, "octocat");
/// assert_eq!(pr.repo, "hello-world");
/// assert_eq!(pr.number, 42);
/// assert_eq!(pr.to_string(), "octocat/hello-world#42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Pull request number.
    pub number: u64,
}

impl PullRequestRef {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }
}

impl fmt::Display for PullRequestRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

impl FromStr for PullRequestRef {
    type Err = PrlintError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((owner_repo, number_str)) = s.split_once('#') else {
            return Err(PrlintError::Config(format!(
                "invalid PR reference '{s}', expected owner/repo#number"
            )));
        };
        let Some((owner, repo)) = owner_repo.split_once('/') else {
            return Err(PrlintError::Config(format!(
                "invalid PR reference '{s}', expected owner/repo#number"
            )));
        };
        if owner.is_empty() || repo.is_empty() {
            return Err(PrlintError::Config(format!(
                "invalid PR reference '{s}', expected owner/repo#number"
            )));
        }
        let number: u64 = number_str
            .parse()
            .map_err(|_| PrlintError::Config(format!("invalid PR number: {number_str}")))?;
        Ok(Self::new(owner, repo, number))
    }
}

/// State of a pull request review as reported by the REST API.
///
/// Unrecognised states are kept verbatim in [`ReviewState::Unknown`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ReviewState {
    Pending,
    Commented,
    Approved,
    ChangesRequested,
    Dismissed,
    Unknown(String),
}

impl From<String> for ReviewState {
    fn from(s: String) -> Self {
        match s.as_str() {
            "PENDING" => ReviewState::Pending,
            "COMMENTED" => ReviewState::Commented,
            "APPROVED" => ReviewState::Approved,
            "CHANGES_REQUESTED" => ReviewState::ChangesRequested,
            "DISMISSED" => ReviewState::Dismissed,
            _ => ReviewState::Unknown(s),
        }
    }
}

impl From<ReviewState> for String {
    fn from(state: ReviewState) -> Self {
        state.to_string()
    }
}

impl fmt::Display for ReviewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReviewState::Pending => write!(f, "PENDING"),
            ReviewState::Commented => write!(f, "COMMENTED"),
            ReviewState::Approved => write!(f, "APPROVED"),
            ReviewState::ChangesRequested => write!(f, "CHANGES_REQUESTED"),
            ReviewState::Dismissed => write!(f, "DISMISSED"),
            ReviewState::Unknown(other) => write!(f, "{other}"),
        }
    }
}

/// Event submitted with a newly created review.
///
/// # Examples
///
/// ```
/// use prlint_core::ReviewEvent;
///
/// assert_eq!(ReviewEvent::RequestChanges.as_str(), "REQUEST_CHANGES");
/// assert_eq!(ReviewEvent::for_request_changes(false), ReviewEvent::Comment);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewEvent {
    Comment,
    RequestChanges,
}

impl ReviewEvent {
    pub fn for_request_changes(request_changes: bool) -> Self {
        if request_changes {
            ReviewEvent::RequestChanges
        } else {
            ReviewEvent::Comment
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReviewEvent::Comment => "COMMENT",
            ReviewEvent::RequestChanges => "REQUEST_CHANGES",
        }
    }
}

impl fmt::Display for ReviewEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Author of a review or comment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub login: String,
}

/// A pull request review as listed by the REST API.
///
/// Only the fields this tool reads are modelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// REST database id.
    pub id: u64,
    pub state: ReviewState,
    /// `None` when the author account has been deleted.
    #[serde(default)]
    pub user: Option<Actor>,
}

impl Review {
    pub fn is_authored_by(&self, login: &str) -> bool {
        self.user.as_ref().is_some_and(|u| u.login == login)
    }
}

/// Which REST listing a comment came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentSource {
    /// A top-level conversation comment (`/issues/{n}/comments`).
    IssueComment,
    /// An inline diff comment (`/pulls/{n}/comments`).
    ReviewComment,
}

impl fmt::Display for CommentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommentSource::IssueComment => write!(f, "issue comment"),
            CommentSource::ReviewComment => write!(f, "review comment"),
        }
    }
}

/// An issue or review comment as listed by the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// REST database id.
    pub id: u64,
    #[serde(default)]
    pub user: Option<Actor>,
}

impl Comment {
    pub fn is_authored_by(&self, login: &str) -> bool {
        self.user.as_ref().is_some_and(|u| u.login == login)
    }
}

/// A GraphQL node paired with its REST database id.
///
/// Used to translate database ids into global node ids.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    /// Global node id.
    pub id: String,
    #[serde(default)]
    pub database_id: Option<u64>,
}

/// Result of a `minimizeComment` mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimizeOutcome {
    pub is_minimized: bool,
    #[serde(default)]
    pub minimized_reason: Option<String>,
}

/// Classifier attached to a minimized comment or review.
///
/// Mirrors GitHub's `ReportedContentClassifiers` enum. Parsing is
/// case-insensitive and accepts `-` in place of `_`.
///
/// # Examples
///
/// ```
/// use prlint_core::MinimizeReason;
///
/// let reason: MinimizeReason = "resolved".parse().unwrap();
/// assert_eq!(reason, MinimizeReason::Resolved);
/// assert_eq!(reason.to_string(), "RESOLVED");
/// assert_eq!("off-topic".parse::<MinimizeReason>().unwrap(), MinimizeReason::OffTopic);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MinimizeReason {
    Spam,
    Abuse,
    OffTopic,
    Outdated,
    Duplicate,
    #[default]
    Resolved,
}

impl MinimizeReason {
    pub fn as_str(self) -> &'static str {
        match self {
            MinimizeReason::Spam => "SPAM",
            MinimizeReason::Abuse => "ABUSE",
            MinimizeReason::OffTopic => "OFF_TOPIC",
            MinimizeReason::Outdated => "OUTDATED",
            MinimizeReason::Duplicate => "DUPLICATE",
            MinimizeReason::Resolved => "RESOLVED",
        }
    }
}

impl fmt::Display for MinimizeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MinimizeReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "SPAM" => Ok(MinimizeReason::Spam),
            "ABUSE" => Ok(MinimizeReason::Abuse),
            "OFF_TOPIC" => Ok(MinimizeReason::OffTopic),
            "OUTDATED" => Ok(MinimizeReason::Outdated),
            "DUPLICATE" => Ok(MinimizeReason::Duplicate),
            "RESOLVED" => Ok(MinimizeReason::Resolved),
            _ => Err(format!("unknown minimize reason: {s}")),
        }
    }
}

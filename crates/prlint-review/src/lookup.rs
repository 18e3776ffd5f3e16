//! Finding bot-authored feedback and translating database ids to node ids.

use prlint_core::{
    Comment, CommentSource, NodeRef, PrlintError, PullRequestRef, Review, ReviewState, BOT_LOGIN,
};
use tracing::{debug, warn};

use crate::api::PullRequestApi;

/// Result of looking up the bot review, shared by the steps that act on it.
pub type ReviewLookup = Result<Option<Review>, PrlintError>;

/// Find the active review left by the bot, if any.
///
/// Scans every listed review in order and returns the first one authored by
/// [`BOT_LOGIN`] that has not been dismissed.
///
/// # Errors
///
/// Returns [`PrlintError::GitHub`] if the reviews cannot be listed.
pub async fn find_bot_review<A>(api: &A, pr: &PullRequestRef) -> ReviewLookup
where
    A: PullRequestApi + ?Sized,
{
    debug!(pr = %pr, "looking up existing bot review");
    let reviews = api.list_reviews(pr).await?;
    let found = reviews
        .into_iter()
        .find(|r| r.is_authored_by(BOT_LOGIN) && r.state != ReviewState::Dismissed);
    match &found {
        Some(review) => debug!(review_id = review.id, state = %review.state, "found bot review"),
        None => debug!(pr = %pr, "no bot review found"),
    }
    Ok(found)
}

/// Collect bot-authored comments: review comments first, then issue comments.
///
/// A source that cannot be listed is logged and skipped.
pub async fn bot_comments<A>(api: &A, pr: &PullRequestRef) -> Vec<(CommentSource, Comment)>
where
    A: PullRequestApi + ?Sized,
{
    let mut found = Vec::new();
    for source in [CommentSource::ReviewComment, CommentSource::IssueComment] {
        let listed = match source {
            CommentSource::ReviewComment => api.list_review_comments(pr).await,
            CommentSource::IssueComment => api.list_issue_comments(pr).await,
        };
        match listed {
            Ok(comments) => found.extend(
                comments
                    .into_iter()
                    .filter(|c| c.is_authored_by(BOT_LOGIN))
                    .map(|c| (source, c)),
            ),
            Err(e) => warn!(pr = %pr, %source, error = %e, "could not list comments"),
        }
    }
    debug!(pr = %pr, count = found.len(), "collected bot comments");
    found
}

/// Resolve a review's database id to its global node id.
///
/// Only the first 100 reviews are searched. Lookup failures are logged and
/// yield `None`.
pub async fn resolve_review_node_id<A>(
    api: &A,
    pr: &PullRequestRef,
    database_id: u64,
) -> Option<String>
where
    A: PullRequestApi + ?Sized,
{
    match api.review_nodes(pr).await {
        Ok(nodes) => {
            let id = first_match(&nodes, database_id, "review");
            if id.is_none() {
                debug!(database_id, "no review node with this database id");
            }
            id
        }
        Err(e) => {
            warn!(database_id, error = %e, "error fetching review node id");
            None
        }
    }
}

/// Resolve a comment's database id to its global node id.
///
/// Lookup failures are logged and yield `None`.
pub async fn resolve_comment_node_id<A>(
    api: &A,
    pr: &PullRequestRef,
    source: CommentSource,
    database_id: u64,
) -> Option<String>
where
    A: PullRequestApi + ?Sized,
{
    match api.comment_nodes(pr, source).await {
        Ok(nodes) => {
            let id = first_match(&nodes, database_id, "comment");
            if id.is_none() {
                debug!(database_id, %source, "no comment node with this database id");
            }
            id
        }
        Err(e) => {
            warn!(database_id, %source, error = %e, "error fetching comment node id");
            None
        }
    }
}

/// First node whose database id matches. Duplicates are logged.
fn first_match(nodes: &[NodeRef], database_id: u64, kind: &str) -> Option<String> {
    let mut matches = nodes.iter().filter(|n| n.database_id == Some(database_id));
    let first = matches.next()?;
    let extra = matches.count();
    if extra > 0 {
        warn!(
            database_id,
            kind,
            duplicates = extra,
            "several nodes share a database id; using the first"
        );
    }
    debug!(database_id, node_id = %first.id, kind, "resolved node id");
    Some(first.id.clone())
}

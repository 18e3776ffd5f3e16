//! Collapsing stale bot feedback once the title is valid.
//!
//! Both sweeps are best-effort: failures are logged and counted, never
//! propagated. A review that cannot be minimized falls back to the dismiss
//! policy; comments have no fallback.

use chrono::Utc;
use prlint_core::{MinimizeOutcome, PullRequestRef, TitlePolicy};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::PullRequestApi;
use crate::lookup::{
    bot_comments, find_bot_review, resolve_comment_node_id, resolve_review_node_id, ReviewLookup,
};
use crate::reconcile::{dismiss_existing, DismissOutcome};

/// What happened to the bot review during minimization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ReviewMinimizeOutcome {
    /// There was no bot review.
    NotFound,
    /// The review's node id could not be resolved; nothing was attempted.
    #[serde(rename_all = "camelCase")]
    Unresolved { review_id: u64 },
    /// The minimize mutation ran; `result` is what GitHub reported.
    #[serde(rename_all = "camelCase")]
    Minimized {
        review_id: u64,
        result: MinimizeOutcome,
    },
    /// The mutation failed and the dismiss policy ran instead.
    #[serde(rename_all = "camelCase")]
    FellBack {
        review_id: u64,
        error: String,
        dismissal: DismissOutcome,
    },
    /// The review lookup itself failed.
    Abandoned { error: String },
}

/// Tally of the comment sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentSweep {
    /// Bot-authored comments found.
    pub examined: usize,
    /// Comments the minimize mutation succeeded on.
    pub minimized: usize,
    /// Comments whose node id could not be resolved.
    pub unresolved: usize,
    /// Comments whose minimize mutation failed.
    pub failed: usize,
}

/// Outcome of [`minimize_existing_feedback`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MinimizeReport {
    pub review: ReviewMinimizeOutcome,
    pub comments: CommentSweep,
}

/// Which kind of subject a mutation token is minted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationSubject {
    Review,
    Comment,
}

/// Client mutation id for a minimize call.
///
/// # Examples
///
/// ```
/// use prlint_review::minimize::{client_mutation_id, MutationSubject};
///
/// assert_eq!(
///     client_mutation_id(MutationSubject::Review, 42, 1_700_000_000_000),
///     "pr-lint-action-review-42-1700000000000"
/// );
/// assert_eq!(
///     client_mutation_id(MutationSubject::Comment, 42, 5),
///     "pr-lint-action-42-5"
/// );
/// ```
pub fn client_mutation_id(subject: MutationSubject, number: u64, millis: i64) -> String {
    match subject {
        MutationSubject::Review => format!("pr-lint-action-review-{number}-{millis}"),
        MutationSubject::Comment => format!("pr-lint-action-{number}-{millis}"),
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Minimize the bot review and every bot comment, independently.
pub async fn minimize_existing_feedback<A>(
    api: &A,
    policy: &TitlePolicy,
    pr: &PullRequestRef,
) -> MinimizeReport
where
    A: PullRequestApi + ?Sized,
{
    let found = find_bot_review(api, pr).await;
    minimize_feedback_for(api, policy, pr, &found).await
}

/// [`minimize_existing_feedback`] for a review lookup the caller already made.
///
/// A run that dismissed the review passes its own lookup here, because the
/// dismissed review no longer shows up as the active bot review.
pub async fn minimize_feedback_for<A>(
    api: &A,
    policy: &TitlePolicy,
    pr: &PullRequestRef,
    found: &ReviewLookup,
) -> MinimizeReport
where
    A: PullRequestApi + ?Sized,
{
    info!(pr = %pr, "minimizing existing feedback");
    let review = minimize_found_review(api, policy, pr, found).await;
    let comments = minimize_comments(api, policy, pr).await;
    MinimizeReport { review, comments }
}

/// Minimize the bot review, falling back to the dismiss policy on failure.
pub async fn minimize_review<A>(
    api: &A,
    policy: &TitlePolicy,
    pr: &PullRequestRef,
) -> ReviewMinimizeOutcome
where
    A: PullRequestApi + ?Sized,
{
    let found = find_bot_review(api, pr).await;
    minimize_found_review(api, policy, pr, &found).await
}

/// [`minimize_review`] for a review lookup the caller already made.
pub async fn minimize_found_review<A>(
    api: &A,
    policy: &TitlePolicy,
    pr: &PullRequestRef,
    found: &ReviewLookup,
) -> ReviewMinimizeOutcome
where
    A: PullRequestApi + ?Sized,
{
    let review = match found {
        Ok(Some(review)) => review,
        Ok(None) => {
            info!(pr = %pr, "no existing review to minimize");
            return ReviewMinimizeOutcome::NotFound;
        }
        Err(e) => {
            warn!(pr = %pr, error = %e, "could not look up review to minimize");
            return ReviewMinimizeOutcome::Abandoned {
                error: e.to_string(),
            };
        }
    };

    let Some(node_id) = resolve_review_node_id(api, pr, review.id).await else {
        debug!(review_id = review.id, "skipping review without node id");
        return ReviewMinimizeOutcome::Unresolved {
            review_id: review.id,
        };
    };

    let token = client_mutation_id(MutationSubject::Review, pr.number, now_millis());
    debug!(review_id = review.id, %node_id, "minimizing review");
    match api.minimize(&node_id, policy.minimize_reason, &token).await {
        Ok(result) => {
            log_result(&node_id, &result);
            ReviewMinimizeOutcome::Minimized {
                review_id: review.id,
                result,
            }
        }
        Err(e) => {
            warn!(review_id = review.id, error = %e, "failed to minimize review; falling back to dismissal");
            let dismissal = dismiss_existing(api, pr, review, &policy.dismiss_comment).await;
            ReviewMinimizeOutcome::FellBack {
                review_id: review.id,
                error: e.to_string(),
                dismissal,
            }
        }
    }
}

/// Minimize every bot-authored review and issue comment, one at a time.
pub async fn minimize_comments<A>(
    api: &A,
    policy: &TitlePolicy,
    pr: &PullRequestRef,
) -> CommentSweep
where
    A: PullRequestApi + ?Sized,
{
    let comments = bot_comments(api, pr).await;
    let mut sweep = CommentSweep {
        examined: comments.len(),
        ..CommentSweep::default()
    };

    for (source, comment) in comments {
        debug!(comment_id = comment.id, %source, "processing comment");
        let Some(node_id) = resolve_comment_node_id(api, pr, source, comment.id).await else {
            debug!(comment_id = comment.id, "could not find node id for comment");
            sweep.unresolved += 1;
            continue;
        };

        let token = client_mutation_id(MutationSubject::Comment, pr.number, now_millis());
        match api.minimize(&node_id, policy.minimize_reason, &token).await {
            Ok(result) => {
                log_result(&node_id, &result);
                sweep.minimized += 1;
            }
            Err(e) => {
                warn!(comment_id = comment.id, error = %e, "failed to minimize comment");
                sweep.failed += 1;
            }
        }
    }

    info!(
        examined = sweep.examined,
        minimized = sweep.minimized,
        unresolved = sweep.unresolved,
        failed = sweep.failed,
        "comment sweep finished"
    );
    sweep
}

fn log_result(node_id: &str, result: &MinimizeOutcome) {
    if result.is_minimized {
        info!(
            node_id,
            reason = result.minimized_reason.as_deref().unwrap_or(""),
            "minimized"
        );
    } else {
        warn!(node_id, "minimize mutation reported the subject as not minimized");
    }
}

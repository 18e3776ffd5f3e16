//! Keeping exactly one up-to-date bot review on the pull request.

use prlint_core::{PrlintError, PullRequestRef, Review, ReviewEvent, ReviewState, TitlePolicy};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::api::PullRequestApi;
use crate::lookup::{find_bot_review, ReviewLookup};

/// What [`create_or_update_review`] wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ReviewWrite {
    /// No bot review existed; a new one was submitted.
    Created { event: ReviewEvent },
    /// The existing bot review's body was replaced.
    #[serde(rename_all = "camelCase")]
    Updated { review_id: u64 },
}

/// What [`dismiss_review`] did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum DismissOutcome {
    /// There was no bot review.
    NotFound,
    /// The review was dismissed.
    #[serde(rename_all = "camelCase")]
    Dismissed { review_id: u64 },
    /// The review was only commented, so a `COMMENT` review carrying the
    /// dismiss message was posted instead.
    #[serde(rename_all = "camelCase")]
    Replaced { review_id: u64 },
    /// Dismissing failed and a `COMMENT` review was posted instead.
    #[serde(rename_all = "camelCase")]
    FellBack { review_id: u64, error: String },
    /// The review is in a state this tool does not act on.
    #[serde(rename_all = "camelCase")]
    Ignored { review_id: u64, state: ReviewState },
    /// Nothing could be done; the error is recorded.
    #[serde(rename_all = "camelCase")]
    Abandoned {
        review_id: Option<u64>,
        error: String,
    },
}

/// Post the failure comment as the bot review, reusing the existing one.
///
/// A new review is submitted as `REQUEST_CHANGES` when the policy asks for
/// it, otherwise as `COMMENT`. An existing review keeps its state; only its
/// body changes.
///
/// # Errors
///
/// Returns [`PrlintError::GitHub`] if listing, creating or updating fails.
pub async fn create_or_update_review<A>(
    api: &A,
    policy: &TitlePolicy,
    pr: &PullRequestRef,
    body: &str,
) -> Result<ReviewWrite, PrlintError>
where
    A: PullRequestApi + ?Sized,
{
    match find_bot_review(api, pr).await? {
        None => {
            let event = ReviewEvent::for_request_changes(policy.request_changes);
            api.create_review(pr, body, event).await?;
            info!(pr = %pr, %event, "created review");
            Ok(ReviewWrite::Created { event })
        }
        Some(review) => {
            api.update_review(pr, review.id, body).await?;
            info!(pr = %pr, review_id = review.id, "updated existing review");
            Ok(ReviewWrite::Updated {
                review_id: review.id,
            })
        }
    }
}

/// Dismiss or supersede the bot review once the title is valid.
///
/// Never fails: every error is logged and reflected in the returned outcome.
pub async fn dismiss_review<A>(api: &A, pr: &PullRequestRef, message: &str) -> DismissOutcome
where
    A: PullRequestApi + ?Sized,
{
    let found = find_bot_review(api, pr).await;
    dismiss_found(api, pr, &found, message).await
}

/// [`dismiss_review`] for a lookup the caller already made.
pub async fn dismiss_found<A>(
    api: &A,
    pr: &PullRequestRef,
    found: &ReviewLookup,
    message: &str,
) -> DismissOutcome
where
    A: PullRequestApi + ?Sized,
{
    match found {
        Ok(Some(review)) => dismiss_existing(api, pr, review, message).await,
        Ok(None) => {
            info!(pr = %pr, "no review found to dismiss");
            DismissOutcome::NotFound
        }
        Err(e) => {
            warn!(pr = %pr, error = %e, "could not look up review to dismiss");
            DismissOutcome::Abandoned {
                review_id: None,
                error: e.to_string(),
            }
        }
    }
}

/// Apply the dismiss policy to a review that has already been looked up.
///
/// Only `APPROVED` and `CHANGES_REQUESTED` reviews can be dismissed; a
/// `COMMENTED` review is superseded by a new `COMMENT` review.
pub async fn dismiss_existing<A>(
    api: &A,
    pr: &PullRequestRef,
    review: &Review,
    message: &str,
) -> DismissOutcome
where
    A: PullRequestApi + ?Sized,
{
    let review_id = review.id;
    info!(review_id, state = %review.state, "found existing review");

    match &review.state {
        ReviewState::Approved | ReviewState::ChangesRequested => {
            debug!(review_id, "dismissing review");
            let error = match api.dismiss_review(pr, review_id, message).await {
                Ok(()) => {
                    info!(review_id, "dismissed review");
                    return DismissOutcome::Dismissed { review_id };
                }
                Err(e) => e,
            };
            warn!(review_id, error = %error, "error dismissing review; posting a comment instead");
            match api.create_review(pr, message, ReviewEvent::Comment).await {
                Ok(()) => DismissOutcome::FellBack {
                    review_id,
                    error: error.to_string(),
                },
                Err(e) => {
                    warn!(review_id, error = %e, "error creating comment review");
                    DismissOutcome::Abandoned {
                        review_id: Some(review_id),
                        error: e.to_string(),
                    }
                }
            }
        }
        ReviewState::Commented => {
            info!(review_id, "review is only commented; posting a new comment instead of dismissing");
            match api.create_review(pr, message, ReviewEvent::Comment).await {
                Ok(()) => DismissOutcome::Replaced { review_id },
                Err(e) => {
                    warn!(review_id, error = %e, "error creating comment review");
                    DismissOutcome::Abandoned {
                        review_id: Some(review_id),
                        error: e.to_string(),
                    }
                }
            }
        }
        other => {
            info!(review_id, state = %other, "review state cannot be dismissed; leaving it");
            DismissOutcome::Ignored {
                review_id,
                state: other.clone(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dismiss_outcome_serializes_tagged() {
        let json = serde_json::to_value(DismissOutcome::FellBack {
            review_id: 3,
            error: "forbidden".into(),
        })
        .unwrap();
        assert_eq!(json["outcome"], "fellBack");
        assert_eq!(json["reviewId"], 3);
    }

    #[test]
    fn review_write_serializes_event() {
        let json = serde_json::to_value(ReviewWrite::Created {
            event: ReviewEvent::Comment,
        })
        .unwrap();
        assert_eq!(json["action"], "created");
        assert_eq!(json["event"], "COMMENT");
    }
}

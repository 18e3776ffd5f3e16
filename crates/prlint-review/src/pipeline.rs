use prlint_core::{PrlintError, PullRequestRef, TitlePolicy};
use serde::Serialize;
use tracing::info;

use crate::api::PullRequestApi;
use crate::lookup::find_bot_review;
use crate::minimize::{minimize_feedback_for, MinimizeReport};
use crate::reconcile::{create_or_update_review, dismiss_found, DismissOutcome, ReviewWrite};
use crate::title::evaluate;

/// Everything one run did.
///
/// # Examples
///
/// ```
/// use prlint_core::PullRequestRef;
/// use prlint_review::pipeline::RunReport;
///
/// let report = RunReport::new(PullRequestRef::new("o", "r", 1), "feat: x".into(), true);
/// assert!(report.failure.is_none());
/// assert!(report.review_write.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub pr: PullRequestRef,
    pub title: String,
    /// Whether the title matched the pattern.
    pub matched: bool,
    /// Set when a mismatch wrote the bot review.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_write: Option<ReviewWrite>,
    /// Set when a match ran the dismiss policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dismissal: Option<DismissOutcome>,
    /// Set when a match ran the minimize sweep.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimize: Option<MinimizeReport>,
    /// Message the step must fail with, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
}

impl RunReport {
    pub fn new(pr: PullRequestRef, title: String, matched: bool) -> Self {
        Self {
            pr,
            title,
            matched,
            review_write: None,
            dismissal: None,
            minimize: None,
            failure: None,
        }
    }
}

/// Check `title` against the policy and reconcile bot feedback on `pr`.
///
/// On a mismatch the bot review is created or updated (when enabled) and the
/// rendered comment becomes the step failure (when enabled). On a match the
/// bot review is dismissed and, when enabled, stale feedback is minimized.
///
/// # Errors
///
/// Returns [`PrlintError::GitHub`] only if writing the failure review fails.
/// Dismiss and minimize problems are recorded in the report instead.
pub async fn run_check<A>(
    api: &A,
    policy: &TitlePolicy,
    pr: &PullRequestRef,
    title: &str,
) -> Result<RunReport, PrlintError>
where
    A: PullRequestApi + ?Sized,
{
    let matched = evaluate(&policy.pattern, title);
    let mut report = RunReport::new(pr.clone(), title.to_string(), matched);

    if !matched {
        info!(pr = %pr, "title does not match");
        let comment = policy.rendered_comment();
        if policy.create_review {
            report.review_write = Some(create_or_update_review(api, policy, pr, &comment).await?);
        }
        if policy.fail_action {
            report.failure = Some(comment);
        }
        return Ok(report);
    }

    info!(pr = %pr, "title matches");
    if policy.create_review {
        info!("dismissing any existing review");
        let found = find_bot_review(api, pr).await;
        report.dismissal = Some(dismiss_found(api, pr, &found, &policy.dismiss_comment).await);

        // Dismissal changes the review's state, so minimize reuses this lookup.
        if policy.minimize_on_success {
            report.minimize = Some(minimize_feedback_for(api, policy, pr, &found).await);
        }
    }
    Ok(report)
}

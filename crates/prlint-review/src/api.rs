use async_trait::async_trait;
use prlint_core::{
    Comment, CommentSource, MinimizeOutcome, MinimizeReason, NodeRef, PrlintError,
    PullRequestRef, Review, ReviewEvent,
};

/// The GitHub operations the title check needs.
///
/// [`GitHubClient`](crate::github::GitHubClient) implements this over REST and
/// GraphQL; tests substitute an in-memory recorder.
#[async_trait]
pub trait PullRequestApi: Send + Sync {
    /// List the reviews on a pull request, oldest first.
    async fn list_reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>, PrlintError>;

    /// Submit a new review.
    async fn create_review(
        &self,
        pr: &PullRequestRef,
        body: &str,
        event: ReviewEvent,
    ) -> Result<(), PrlintError>;

    /// Replace the body of an existing review. The review state is unchanged.
    async fn update_review(
        &self,
        pr: &PullRequestRef,
        review_id: u64,
        body: &str,
    ) -> Result<(), PrlintError>;

    /// Dismiss a review with `message`.
    async fn dismiss_review(
        &self,
        pr: &PullRequestRef,
        review_id: u64,
        message: &str,
    ) -> Result<(), PrlintError>;

    /// List top-level conversation comments.
    async fn list_issue_comments(&self, pr: &PullRequestRef) -> Result<Vec<Comment>, PrlintError>;

    /// List inline diff comments.
    async fn list_review_comments(&self, pr: &PullRequestRef)
        -> Result<Vec<Comment>, PrlintError>;

    /// Node ids of the first 100 reviews on the pull request.
    async fn review_nodes(&self, pr: &PullRequestRef) -> Result<Vec<NodeRef>, PrlintError>;

    /// Node ids of the first 100 comments of the given kind.
    async fn comment_nodes(
        &self,
        pr: &PullRequestRef,
        source: CommentSource,
    ) -> Result<Vec<NodeRef>, PrlintError>;

    /// Collapse a comment or review without deleting it.
    async fn minimize(
        &self,
        node_id: &str,
        reason: MinimizeReason,
        client_mutation_id: &str,
    ) -> Result<MinimizeOutcome, PrlintError>;
}

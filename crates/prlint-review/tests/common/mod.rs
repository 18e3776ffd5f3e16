//! In-memory `PullRequestApi` that records every call.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use prlint_core::{
    Actor, Comment, CommentSource, MinimizeOutcome, MinimizeReason, NodeRef, PolicyConfig,
    PrlintError, PullRequestRef, Review, ReviewEvent, ReviewState, TitlePolicy, BOT_LOGIN,
};
use prlint_review::api::PullRequestApi;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    ListReviews,
    CreateReview { body: String, event: ReviewEvent },
    UpdateReview { review_id: u64, body: String },
    DismissReview { review_id: u64, message: String },
    ListIssueComments,
    ListReviewComments,
    ReviewNodes,
    CommentNodes(CommentSource),
    Minimize {
        node_id: String,
        reason: MinimizeReason,
        client_mutation_id: String,
    },
}

/// Operations a test can make fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    ListReviews,
    CreateReview,
    UpdateReview,
    DismissReview,
    ListIssueComments,
    ListReviewComments,
    ReviewNodes,
    CommentNodes,
    Minimize,
}

#[derive(Default)]
pub struct FakeApi {
    pub reviews: Vec<Review>,
    pub issue_comments: Vec<Comment>,
    pub review_comments: Vec<Comment>,
    pub review_nodes: Vec<NodeRef>,
    pub issue_comment_nodes: Vec<NodeRef>,
    pub review_comment_nodes: Vec<NodeRef>,
    failing: HashSet<Op>,
    failing_nodes: HashSet<String>,
    dismissed: Mutex<HashSet<u64>>,
    calls: Mutex<Vec<Call>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing(mut self, op: Op) -> Self {
        self.failing.insert(op);
        self
    }

    /// Make the minimize mutation fail for one node only.
    pub fn failing_minimize_of(mut self, node_id: &str) -> Self {
        self.failing_nodes.insert(node_id.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn check(&self, op: Op) -> Result<(), PrlintError> {
        if self.failing.contains(&op) {
            Err(PrlintError::GitHub(format!("simulated {op:?} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl PullRequestApi for FakeApi {
    async fn list_reviews(&self, _pr: &PullRequestRef) -> Result<Vec<Review>, PrlintError> {
        self.record(Call::ListReviews);
        self.check(Op::ListReviews)?;
        let dismissed = self.dismissed.lock().unwrap();
        Ok(self
            .reviews
            .iter()
            .cloned()
            .map(|mut r| {
                if dismissed.contains(&r.id) {
                    r.state = ReviewState::Dismissed;
                }
                r
            })
            .collect())
    }

    async fn create_review(
        &self,
        _pr: &PullRequestRef,
        body: &str,
        event: ReviewEvent,
    ) -> Result<(), PrlintError> {
        self.record(Call::CreateReview {
            body: body.to_string(),
            event,
        });
        self.check(Op::CreateReview)
    }

    async fn update_review(
        &self,
        _pr: &PullRequestRef,
        review_id: u64,
        body: &str,
    ) -> Result<(), PrlintError> {
        self.record(Call::UpdateReview {
            review_id,
            body: body.to_string(),
        });
        self.check(Op::UpdateReview)
    }

    async fn dismiss_review(
        &self,
        _pr: &PullRequestRef,
        review_id: u64,
        message: &str,
    ) -> Result<(), PrlintError> {
        self.record(Call::DismissReview {
            review_id,
            message: message.to_string(),
        });
        self.check(Op::DismissReview)?;
        self.dismissed.lock().unwrap().insert(review_id);
        Ok(())
    }

    async fn list_issue_comments(&self, _pr: &PullRequestRef) -> Result<Vec<Comment>, PrlintError> {
        self.record(Call::ListIssueComments);
        self.check(Op::ListIssueComments)?;
        Ok(self.issue_comments.clone())
    }

    async fn list_review_comments(
        &self,
        _pr: &PullRequestRef,
    ) -> Result<Vec<Comment>, PrlintError> {
        self.record(Call::ListReviewComments);
        self.check(Op::ListReviewComments)?;
        Ok(self.review_comments.clone())
    }

    async fn review_nodes(&self, _pr: &PullRequestRef) -> Result<Vec<NodeRef>, PrlintError> {
        self.record(Call::ReviewNodes);
        self.check(Op::ReviewNodes)?;
        Ok(self.review_nodes.clone())
    }

    async fn comment_nodes(
        &self,
        _pr: &PullRequestRef,
        source: CommentSource,
    ) -> Result<Vec<NodeRef>, PrlintError> {
        self.record(Call::CommentNodes(source));
        self.check(Op::CommentNodes)?;
        Ok(match source {
            CommentSource::IssueComment => self.issue_comment_nodes.clone(),
            CommentSource::ReviewComment => self.review_comment_nodes.clone(),
        })
    }

    async fn minimize(
        &self,
        node_id: &str,
        reason: MinimizeReason,
        client_mutation_id: &str,
    ) -> Result<MinimizeOutcome, PrlintError> {
        self.record(Call::Minimize {
            node_id: node_id.to_string(),
            reason,
            client_mutation_id: client_mutation_id.to_string(),
        });
        self.check(Op::Minimize)?;
        if self.failing_nodes.contains(node_id) {
            return Err(PrlintError::GitHub(format!("simulated minimize failure for {node_id}")));
        }
        Ok(MinimizeOutcome {
            is_minimized: true,
            minimized_reason: Some(reason.as_str().to_lowercase()),
        })
    }
}

pub const PATTERN: &str = "^(feat|fix|chore):";
pub const DISMISS_MESSAGE: &str = "Title fixed, thanks!";

pub fn pr() -> PullRequestRef {
    PullRequestRef::new("octocat", "hello-world", 42)
}

pub fn policy() -> TitlePolicy {
    TitlePolicy::from_config(&PolicyConfig {
        title_regex: Some(PATTERN.into()),
        on_failed_regex_comment: Some("Title must match `%regex%`".into()),
        on_failed_regex_create_review: Some(true),
        on_succeeded_regex_dismiss_review_comment: Some(DISMISS_MESSAGE.into()),
        ..PolicyConfig::default()
    })
    .unwrap()
}

pub fn review(id: u64, state: &str, login: &str) -> Review {
    Review {
        id,
        state: ReviewState::from(state.to_string()),
        user: Some(Actor {
            login: login.into(),
        }),
    }
}

pub fn bot_review(id: u64, state: &str) -> Review {
    review(id, state, BOT_LOGIN)
}

pub fn comment(id: u64, login: &str) -> Comment {
    Comment {
        id,
        user: Some(Actor {
            login: login.into(),
        }),
    }
}

pub fn node(id: &str, database_id: u64) -> NodeRef {
    NodeRef {
        id: id.into(),
        database_id: Some(database_id),
    }
}

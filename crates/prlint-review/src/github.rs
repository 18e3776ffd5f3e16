use async_trait::async_trait;
use prlint_core::{
    Comment, CommentSource, MinimizeOutcome, MinimizeReason, NodeRef, PrlintError,
    PullRequestRef, Review, ReviewEvent,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::api::PullRequestApi;

const PAGE: [(&str, &str); 1] = [("per_page", "100")];

const REVIEW_NODES_QUERY: &str = r#"
query ReviewNodes($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $number) {
      reviews(first: 100) {
        nodes { id databaseId }
      }
    }
  }
}"#;

const ISSUE_COMMENT_NODES_QUERY: &str = r#"
query IssueCommentNodes($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    issueOrPullRequest(number: $number) {
      ... on Issue {
        comments(first: 100) { nodes { id databaseId } }
      }
      ... on PullRequest {
        comments(first: 100) { nodes { id databaseId } }
      }
    }
  }
}"#;

const REVIEW_COMMENT_NODES_QUERY: &str = r#"
query ReviewCommentNodes($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    pullRequest(number: $number) {
      reviews(first: 100) {
        nodes {
          comments(first: 100) { nodes { id databaseId } }
        }
      }
    }
  }
}"#;

const MINIMIZE_MUTATION: &str = r#"
mutation MinimizeComment($input: MinimizeCommentInput!) {
  minimizeComment(input: $input) {
    minimizedComment { isMinimized minimizedReason }
  }
}"#;

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Deserialize)]
struct Connection<T> {
    #[serde(default = "Vec::new")]
    nodes: Vec<Option<T>>,
}

impl<T> Connection<T> {
    fn into_nodes(self) -> impl Iterator<Item = T> {
        self.nodes.into_iter().flatten()
    }
}

#[derive(Deserialize)]
struct RepositoryData<T> {
    repository: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithPullRequest<T> {
    pull_request: Option<T>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithIssueOrPullRequest {
    issue_or_pull_request: Option<WithComments>,
}

#[derive(Deserialize)]
struct WithReviews<T> {
    reviews: Connection<T>,
}

#[derive(Deserialize)]
struct WithComments {
    comments: Connection<NodeRef>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MinimizeData {
    minimize_comment: Option<MinimizePayload>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct MinimizePayload {
    minimized_comment: Option<MinimizeOutcome>,
}

/// GitHub client for the review and comment operations prlint performs.
///
/// REST calls go through octocrab's generic verbs and GraphQL through
/// [`octocrab::Octocrab::graphql`]; responses are decoded into the minimal
/// types in `prlint_core`.
pub struct GitHubClient {
    octocrab: octocrab::Octocrab,
    /// Rooted where `/graphql` lives, which differs from the REST root on
    /// GitHub Enterprise.
    graphql: octocrab::Octocrab,
}

impl GitHubClient {
    /// Create a client authenticated with `token`.
    ///
    /// `base_uri` points the client at a GitHub Enterprise API
    /// (e.g. the value of `GITHUB_API_URL`); `None` uses github.com.
    ///
    /// # Errors
    ///
    /// Returns [`PrlintError::Config`] if `base_uri` is not a valid URI, or
    /// [`PrlintError::GitHub`] if the client cannot be built.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use prlint_review::github::GitHubClient;
    ///
    /// let client = GitHubClient::new("ghp_xxxx", None).unwrap();
    /// ```
    pub fn new(token: &str, base_uri: Option<&str>) -> Result<Self, PrlintError> {
        let octocrab = build_octocrab(token, base_uri)?;
        let graphql_root = base_uri.map(graphql_root);
        let graphql = build_octocrab(token, graphql_root)?;

        Ok(Self { octocrab, graphql })
    }

    async fn graphql<T>(
        &self,
        query: &str,
        variables: serde_json::Value,
        what: &str,
    ) -> Result<T, PrlintError>
    where
        T: DeserializeOwned + Send,
    {
        let payload = serde_json::json!({
            "query": query,
            "variables": variables,
        });
        let response: GraphQlResponse<T> = self
            .graphql
            .graphql(&payload)
            .await
            .map_err(|e| PrlintError::GitHub(format!("{what}: {e}")))?;

        if !response.errors.is_empty() {
            let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
            return Err(PrlintError::GitHub(format!("{what}: {}", messages.join("; "))));
        }
        response
            .data
            .ok_or_else(|| PrlintError::GitHub(format!("{what}: response carried no data")))
    }
}

fn build_octocrab(token: &str, base_uri: Option<&str>) -> Result<octocrab::Octocrab, PrlintError> {
    let mut builder = octocrab::Octocrab::builder().personal_token(token.to_string());
    if let Some(uri) = base_uri {
        builder = builder
            .base_uri(uri)
            .map_err(|e| PrlintError::Config(format!("invalid GitHub API URL '{uri}': {e}")))?;
    }
    builder
        .build()
        .map_err(|e| PrlintError::GitHub(format!("failed to create GitHub client: {e}")))
}

/// Base URI under which octocrab's `/graphql` route resolves.
///
/// octocrab prefixes every route with the base path, and GitHub Enterprise
/// serves REST under `/api/v3` but GraphQL at `/api/graphql`.
fn graphql_root(api_url: &str) -> &str {
    let trimmed = api_url.trim_end_matches('/');
    trimmed.strip_suffix("/v3").unwrap_or(trimmed)
}

fn pr_variables(pr: &PullRequestRef) -> serde_json::Value {
    serde_json::json!({
        "owner": pr.owner,
        "repo": pr.repo,
        "number": pr.number,
    })
}

fn pulls_route(pr: &PullRequestRef) -> String {
    format!("/repos/{}/{}/pulls/{}", pr.owner, pr.repo, pr.number)
}

#[async_trait]
impl PullRequestApi for GitHubClient {
    async fn list_reviews(&self, pr: &PullRequestRef) -> Result<Vec<Review>, PrlintError> {
        let route = format!("{}/reviews", pulls_route(pr));
        self.octocrab
            .get(route, Some(&PAGE))
            .await
            .map_err(|e| PrlintError::GitHub(format!("failed to list reviews on {pr}: {e}")))
    }

    async fn create_review(
        &self,
        pr: &PullRequestRef,
        body: &str,
        event: ReviewEvent,
    ) -> Result<(), PrlintError> {
        let route = format!("{}/reviews", pulls_route(pr));
        let payload = serde_json::json!({
            "body": body,
            "event": event,
        });
        let _response: serde_json::Value = self
            .octocrab
            .post(route, Some(&payload))
            .await
            .map_err(|e| PrlintError::GitHub(format!("failed to create review on {pr}: {e}")))?;
        Ok(())
    }

    async fn update_review(
        &self,
        pr: &PullRequestRef,
        review_id: u64,
        body: &str,
    ) -> Result<(), PrlintError> {
        let route = format!("{}/reviews/{review_id}", pulls_route(pr));
        let payload = serde_json::json!({ "body": body });
        let _response: serde_json::Value =
            self.octocrab.put(route, Some(&payload)).await.map_err(|e| {
                PrlintError::GitHub(format!("failed to update review {review_id}: {e}"))
            })?;
        Ok(())
    }

    async fn dismiss_review(
        &self,
        pr: &PullRequestRef,
        review_id: u64,
        message: &str,
    ) -> Result<(), PrlintError> {
        let route = format!("{}/reviews/{review_id}/dismissals", pulls_route(pr));
        let payload = serde_json::json!({
            "message": message,
            "event": "DISMISS",
        });
        let _response: serde_json::Value =
            self.octocrab.put(route, Some(&payload)).await.map_err(|e| {
                PrlintError::GitHub(format!("failed to dismiss review {review_id}: {e}"))
            })?;
        Ok(())
    }

    async fn list_issue_comments(&self, pr: &PullRequestRef) -> Result<Vec<Comment>, PrlintError> {
        let route = format!("/repos/{}/{}/issues/{}/comments", pr.owner, pr.repo, pr.number);
        self.octocrab.get(route, Some(&PAGE)).await.map_err(|e| {
            PrlintError::GitHub(format!("failed to list issue comments on {pr}: {e}"))
        })
    }

    async fn list_review_comments(
        &self,
        pr: &PullRequestRef,
    ) -> Result<Vec<Comment>, PrlintError> {
        let route = format!("{}/comments", pulls_route(pr));
        self.octocrab.get(route, Some(&PAGE)).await.map_err(|e| {
            PrlintError::GitHub(format!("failed to list review comments on {pr}: {e}"))
        })
    }

    async fn review_nodes(&self, pr: &PullRequestRef) -> Result<Vec<NodeRef>, PrlintError> {
        let data: RepositoryData<WithPullRequest<WithReviews<NodeRef>>> = self
            .graphql(REVIEW_NODES_QUERY, pr_variables(pr), "review node lookup")
            .await?;

        let Some(pull_request) = data.repository.and_then(|r| r.pull_request) else {
            debug!(pr = %pr, "no pull request in review node lookup");
            return Ok(Vec::new());
        };
        Ok(pull_request.reviews.into_nodes().collect())
    }

    async fn comment_nodes(
        &self,
        pr: &PullRequestRef,
        source: CommentSource,
    ) -> Result<Vec<NodeRef>, PrlintError> {
        match source {
            CommentSource::IssueComment => {
                let data: RepositoryData<WithIssueOrPullRequest> = self
                    .graphql(
                        ISSUE_COMMENT_NODES_QUERY,
                        pr_variables(pr),
                        "issue comment node lookup",
                    )
                    .await?;
                let Some(holder) = data.repository.and_then(|r| r.issue_or_pull_request) else {
                    debug!(pr = %pr, "no issue or pull request in comment node lookup");
                    return Ok(Vec::new());
                };
                Ok(holder.comments.into_nodes().collect())
            }
            CommentSource::ReviewComment => {
                let data: RepositoryData<WithPullRequest<WithReviews<WithComments>>> = self
                    .graphql(
                        REVIEW_COMMENT_NODES_QUERY,
                        pr_variables(pr),
                        "review comment node lookup",
                    )
                    .await?;
                let Some(pull_request) = data.repository.and_then(|r| r.pull_request) else {
                    debug!(pr = %pr, "no pull request in review comment node lookup");
                    return Ok(Vec::new());
                };
                Ok(pull_request
                    .reviews
                    .into_nodes()
                    .flat_map(|review| review.comments.into_nodes())
                    .collect())
            }
        }
    }

    async fn minimize(
        &self,
        node_id: &str,
        reason: MinimizeReason,
        client_mutation_id: &str,
    ) -> Result<MinimizeOutcome, PrlintError> {
        let variables = serde_json::json!({
            "input": {
                "subjectId": node_id,
                "classifier": reason,
                "clientMutationId": client_mutation_id,
            }
        });
        let data: MinimizeData = self
            .graphql(MINIMIZE_MUTATION, variables, "minimize mutation")
            .await?;

        data.minimize_comment
            .and_then(|m| m.minimized_comment)
            .ok_or_else(|| {
                PrlintError::GitHub(format!("minimize mutation returned no comment for {node_id}"))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn graphql_root_strips_enterprise_rest_version() {
        assert_eq!(graphql_root("https://ghe.example.com/api/v3"), "https://ghe.example.com/api");
        assert_eq!(graphql_root("https://ghe.example.com/api/v3/"), "https://ghe.example.com/api");
        assert_eq!(graphql_root("https://api.github.com"), "https://api.github.com");
    }

    #[test]
    fn connection_without_nodes_decodes_empty() {
        let connection: Connection<NodeRef> = serde_json::from_str("{}").unwrap();
        assert_eq!(connection.into_nodes().count(), 0);
    }

    #[test]
    fn review_nodes_skip_null_entries() {
        let json = r#"{
            "data": {"repository": {"pullRequest": {"reviews": {"nodes": [
                {"id": "PRR_a", "databaseId": 1},
                null,
                {"id": "PRR_b", "databaseId": 2}
            ]}}}}
        }"#;
        let response: GraphQlResponse<RepositoryData<WithPullRequest<WithReviews<NodeRef>>>> =
            serde_json::from_str(json).unwrap();
        let nodes: Vec<NodeRef> = response
            .data
            .unwrap()
            .repository
            .unwrap()
            .pull_request
            .unwrap()
            .reviews
            .into_nodes()
            .collect();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[1].id, "PRR_b");
        assert_eq!(nodes[1].database_id, Some(2));
    }

    #[test]
    fn missing_pull_request_decodes_as_none() {
        let json = r#"{"data": {"repository": {"pullRequest": null}}}"#;
        let response: GraphQlResponse<RepositoryData<WithPullRequest<WithReviews<NodeRef>>>> =
            serde_json::from_str(json).unwrap();
        assert!(response.data.unwrap().repository.unwrap().pull_request.is_none());
    }

    #[test]
    fn graphql_errors_are_collected() {
        let json = r#"{"data": null, "errors": [{"message": "Could not resolve to a node"}]}"#;
        let response: GraphQlResponse<MinimizeData> = serde_json::from_str(json).unwrap();
        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "Could not resolve to a node");
    }

    #[test]
    fn minimize_payload_decodes() {
        let json = r#"{"data": {"minimizeComment": {"minimizedComment": {"isMinimized": true, "minimizedReason": "resolved"}}}}"#;
        let response: GraphQlResponse<MinimizeData> = serde_json::from_str(json).unwrap();
        let outcome = response
            .data
            .unwrap()
            .minimize_comment
            .unwrap()
            .minimized_comment
            .unwrap();
        assert!(outcome.is_minimized);
    }

    #[test]
    fn review_comment_nodes_flatten_across_reviews() {
        let json = r#"{"data": {"repository": {"pullRequest": {"reviews": {"nodes": [
            {"comments": {"nodes": [{"id": "PRRC_1", "databaseId": 10}]}},
            {"comments": {"nodes": [{"id": "PRRC_2", "databaseId": 11}, {"id": "PRRC_3", "databaseId": 12}]}}
        ]}}}}}"#;
        let response: GraphQlResponse<
            RepositoryData<WithPullRequest<WithReviews<WithComments>>>,
        > = serde_json::from_str(json).unwrap();
        let ids: Vec<String> = response
            .data
            .unwrap()
            .repository
            .unwrap()
            .pull_request
            .unwrap()
            .reviews
            .into_nodes()
            .flat_map(|r| r.comments.into_nodes())
            .map(|n| n.id)
            .collect();
        assert_eq!(ids, vec!["PRRC_1", "PRRC_2", "PRRC_3"]);
    }
}

use serde::Deserialize;

use crate::issue_model::{GithubIssue, GithubIssueComment, GithubUser};

pub const ISSUES_EVENT: &str = "issues";
pub const ISSUE_COMMENT_EVENT: &str = "issue_comment";

pub const ACTION_OPENED: &str = "opened";
pub const ACTION_REOPENED: &str = "reopened";
pub const ACTION_LABELED: &str = "labeled";
pub const ACTION_DELETED: &str = "deleted";

#[derive(Debug, Clone, Deserialize)]
/// Repository identity carried by every webhook delivery; handlers compare
/// `full_name` against the configured target before acting.
pub struct WebhookRepository {
    pub id: u64,
    pub full_name: String,
}

#[derive(Debug, Clone, Deserialize)]
/// Envelope for `issues` webhook deliveries.
pub struct IssuesEventPayload {
    pub action: String,
    pub repository: WebhookRepository,
    pub issue: GithubIssue,
}

#[derive(Debug, Clone, Deserialize)]
/// Envelope for `issue_comment` webhook deliveries.
pub struct IssueCommentEventPayload {
    pub action: String,
    pub repository: WebhookRepository,
    pub issue: GithubIssue,
    pub comment: GithubIssueComment,
    #[serde(default)]
    pub sender: Option<GithubUser>,
}

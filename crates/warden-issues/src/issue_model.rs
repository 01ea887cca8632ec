use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const ISSUE_STATE_OPEN: &str = "open";
pub const ISSUE_STATE_CLOSED: &str = "closed";

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubUser` used across Warden components.
pub struct GithubUser {
    pub login: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubIssueLabel` used across Warden components.
pub struct GithubIssueLabel {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Read-only issue snapshot as returned by the tracker.
pub struct GithubIssue {
    pub id: u64,
    pub number: u64,
    pub title: String,
    pub body: Option<String>,
    pub state: String,
    #[serde(default)]
    pub state_reason: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub user: GithubUser,
    #[serde(default)]
    pub labels: Vec<GithubIssueLabel>,
    #[serde(default)]
    pub pull_request: Option<Value>,
}

impl GithubIssue {
    pub fn is_open(&self) -> bool {
        self.state == ISSUE_STATE_OPEN
    }

    /// A present `pull_request` value means the "issue" is a merge request
    /// sharing the issue numbering space; automation never touches those.
    pub fn is_pull_request(&self) -> bool {
        self.pull_request.is_some()
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|label| label.name == name)
    }

    pub fn label_names(&self) -> Vec<String> {
        self.labels.iter().map(|label| label.name.clone()).collect()
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
/// Public struct `GithubIssueComment` used across Warden components.
pub struct GithubIssueComment {
    pub id: u64,
    pub body: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub user: GithubUser,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
/// PATCH payload for an issue update.
///
/// The tracker replaces the whole label list on update, so the builder is
/// seeded from the issue's current labels and label adds/removes mutate that
/// seeded list before serialization.
pub struct IssueUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
}

impl IssueUpdate {
    pub fn from_issue(issue: &GithubIssue) -> Self {
        Self {
            state: None,
            state_reason: None,
            labels: Some(issue.label_names()),
        }
    }

    pub fn close(&mut self, state_reason: &str) {
        self.state = Some(ISSUE_STATE_CLOSED.to_string());
        self.state_reason = Some(state_reason.to_string());
    }

    pub fn add_label(&mut self, name: &str) {
        let labels = self.labels.get_or_insert_with(Vec::new);
        if !labels.iter().any(|existing| existing == name) {
            labels.push(name.to_string());
        }
    }

    pub fn remove_label(&mut self, name: &str) {
        if let Some(labels) = self.labels.as_mut() {
            labels.retain(|existing| existing != name);
        }
    }
}

pub fn parse_rfc3339_to_unix_ms(raw: &str) -> Option<u64> {
    let parsed = chrono::DateTime::parse_from_rfc3339(raw).ok()?;
    u64::try_from(parsed.timestamp_millis()).ok()
}

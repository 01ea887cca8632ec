use std::sync::OnceLock;

use regex::Regex;

use crate::issue_action::{CloseDirective, CloseReason, IssueAction};
use crate::issue_model::GithubIssue;

pub const INVALID_LABEL: &str = "invalid";

pub const EMPTY_ISSUE_CLOSE_COMMENT: &str =
    "This issue would be closed for no title or content.";

fn leading_tag_regex() -> &'static Regex {
    static LEADING_TAG: OnceLock<Regex> = OnceLock::new();
    LEADING_TAG.get_or_init(|| {
        Regex::new(r"^\s*(\[[^\]]*\])?(.*)$").expect("leading tag pattern is valid")
    })
}

/// Returns the title with an optional leading `[...]` tag stripped.
pub fn title_without_leading_tag(title: &str) -> &str {
    leading_tag_regex()
        .captures(title)
        .and_then(|captures| captures.get(2))
        .map(|rest| rest.as_str())
        .unwrap_or(title)
}

/// Validity check applied when an issue is opened or reopened.
///
/// Three checks run in order and short-circuit on the first hit: blank
/// title, blank body, and a title that is nothing but a leading bracketed
/// tag. Any hit closes the issue as not planned with the `invalid` label.
pub fn evaluate_opened(issue: &GithubIssue) -> IssueAction {
    let flagged = issue.title.trim().is_empty()
        || issue.body.as_deref().unwrap_or_default().trim().is_empty()
        || title_without_leading_tag(&issue.title).trim().is_empty();
    if !flagged {
        return IssueAction::None;
    }
    IssueAction::Close(CloseDirective {
        reason: CloseReason::NotPlanned,
        comment: EMPTY_ISSUE_CLOSE_COMMENT.to_string(),
        add_labels: vec![INVALID_LABEL.to_string()],
        remove_labels: Vec::new(),
    })
}

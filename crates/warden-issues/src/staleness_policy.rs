use crate::issue_action::{CloseDirective, CloseReason, IssueAction};
use crate::issue_model::{parse_rfc3339_to_unix_ms, GithubIssue};

pub const STALE_AFTER_DAYS: u64 = 14;
const STALE_AFTER_MS: u64 = STALE_AFTER_DAYS * 24 * 60 * 60 * 1_000;

/// Labels that exempt an issue from staleness closing.
pub const STALE_EXEMPT_LABELS: [&str; 4] = ["triage", "bug", "enhancement", "document"];

pub const WAIT_FOR_REPLY_LABEL: &str = "wait for reply";
pub const LONG_TIME_NO_REPLY_LABEL: &str = "long time no reply";

const FEATURE_TITLE_MARKER: &str = "[feature]";

pub const STALE_CLOSE_COMMENT: &str =
    "This issue will be closed due to no reply for more than 14 days.";

/// Decides whether an open issue has gone stale and how to close it.
///
/// Only open, non-pull-request issues without an exempt label are eligible;
/// everything else maps to `IssueAction::None`. An unparseable `updated_at`
/// is treated as fresh.
pub fn evaluate_staleness(issue: &GithubIssue, now_unix_ms: u64) -> IssueAction {
    if !issue.is_open() || issue.is_pull_request() {
        return IssueAction::None;
    }
    if STALE_EXEMPT_LABELS
        .iter()
        .any(|label| issue.has_label(label))
    {
        return IssueAction::None;
    }
    let Some(updated_unix_ms) = parse_rfc3339_to_unix_ms(&issue.updated_at) else {
        return IssueAction::None;
    };
    if now_unix_ms.saturating_sub(updated_unix_ms) <= STALE_AFTER_MS {
        return IssueAction::None;
    }

    if issue.has_label(WAIT_FOR_REPLY_LABEL) {
        return IssueAction::Close(CloseDirective {
            reason: CloseReason::NotPlanned,
            comment: STALE_CLOSE_COMMENT.to_string(),
            add_labels: vec![LONG_TIME_NO_REPLY_LABEL.to_string()],
            remove_labels: vec![WAIT_FOR_REPLY_LABEL.to_string()],
        });
    }
    if issue.title.to_lowercase().contains(FEATURE_TITLE_MARKER) {
        return IssueAction::Close(CloseDirective {
            reason: CloseReason::NotPlanned,
            comment: STALE_CLOSE_COMMENT.to_string(),
            add_labels: Vec::new(),
            remove_labels: Vec::new(),
        });
    }
    IssueAction::Close(CloseDirective {
        reason: CloseReason::Completed,
        comment: STALE_CLOSE_COMMENT.to_string(),
        add_labels: Vec::new(),
        remove_labels: Vec::new(),
    })
}

#[cfg(test)]
mod tests {
    use super::{
        evaluate_staleness, LONG_TIME_NO_REPLY_LABEL, STALE_CLOSE_COMMENT, STALE_EXEMPT_LABELS,
        WAIT_FOR_REPLY_LABEL,
    };
    use crate::issue_action::{CloseReason, IssueAction};
    use crate::issue_model::{GithubIssue, GithubIssueLabel, GithubUser};

    const DAY_MS: u64 = 24 * 60 * 60 * 1_000;
    // 2026-02-01T00:00:00Z
    const NOW_MS: u64 = 1_769_904_000_000;

    fn issue_updated_at(days_before_now: u64, title: &str, labels: &[&str]) -> GithubIssue {
        let updated_unix_ms = NOW_MS - days_before_now * DAY_MS;
        let updated_at = chrono::DateTime::from_timestamp_millis(updated_unix_ms as i64)
            .expect("valid test timestamp")
            .to_rfc3339();
        GithubIssue {
            id: 1,
            number: 7,
            title: title.to_string(),
            body: Some("body".to_string()),
            state: "open".to_string(),
            state_reason: None,
            created_at: "2025-01-01T00:00:00Z".to_string(),
            updated_at,
            user: GithubUser {
                login: "alice".to_string(),
            },
            labels: labels
                .iter()
                .map(|name| GithubIssueLabel {
                    name: name.to_string(),
                })
                .collect(),
            pull_request: None,
        }
    }

    #[test]
    fn unit_fresh_issue_maps_to_none_regardless_of_labels_and_title() {
        let issue = issue_updated_at(3, "[Feature] anything", &[WAIT_FOR_REPLY_LABEL]);
        assert_eq!(evaluate_staleness(&issue, NOW_MS), IssueAction::None);
    }

    #[test]
    fn unit_exactly_fourteen_days_is_still_fresh() {
        let issue = issue_updated_at(14, "old", &[]);
        assert_eq!(evaluate_staleness(&issue, NOW_MS), IssueAction::None);
    }

    #[test]
    fn functional_wait_for_reply_escalates_label_and_closes_not_planned() {
        let issue = issue_updated_at(20, "no response", &[WAIT_FOR_REPLY_LABEL]);
        let IssueAction::Close(directive) = evaluate_staleness(&issue, NOW_MS) else {
            panic!("expected close directive");
        };
        assert_eq!(directive.reason, CloseReason::NotPlanned);
        assert_eq!(directive.comment, STALE_CLOSE_COMMENT);
        assert_eq!(
            directive.add_labels,
            vec![LONG_TIME_NO_REPLY_LABEL.to_string()]
        );
        assert_eq!(
            directive.remove_labels,
            vec![WAIT_FOR_REPLY_LABEL.to_string()]
        );
    }

    #[test]
    fn functional_feature_title_closes_not_planned_without_label_change() {
        let issue = issue_updated_at(20, "[FEATURE] add dark mode", &[]);
        let IssueAction::Close(directive) = evaluate_staleness(&issue, NOW_MS) else {
            panic!("expected close directive");
        };
        assert_eq!(directive.reason, CloseReason::NotPlanned);
        assert!(directive.add_labels.is_empty());
        assert!(directive.remove_labels.is_empty());
    }

    #[test]
    fn functional_other_stale_issues_close_completed() {
        let issue = issue_updated_at(20, "crash on load", &[]);
        let IssueAction::Close(directive) = evaluate_staleness(&issue, NOW_MS) else {
            panic!("expected close directive");
        };
        assert_eq!(directive.reason, CloseReason::Completed);
        assert_eq!(directive.comment, STALE_CLOSE_COMMENT);
    }

    #[test]
    fn integration_exempt_labels_and_pull_requests_are_never_closed() {
        for label in STALE_EXEMPT_LABELS {
            let issue = issue_updated_at(30, "[Feature] stale", &[label]);
            assert_eq!(evaluate_staleness(&issue, NOW_MS), IssueAction::None);
        }
        let mut pull = issue_updated_at(30, "[Feature] stale", &[]);
        pull.pull_request = Some(serde_json::json!({"url": "https://example.invalid/pr/7"}));
        assert_eq!(evaluate_staleness(&pull, NOW_MS), IssueAction::None);
    }

    #[test]
    fn regression_closed_issue_maps_to_none_for_sweep_idempotence() {
        let mut issue = issue_updated_at(30, "stale", &[]);
        issue.state = "closed".to_string();
        issue.state_reason = Some("completed".to_string());
        assert_eq!(evaluate_staleness(&issue, NOW_MS), IssueAction::None);
    }

    #[test]
    fn regression_unparseable_updated_at_is_treated_as_fresh() {
        let mut issue = issue_updated_at(30, "stale", &[]);
        issue.updated_at = "not-a-timestamp".to_string();
        assert_eq!(evaluate_staleness(&issue, NOW_MS), IssueAction::None);
    }
}

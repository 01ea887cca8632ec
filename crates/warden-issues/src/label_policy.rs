use crate::issue_action::{CloseDirective, CloseReason};
use crate::issue_model::GithubIssue;
use crate::validity_policy::INVALID_LABEL;

pub const DUPLICATE_LABEL: &str = "duplicate";

pub const INVALID_CLOSE_COMMENT: &str = "This issue would be closed for something invalid.";
pub const DUPLICATE_CLOSE_COMMENT: &str = "This issue would be closed for duplicate.";

/// Close directives triggered by a freshly observed label set.
///
/// Closed issues are left untouched so a stray update can never flip them
/// back open. `invalid` and `duplicate` are independent checks; when both
/// labels are present both directives are returned and each executes as its
/// own comment + update pair.
pub fn evaluate_labeled(issue: &GithubIssue) -> Vec<CloseDirective> {
    if !issue.is_open() {
        return Vec::new();
    }
    let mut directives = Vec::new();
    if issue.has_label(INVALID_LABEL) {
        directives.push(CloseDirective {
            reason: CloseReason::NotPlanned,
            comment: INVALID_CLOSE_COMMENT.to_string(),
            add_labels: Vec::new(),
            remove_labels: Vec::new(),
        });
    }
    if issue.has_label(DUPLICATE_LABEL) {
        directives.push(CloseDirective {
            reason: CloseReason::NotPlanned,
            comment: DUPLICATE_CLOSE_COMMENT.to_string(),
            add_labels: Vec::new(),
            remove_labels: Vec::new(),
        });
    }
    directives
}

#[cfg(test)]
mod tests {
    use super::{evaluate_labeled, DUPLICATE_CLOSE_COMMENT, DUPLICATE_LABEL, INVALID_CLOSE_COMMENT};
    use crate::issue_action::CloseReason;
    use crate::issue_model::{GithubIssue, GithubIssueLabel, GithubUser};
    use crate::validity_policy::INVALID_LABEL;

    fn labeled_issue(state: &str, labels: &[&str]) -> GithubIssue {
        GithubIssue {
            id: 9,
            number: 30,
            title: "labeled".to_string(),
            body: Some("body".to_string()),
            state: state.to_string(),
            state_reason: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            updated_at: "2026-01-01T00:00:00Z".to_string(),
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
    fn functional_invalid_label_closes_not_planned() {
        let directives = evaluate_labeled(&labeled_issue("open", &[INVALID_LABEL]));
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].reason, CloseReason::NotPlanned);
        assert_eq!(directives[0].comment, INVALID_CLOSE_COMMENT);
    }

    #[test]
    fn functional_duplicate_label_closes_not_planned() {
        let directives = evaluate_labeled(&labeled_issue("open", &[DUPLICATE_LABEL]));
        assert_eq!(directives.len(), 1);
        assert_eq!(directives[0].comment, DUPLICATE_CLOSE_COMMENT);
    }

    #[test]
    fn integration_both_labels_produce_two_sequential_directives() {
        let directives = evaluate_labeled(&labeled_issue("open", &[INVALID_LABEL, DUPLICATE_LABEL]));
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].comment, INVALID_CLOSE_COMMENT);
        assert_eq!(directives[1].comment, DUPLICATE_CLOSE_COMMENT);
    }

    #[test]
    fn regression_closed_issue_is_never_touched() {
        let directives = evaluate_labeled(&labeled_issue("closed", &[INVALID_LABEL]));
        assert!(directives.is_empty());
    }

    #[test]
    fn unit_unrelated_labels_produce_no_directives() {
        let directives = evaluate_labeled(&labeled_issue("open", &["question"]));
        assert!(directives.is_empty());
    }
}

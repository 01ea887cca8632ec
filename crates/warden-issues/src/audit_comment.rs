use crate::issue_model::GithubIssueComment;

/// Formats a tracker timestamp as `yyyy-MM-dd HH:mm:ss +zz:zz`.
/// Unparseable input is passed through verbatim.
pub fn format_audit_timestamp(raw: &str) -> String {
    match chrono::DateTime::parse_from_rfc3339(raw) {
        Ok(parsed) => parsed.format("%Y-%m-%d %H:%M:%S %:z").to_string(),
        Err(_) => raw.to_string(),
    }
}

/// Renders the permanent audit record posted when someone deletes a comment:
/// a quote block naming the author and timestamps, then the original body
/// verbatim.
pub fn render_deleted_comment_audit(comment: &GithubIssueComment) -> String {
    format!(
        "> @{} deleted the following comment\n> published at {}\n> updated at {}\n\n{}",
        comment.user.login,
        format_audit_timestamp(&comment.created_at),
        format_audit_timestamp(&comment.updated_at),
        comment.body.as_deref().unwrap_or_default()
    )
}

/// The bot's own owner account deleting a comment is not audited; anything
/// else is.
pub fn should_audit_deleted_comment(sender_login: Option<&str>, owner_login: &str) -> bool {
    sender_login != Some(owner_login)
}

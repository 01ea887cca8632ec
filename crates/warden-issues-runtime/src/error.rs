use thiserror::Error;

pub const ERROR_BODY_MAX_CHARS: usize = 800;

#[derive(Debug, Error)]
/// Enumerates supported `GithubError` values.
///
/// `AuthFailure` is fatal to the current invocation: no partial action runs
/// without a valid client. Everything else surfaces per call and is handled
/// by the caller (logged-and-skipped in the sweep, propagated by webhook
/// handlers). There is no retry layer: every action gets at most one
/// attempt.
pub enum GithubError {
    #[error("auth failure: {message}")]
    AuthFailure { message: String },
    #[error("github api transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("github api {operation} failed with status {status}: {body}")]
    ApiStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },
}

/// Trims a response body for inclusion in an error message.
pub fn truncate_for_error(raw: &str, max_chars: usize) -> String {
    let trimmed = raw.trim();
    if trimmed.chars().count() <= max_chars {
        return trimmed.to_string();
    }
    let mut truncated: String = trimmed.chars().take(max_chars).collect();
    truncated.push_str("…");
    truncated
}

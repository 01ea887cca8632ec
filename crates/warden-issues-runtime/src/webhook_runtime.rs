use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::net::TcpListener;
use warden_core::current_unix_timestamp_ms;
use warden_issues::audit_comment::{render_deleted_comment_audit, should_audit_deleted_comment};
use warden_issues::issue_action::IssueAction;
use warden_issues::label_policy::evaluate_labeled;
use warden_issues::validity_policy::evaluate_opened;
use warden_issues::webhook_event::{
    IssueCommentEventPayload, IssuesEventPayload, ACTION_DELETED, ACTION_LABELED, ACTION_OPENED,
    ACTION_REOPENED, ISSUES_EVENT, ISSUE_COMMENT_EVENT,
};

use crate::client_provider::ClientProvider;
use crate::sweep_runtime::apply_close_directive;

pub const WEBHOOK_ENDPOINT: &str = "/webhook/github";

const EVENT_HEADER: &str = "x-github-event";
const SIGNATURE_HEADER: &str = "x-hub-signature-256";

#[derive(Clone)]
/// Public struct `WebhookServerConfig` used across Warden components.
pub struct WebhookServerConfig {
    pub bind: String,
    pub repo_full_name: String,
    pub owner_login: String,
    pub webhook_secret: String,
    pub provider: Arc<ClientProvider>,
}

pub(crate) struct WebhookServerState {
    repo_full_name: String,
    owner_login: String,
    webhook_secret: String,
    provider: Arc<ClientProvider>,
}

/// Runs the webhook server until shutdown is requested.
pub async fn run_webhook_server(config: WebhookServerConfig) -> Result<()> {
    let bind_addr = config
        .bind
        .parse::<SocketAddr>()
        .with_context(|| format!("invalid webhook bind address '{}'", config.bind))?;
    let listener = TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind webhook server on {bind_addr}"))?;
    let local_addr = listener
        .local_addr()
        .context("failed to resolve bound webhook server address")?;
    println!(
        "webhook server listening: endpoint={WEBHOOK_ENDPOINT} addr={local_addr} repo={}",
        config.repo_full_name
    );

    let state = Arc::new(WebhookServerState {
        repo_full_name: config.repo_full_name,
        owner_login: config.owner_login,
        webhook_secret: config.webhook_secret,
        provider: config.provider,
    });
    let app = build_webhook_router(state);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("webhook server exited unexpectedly")
}

fn build_webhook_router(state: Arc<WebhookServerState>) -> Router {
    Router::new()
        .route(WEBHOOK_ENDPOINT, post(handle_webhook_delivery))
        .with_state(state)
}

async fn handle_webhook_delivery(
    State(state): State<Arc<WebhookServerState>>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());
    let Some(signature) = signature else {
        return StatusCode::UNAUTHORIZED;
    };
    if verify_webhook_signature(&body, signature, state.webhook_secret.as_bytes()).is_err() {
        return StatusCode::UNAUTHORIZED;
    }

    let event = headers
        .get(EVENT_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    match dispatch_webhook_event(state.as_ref(), &event, &body).await {
        Ok(()) => StatusCode::OK,
        Err(error) => {
            eprintln!("webhook handler error: event={event} {error:#}");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

/// Linear dispatch over the two handled event families. Unknown events and
/// payloads that fail to deserialize are ignored, not errored.
pub(crate) async fn dispatch_webhook_event(
    state: &WebhookServerState,
    event: &str,
    body: &[u8],
) -> Result<()> {
    match event {
        ISSUES_EVENT => {
            let Ok(payload) = serde_json::from_slice::<IssuesEventPayload>(body) else {
                println!("webhook ignored malformed issues payload");
                return Ok(());
            };
            handle_issues_event(state, payload).await
        }
        ISSUE_COMMENT_EVENT => {
            let Ok(payload) = serde_json::from_slice::<IssueCommentEventPayload>(body) else {
                println!("webhook ignored malformed issue comment payload");
                return Ok(());
            };
            handle_issue_comment_event(state, payload).await
        }
        _ => Ok(()),
    }
}

async fn handle_issues_event(state: &WebhookServerState, payload: IssuesEventPayload) -> Result<()> {
    if payload.repository.full_name != state.repo_full_name {
        return Ok(());
    }
    match payload.action.as_str() {
        ACTION_OPENED | ACTION_REOPENED => {
            let IssueAction::Close(directive) = evaluate_opened(&payload.issue) else {
                return Ok(());
            };
            let client = state
                .provider
                .get_or_refresh(current_unix_timestamp_ms())
                .await?;
            apply_close_directive(&client, &payload.issue, &directive).await?;
            println!(
                "webhook closed issue {} for missing title or content",
                payload.issue.number
            );
            Ok(())
        }
        ACTION_LABELED => {
            let directives = evaluate_labeled(&payload.issue);
            if directives.is_empty() {
                return Ok(());
            }
            let client = state
                .provider
                .get_or_refresh(current_unix_timestamp_ms())
                .await?;
            for directive in directives {
                // re-read the snapshot so the update sees the current labels
                let issue = client.get_issue(payload.issue.number).await?;
                apply_close_directive(&client, &issue, &directive).await?;
                println!(
                    "webhook closed issue {} after label trigger",
                    payload.issue.number
                );
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

async fn handle_issue_comment_event(
    state: &WebhookServerState,
    payload: IssueCommentEventPayload,
) -> Result<()> {
    if payload.repository.full_name != state.repo_full_name {
        return Ok(());
    }
    if payload.action != ACTION_DELETED {
        return Ok(());
    }
    let sender_login = payload.sender.as_ref().map(|sender| sender.login.as_str());
    if !should_audit_deleted_comment(sender_login, &state.owner_login) {
        return Ok(());
    }
    let client = state
        .provider
        .get_or_refresh(current_unix_timestamp_ms())
        .await?;
    let audit_body = render_deleted_comment_audit(&payload.comment);
    client
        .create_issue_comment(payload.issue.number, &audit_body)
        .await?;
    println!(
        "webhook posted deletion audit on issue {}",
        payload.issue.number
    );
    Ok(())
}

pub fn verify_webhook_signature(payload: &[u8], signature: &str, secret: &[u8]) -> Result<()> {
    let Some(digest_hex) = signature.strip_prefix("sha256=") else {
        bail!("webhook signature must use sha256=<hex> format");
    };
    let signature_bytes = decode_hex(digest_hex)?;
    let mut mac = Hmac::<Sha256>::new_from_slice(secret)
        .context("failed to initialize webhook HMAC verifier")?;
    mac.update(payload);
    mac.verify_slice(&signature_bytes)
        .map_err(|_| anyhow!("webhook signature verification failed"))
}

fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        bail!("signature digest cannot be empty");
    }
    if trimmed.len() % 2 != 0 {
        bail!("signature digest must have an even number of hex characters");
    }

    let mut bytes = Vec::with_capacity(trimmed.len() / 2);
    let raw = trimmed.as_bytes();
    let mut index = 0usize;
    while index < raw.len() {
        let hex = std::str::from_utf8(&raw[index..index + 2]).context("invalid utf-8 in digest")?;
        let byte = u8::from_str_radix(hex, 16)
            .with_context(|| format!("invalid hex byte '{hex}' in signature digest"))?;
        bytes.push(byte);
        index = index.saturating_add(2);
    }
    Ok(bytes)
}

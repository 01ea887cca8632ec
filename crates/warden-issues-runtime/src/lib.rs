//! GitHub-facing runtimes for Warden: the authenticated API client, the
//! app-token credential provider with its short-lived client cache, the
//! scheduled backlog sweep, and the webhook event server.
//!
//! The two entry points (sweep scheduler and webhook server) never call each
//! other; they share the credential provider and the pure policies from
//! `warden-issues`, and the tracker's live state is the sole source of truth.

pub mod app_token;
pub mod client_provider;
pub mod error;
pub mod github_api_client;
pub mod sweep_runtime;
pub mod webhook_runtime;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use warden_issues_runtime::github_api_client::{DEFAULT_API_BASE, DEFAULT_REQUEST_TIMEOUT_MS};
use warden_issues_runtime::sweep_runtime::{DEFAULT_SWEEP_CRON, DEFAULT_SWEEP_TIMEZONE};

#[derive(Debug, Parser)]
#[command(
    name = "warden",
    about = "Backlog automation bot for a single GitHub repository",
    version
)]
/// Public struct `Cli` used across Warden components.
pub struct Cli {
    #[arg(
        long,
        env = "WARDEN_GITHUB_REPO",
        help = "Target repository in owner/name format"
    )]
    pub github_repo: String,

    #[arg(
        long,
        env = "WARDEN_GITHUB_APP_ID",
        help = "GitHub App identifier used as the issuer of the signed app assertion"
    )]
    pub github_app_id: String,

    #[arg(
        long,
        env = "WARDEN_GITHUB_INSTALLATION_ID",
        help = "Installation id the minted access tokens are scoped to"
    )]
    pub github_installation_id: String,

    #[arg(
        long,
        env = "WARDEN_GITHUB_PRIVATE_KEY_PATH",
        help = "Path to the app's RSA private key in PEM format"
    )]
    pub github_private_key_path: PathBuf,

    #[arg(
        long,
        env = "WARDEN_API_BASE",
        default_value = DEFAULT_API_BASE,
        help = "Base URL for the GitHub REST API"
    )]
    pub api_base: String,

    #[arg(
        long,
        env = "WARDEN_REQUEST_TIMEOUT_MS",
        default_value_t = DEFAULT_REQUEST_TIMEOUT_MS,
        help = "Per-call network timeout in milliseconds"
    )]
    pub request_timeout_ms: u64,

    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Subcommand)]
/// Enumerates supported `CliCommand` values.
pub enum CliCommand {
    /// Run the webhook server together with the daily sweep scheduler.
    Serve {
        #[arg(
            long,
            env = "WARDEN_BIND",
            default_value = "127.0.0.1:8090",
            help = "Webhook server bind address"
        )]
        bind: String,

        #[arg(
            long,
            env = "WARDEN_WEBHOOK_SECRET",
            help = "Shared secret used to verify webhook delivery signatures"
        )]
        webhook_secret: String,

        #[arg(
            long,
            env = "WARDEN_OWNER_LOGIN",
            help = "Bot owner account; deletions by this login are not audited"
        )]
        owner_login: String,

        #[arg(
            long,
            env = "WARDEN_SWEEP_CRON",
            default_value = DEFAULT_SWEEP_CRON,
            help = "Cron expression for the daily backlog sweep"
        )]
        sweep_cron: String,

        #[arg(
            long,
            env = "WARDEN_SWEEP_TIMEZONE",
            default_value = DEFAULT_SWEEP_TIMEZONE,
            help = "Timezone the sweep cron expression is resolved in"
        )]
        sweep_timezone: String,
    },
    /// Run a single backlog sweep and exit.
    Sweep,
}

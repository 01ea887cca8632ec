//! `warden` binary: wires the credential provider, the daily sweep
//! scheduler, and the webhook server from process configuration.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;
use warden_core::current_unix_timestamp_ms;
use warden_issues_runtime::app_token::{AppAuthConfig, AppTokenProvider};
use warden_issues_runtime::client_provider::ClientProvider;
use warden_issues_runtime::github_api_client::RepoRef;
use warden_issues_runtime::sweep_runtime::{run_sweep, run_sweep_scheduler, SweepSchedulerConfig};
use warden_issues_runtime::webhook_runtime::{run_webhook_server, WebhookServerConfig};

mod cli_args;

use cli_args::{Cli, CliCommand};

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let private_key_pem = std::fs::read_to_string(&cli.github_private_key_path)
        .with_context(|| {
            format!(
                "failed to read private key {}",
                cli.github_private_key_path.display()
            )
        })?;
    let repo = RepoRef::parse(&cli.github_repo)?;
    let token_provider = AppTokenProvider::new(AppAuthConfig {
        app_id: cli.github_app_id,
        installation_id: cli.github_installation_id,
        private_key_pem,
        api_base: cli.api_base.clone(),
        request_timeout_ms: cli.request_timeout_ms,
    })?;
    let provider = Arc::new(ClientProvider::new(
        Arc::new(token_provider),
        repo.clone(),
        cli.api_base,
        cli.request_timeout_ms,
    ));

    match cli.command {
        CliCommand::Serve {
            bind,
            webhook_secret,
            owner_login,
            sweep_cron,
            sweep_timezone,
        } => {
            let scheduler = run_sweep_scheduler(SweepSchedulerConfig {
                provider: provider.clone(),
                cron: sweep_cron,
                timezone: sweep_timezone,
            });
            let server = run_webhook_server(WebhookServerConfig {
                bind,
                repo_full_name: repo.as_slug(),
                owner_login,
                webhook_secret,
                provider,
            });
            tokio::try_join!(scheduler, server)?;
            Ok(())
        }
        CliCommand::Sweep => {
            let report = run_sweep(&provider, current_unix_timestamp_ms()).await?;
            println!(
                "backlog sweep: repo={} scanned={} closed={} skipped={} failed={}",
                repo.as_slug(),
                report.scanned,
                report.closed,
                report.skipped,
                report.failed
            );
            Ok(())
        }
    }
}

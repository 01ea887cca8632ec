use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono::TimeZone;
use chrono_tz::Tz;
use cron::Schedule;
use warden_core::current_unix_timestamp_ms;
use warden_issues::issue_action::{CloseDirective, IssueAction};
use warden_issues::issue_model::{GithubIssue, IssueUpdate};
use warden_issues::staleness_policy::evaluate_staleness;

use crate::client_provider::ClientProvider;
use crate::error::GithubError;
use crate::github_api_client::GithubApiClient;

pub const DEFAULT_SWEEP_CRON: &str = "0 0 0 * * *";
pub const DEFAULT_SWEEP_TIMEZONE: &str = "UTC";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
/// Per-run accounting for one pass over the open backlog.
pub struct SweepReport {
    pub scanned: usize,
    pub closed: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Clone)]
/// Public struct `SweepSchedulerConfig` used across Warden components.
pub struct SweepSchedulerConfig {
    pub provider: Arc<ClientProvider>,
    pub cron: String,
    pub timezone: String,
}

/// Executes a close decision: the explanatory comment is posted first, then
/// the state/label update is applied. The update builder is seeded from the
/// snapshot's current labels so removals and additions land in one PATCH.
pub(crate) async fn apply_close_directive(
    client: &GithubApiClient,
    issue: &GithubIssue,
    directive: &CloseDirective,
) -> Result<(), GithubError> {
    client
        .create_issue_comment(issue.number, &directive.comment)
        .await?;
    let mut update = IssueUpdate::from_issue(issue);
    for label in &directive.remove_labels {
        update.remove_label(label);
    }
    for label in &directive.add_labels {
        update.add_label(label);
    }
    update.close(directive.reason.as_api_str());
    client.update_issue(issue.number, &update).await?;
    Ok(())
}

/// One pass over all open issues applying the staleness policy.
///
/// A failing listing or credential mint aborts the run; a failing close is
/// reported and the sweep moves on to the next issue.
pub async fn run_sweep(
    provider: &ClientProvider,
    now_unix_ms: u64,
) -> Result<SweepReport, GithubError> {
    let client = provider.get_or_refresh(now_unix_ms).await?;
    let issues = client.list_open_issues().await?;
    let mut report = SweepReport::default();
    for issue in issues {
        report.scanned = report.scanned.saturating_add(1);
        let IssueAction::Close(directive) = evaluate_staleness(&issue, now_unix_ms) else {
            report.skipped = report.skipped.saturating_add(1);
            continue;
        };
        match apply_close_directive(&client, &issue, &directive).await {
            Ok(()) => {
                report.closed = report.closed.saturating_add(1);
                println!(
                    "backlog sweep closed issue {} as {}",
                    issue.number,
                    directive.reason.as_api_str()
                );
            }
            Err(error) => {
                report.failed = report.failed.saturating_add(1);
                eprintln!("backlog sweep failed on issue {}: {error}", issue.number);
            }
        }
    }
    Ok(report)
}

/// Next sweep occurrence strictly after `from_unix_ms`, resolved in the
/// configured timezone.
pub fn next_sweep_due_unix_ms(cron: &str, timezone: &str, from_unix_ms: u64) -> Result<u64> {
    let schedule =
        Schedule::from_str(cron).with_context(|| format!("invalid cron expression '{cron}'"))?;
    let tz: Tz = timezone
        .parse()
        .map_err(|_| anyhow!("invalid timezone '{timezone}'"))?;
    let from = tz
        .timestamp_millis_opt(i64::try_from(from_unix_ms).unwrap_or(i64::MAX))
        .single()
        .ok_or_else(|| anyhow!("invalid from timestamp for sweep schedule"))?;
    let next = schedule
        .after(&from)
        .next()
        .ok_or_else(|| anyhow!("cron expression '{cron}' has no future occurrence"))?;
    Ok(u64::try_from(next.timestamp_millis()).unwrap_or(u64::MAX))
}

/// Daily sweep loop: sleep until the next cron occurrence, run one sweep,
/// repeat until shutdown is requested.
pub async fn run_sweep_scheduler(config: SweepSchedulerConfig) -> Result<()> {
    // fail on a bad schedule before the first sleep, not at midnight
    next_sweep_due_unix_ms(&config.cron, &config.timezone, current_unix_timestamp_ms())?;
    loop {
        let now_unix_ms = current_unix_timestamp_ms();
        let due_unix_ms = next_sweep_due_unix_ms(&config.cron, &config.timezone, now_unix_ms)?;
        println!(
            "backlog sweep scheduled: repo={} next_due_unix_ms={due_unix_ms}",
            config.provider.repo().as_slug()
        );
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                println!("backlog sweep shutdown requested");
                return Ok(());
            }
            _ = tokio::time::sleep(Duration::from_millis(due_unix_ms.saturating_sub(now_unix_ms))) => {}
        }

        match run_sweep(&config.provider, current_unix_timestamp_ms()).await {
            Ok(report) => {
                println!(
                    "backlog sweep: repo={} scanned={} closed={} skipped={} failed={}",
                    config.provider.repo().as_slug(),
                    report.scanned,
                    report.closed,
                    report.skipped,
                    report.failed
                );
            }
            Err(error) => {
                eprintln!("backlog sweep error: {error}");
            }
        }
    }
}

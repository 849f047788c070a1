//! merge-down CLI

use anyhow::Context;
use clap::Parser;
use merge_down::config::{ConfigOverrides, RunConfig};
use merge_down::event::load_merge_event;
use merge_down::merge::{ExecuteOptions, MergeDownReport, plan_merge_down, run_merge_down};
use merge_down::notify::{ActionsSink, ConsoleSink, StatusSink};
use merge_down::platform::GitHubGateway;
use merge_down::types::MergeEvent;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "merge-down", version, about)]
struct Cli {
    /// Path to the `pull_request` event payload [default: $GITHUB_EVENT_PATH]
    #[arg(long, value_name = "PATH")]
    event_path: Option<PathBuf>,

    /// Repository as owner/repo [default: $GITHUB_REPOSITORY]
    #[arg(long, value_name = "OWNER/REPO")]
    repository: Option<String>,

    /// Prefix in front of version branch names [default: $INPUT_BRANCH_PREFIX]
    #[arg(long, value_name = "PREFIX")]
    branch_prefix: Option<String>,

    /// GitHub REST API URL [default: $GITHUB_API_URL or https://api.github.com]
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Timeout for each GitHub API call, 0 to wait indefinitely [default: 30]
    #[arg(long, value_name = "SECONDS")]
    timeout: Option<u64>,

    /// Show what would be done without calling GitHub
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn into_overrides(self) -> ConfigOverrides {
        ConfigOverrides {
            event_path: self.event_path,
            repository: self.repository,
            branch_prefix: self.branch_prefix,
            api_url: self.api_url,
            timeout_secs: self.timeout,
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // stdout carries workflow commands, diagnostics go to stderr
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let sink: Box<dyn StatusSink> = if std::env::var("GITHUB_ACTIONS").is_ok_and(|v| v == "true") {
        Box::new(ActionsSink)
    } else {
        Box::new(ConsoleSink)
    };

    match run(cli, sink.as_ref()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            sink.failure(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, sink: &dyn StatusSink) -> anyhow::Result<()> {
    let config = RunConfig::resolve(cli.into_overrides(), |name| std::env::var(name).ok())?;

    let Some(event) = load_merge_event(&config.event_path)? else {
        sink.info("Event is not a merged pull request, nothing to do");
        return Ok(());
    };
    info!(
        base = %event.base_branch,
        head = %event.head_branch,
        pr = event.pull_request_number,
        "loaded merge event"
    );

    if config.dry_run {
        report_dry_run(&event, &config, sink);
        return Ok(());
    }

    let (repo, token) = config.remote()?;
    let gateway = GitHubGateway::new(token, repo.clone(), &config.api_url)
        .context("failed to set up GitHub client")?;
    let options = ExecuteOptions {
        call_timeout: config.call_timeout,
        ..ExecuteOptions::default()
    };

    let report = run_merge_down(&event, &config.flow, &gateway, sink, &options).await?;
    log_summary(&report);
    Ok(())
}

fn report_dry_run(event: &MergeEvent, config: &RunConfig, sink: &dyn StatusSink) {
    let Some(plan) = plan_merge_down(event, &config.flow) else {
        sink.info(&format!(
            "{} is not part of the merge-down flow, nothing to do",
            event.base_branch
        ));
        return;
    };

    sink.info(&format!(
        "Would merge down #{} from {} into {}",
        plan.origin_pr, plan.base, plan.target
    ));
    if let Some(stale) = &plan.stale_candidate {
        sink.info(&format!("Would delete stale candidate branch {stale}"));
    }
    sink.info(&format!(
        "Would create candidate branch {} at {}",
        plan.candidate_name, plan.source_sha
    ));
    sink.info(&format!(
        "Would open pull request \"{}\" assigned to {}",
        plan.pull_request_title(),
        plan.assignee
    ));
}

fn log_summary(report: &MergeDownReport) {
    info!(
        target_branch = report.target.as_deref().unwrap_or("-"),
        candidate = report.candidate.as_ref().map_or("-", |c| c.name.as_str()),
        pull_request = report.pull_request.as_ref().map(|pr| pr.number),
        outcome = ?report.merge_outcome,
        auto_merge = report.auto_merge_enabled,
        assigned = report.assigned,
        warnings = report.warnings.len(),
        "merge-down finished"
    );
}

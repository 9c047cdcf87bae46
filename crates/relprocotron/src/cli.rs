//! Command-line surface and mode dispatch.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracker::{GitHubTracker, RepoSlug, RetryPolicy, TrackerConfig};

use crate::document::ReleaseType;
use crate::generate::{self, Output, ReleaseParams};
use crate::orchestrator::{IssuePreview, Orchestrator, RunMode, RunSummary};

/// Release Process-O-Tron CLI tool.
///
/// Generate hierarchical work items for your upcoming release, and file
/// them as linked issues on the project tracker.
#[derive(Parser, Debug)]
#[command(name = "relprocotron", author, version, about, long_about = None)]
pub struct Cli {
    /// Log filter (e.g. `debug`, `relprocotron=trace`); overrides RUST_LOG
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate a task document from release parameters
    Generate(GenerateArgs),
    /// Create tracker issues from a task document
    CreateIssues(CreateIssuesArgs),
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Name of the release
    #[arg(long)]
    pub release_name: String,

    /// Git tag for the release
    #[arg(long)]
    pub release_tag: String,

    /// Type of release
    #[arg(long, value_enum)]
    pub release_type: ReleaseType,

    /// Release date in YYYY-MM-DD format
    #[arg(long)]
    pub release_date: String,

    /// URL of the project repository
    #[arg(long)]
    pub project_url: String,

    /// Name of the software being released
    #[arg(long)]
    pub software_name: String,

    /// Version of the software being released
    #[arg(long)]
    pub software_version: String,

    /// Additional comments about the release (repeatable)
    #[arg(long = "comment")]
    pub comments: Vec<String>,

    /// JSON array of tasks to use as the release hierarchy
    #[arg(long)]
    pub tasks: Option<PathBuf>,

    /// Where to write the task document
    #[arg(long, default_value = "release-tasks.json")]
    pub output: PathBuf,

    /// Print the document instead of writing it
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

impl GenerateArgs {
    pub fn params(&self) -> ReleaseParams {
        ReleaseParams {
            name: self.release_name.clone(),
            tag: self.release_tag.clone(),
            release_type: self.release_type,
            date: self.release_date.clone(),
            project_url: self.project_url.clone(),
            software_name: self.software_name.clone(),
            software_version: self.software_version.clone(),
            comments: self.comments.clone(),
        }
    }
}

#[derive(Args, Debug)]
pub struct CreateIssuesArgs {
    /// Task document produced by `generate`
    #[arg(long)]
    pub input: PathBuf,

    /// Target repository as owner/repo
    #[arg(long, value_parser = parse_repo)]
    pub repo: RepoSlug,

    /// Tracker access token
    #[arg(
        long,
        env = "GITHUB_TOKEN",
        hide_env_values = true,
        required_unless_present = "dry_run"
    )]
    pub token: Option<String>,

    /// Preview issues without contacting the tracker
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,

    /// Tracker API root (overrides RELPROCOTRON_API_URL)
    #[arg(long)]
    pub api_url: Option<String>,

    /// Retries per tracker call (overrides RELPROCOTRON_MAX_RETRIES)
    #[arg(long)]
    pub max_retries: Option<u32>,

    /// Base backoff delay in milliseconds (overrides RELPROCOTRON_BASE_DELAY_MS)
    #[arg(long)]
    pub base_delay_ms: Option<u64>,
}

impl CreateIssuesArgs {
    /// Environment defaults with command-line overrides applied.
    pub fn tracker_config(&self) -> TrackerConfig {
        let mut config = TrackerConfig::default();
        if let Some(ref url) = self.api_url {
            config = config.with_api_url(url.clone());
        }
        let retry = RetryPolicy::new(
            self.max_retries.unwrap_or(config.retry.max_retries),
            self.base_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(config.retry.base_delay),
        );
        config.with_retry(retry)
    }
}

fn parse_repo(s: &str) -> Result<RepoSlug, String> {
    s.parse()
}

/// Run the selected subcommand.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Generate(args) => run_generate(&args),
        Command::CreateIssues(args) => run_create_issues(&args).await,
    }
}

fn run_generate(args: &GenerateArgs) -> Result<()> {
    let params = args.params();
    print!("{}", params.verification_report(args.dry_run));

    let tasks = match args.tasks {
        Some(ref path) => generate::load_tasks(path)?,
        None => Vec::new(),
    };
    let output = if args.dry_run {
        Output::DryRun
    } else {
        Output::File(args.output.clone())
    };

    let json = generate::generate(&params, tasks, &output)?;
    match output {
        Output::DryRun => println!("\n{json}"),
        Output::File(path) => println!("\nWrote task document to {}", path.display()),
    }
    Ok(())
}

async fn run_create_issues(args: &CreateIssuesArgs) -> Result<()> {
    let summary = if args.dry_run {
        Orchestrator::<GitHubTracker>::dry_run()
            .run(&args.input)
            .await?
    } else {
        let token = args
            .token
            .as_deref()
            .context("an access token is required unless --dry-run is given")?;
        let tracker = GitHubTracker::new(args.tracker_config(), args.repo.clone(), token)
            .context("failed to build tracker client")?;
        info!(repo = %args.repo, input = %args.input.display(), "Creating issues");
        Orchestrator::live(tracker, args.repo.clone())
            .run(&args.input)
            .await?
    };

    print!("{}", render_summary(&summary));
    Ok(())
}

/// Operator-facing report for a finished run.
pub fn render_summary(summary: &RunSummary) -> String {
    let mut out = String::new();

    for preview in &summary.previews {
        out.push_str(&render_preview(preview));
    }

    for failed in &summary.failed {
        out.push_str(&format!("Failed: {} ({})\n", failed.title, failed.reason));
    }
    for warning in &summary.patch_warnings {
        out.push_str(&format!(
            "Warning: could not link sub-tasks to #{}: {}\n",
            warning.parent, warning.reason
        ));
    }

    match summary.mode {
        RunMode::DryRun => out.push_str(&format!(
            "Dry run complete: {} issue(s) would be created\n",
            summary.previews.len()
        )),
        RunMode::Live => out.push_str(&format!(
            "Successfully created {} of {} issue(s)\n",
            summary.created_count(),
            summary.total_tasks
        )),
    }
    out
}

fn render_preview(preview: &IssuePreview) -> String {
    let indent = "  ".repeat(preview.depth as usize);
    let labels: Vec<&str> = preview.labels.iter().map(String::as_str).collect();
    format!(
        "{indent}[DRY RUN] Would create issue: {}\n{indent}  Body: {}\n{indent}  Labels: {}\n",
        preview.title,
        preview.body_excerpt.replace('\n', " "),
        if labels.is_empty() {
            "(none)".to_string()
        } else {
            labels.join(", ")
        }
    )
}

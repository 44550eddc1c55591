mod changes;
mod config;
mod report;
mod tools;

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, info_span};
use tracing_subscriber::EnvFilter;

use changes::fetch::HttpDiffSource;
use changes::{ChangeDiscovery, PrTarget};
use tools::github::github_registry;

/// PR Reconciler — produces a canonical, deduplicated list of a pull
/// request's changed files by trying several unreliable GitHub data
/// sources in priority order, down to parsing the raw `.diff` itself.
#[derive(Parser, Debug)]
#[command(name = "pr-reconciler", version, about)]
struct Cli {
    /// Repository owner (e.g., "rust-lang")
    ///
    /// Not required when --diff-file is used.
    owner: Option<String>,

    /// Repository name (e.g., "cargo")
    repo: Option<String>,

    /// Pull request number
    number: Option<u64>,

    /// Base commit SHA, enabling the commit-range compare strategy
    #[arg(long)]
    base: Option<String>,

    /// Head commit SHA, enabling the commit-range compare strategy
    #[arg(long)]
    head: Option<String>,

    /// Emit the change list as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Optional output file path for the JSON change list
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Parse a local unified diff file instead of contacting GitHub
    #[arg(long)]
    diff_file: Option<PathBuf>,

    /// Replace the pull request body after reconciliation
    #[arg(long)]
    set_body: Option<String>,

    /// Replace the pull request title (only with --set-body)
    #[arg(long, requires = "set_body")]
    set_title: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let reconciled = if let Some(path) = &cli.diff_file {
        if cli.set_body.is_some() {
            return Err("--set-body requires repository coordinates, not --diff-file".into());
        }
        info!(path = %path.display(), "parsing local diff file");
        let diff_text = std::fs::read_to_string(path)?;
        changes::merge::merge_by_path(changes::diff::parse_unified_diff(&diff_text))
    } else {
        let (Some(owner), Some(repo), Some(number)) =
            (cli.owner.clone(), cli.repo.clone(), cli.number)
        else {
            return Err(
                "owner, repo and PR number are required unless --diff-file is used. \
                 Usage: pr-reconciler <OWNER> <REPO> <NUMBER>"
                    .into(),
            );
        };

        let _main_span = info_span!("pr_reconcile", %owner, %repo, pr = number).entered();

        info!("loading configuration");
        let config = config::Config::load()?;
        let token = config.github_token();
        debug!(authenticated = token.is_some(), api_url = config.api_url(), "configured");

        let mut target = PrTarget::new(owner, repo, number);
        target.base_sha = cli.base.clone();
        target.head_sha = cli.head.clone();

        let registry = github_registry(config.api_url(), token.clone());
        let diff_source = Arc::new(HttpDiffSource::new(
            config.diff_url(),
            token,
            config.http_timeout(),
        )?);

        info!("reconciling pull request changes");
        let reconciled = ChangeDiscovery::new(registry.clone(), diff_source)
            .discover(&target)
            .await?;

        if let Some(body) = &cli.set_body {
            info!("updating pull request body");
            changes::cascade::update_pr_body(&registry, &target, body, cli.set_title.as_deref())
                .await?;
        }
        reconciled
    };

    info!(files = reconciled.len(), "reconciliation complete");
    report::output(&reconciled, cli.json, cli.output.as_deref())?;

    Ok(())
}

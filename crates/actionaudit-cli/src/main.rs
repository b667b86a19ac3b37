mod display;

use actionaudit_core::config::{self, AuditConfig, DEFAULT_CONFIG_FILE};
use actionaudit_core::providers::github_api::GitHubClient;
use actionaudit_core::{analyze_actions, scan_organization, AuditReport};
use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "actionaudit",
    version,
    about = "Audit an organization's GitHub Actions for known-compromised npm packages",
    long_about = "Lists every action referenced by the workflows of an organization, checks each \
        action's own repository for npm lockfiles, and flags locked package versions that appear \
        on the list of packages compromised by the npm worm campaign."
)]
struct Cli {
    /// Organization whose repositories are scanned
    #[arg(long, env = "GITHUB_ORG")]
    org: String,

    /// Access token with read access to the organization's repositories
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    token: String,

    /// Stop after this many repositories (0 = no limit)
    #[arg(long)]
    max_repos: Option<usize>,

    /// REST API root (for GitHub Enterprise Server)
    #[arg(long)]
    api_url: Option<String>,

    /// Configuration file (defaults to ./.actionaudit.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Exit with status 1 when any action is infected
    #[arg(long)]
    fail_on_infected: bool,

    /// More log output (-v info details, -vv request tracing)
    #[arg(short, long, action = clap::ArgAction::Count, conflicts_with = "quiet")]
    verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    let runtime = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start async runtime: {}", e);
            std::process::exit(2);
        }
    };

    match runtime.block_on(run(&cli)) {
        Ok(report) => {
            let failed = cli.fail_on_infected && report.has_infections();
            std::process::exit(if failed { 1 } else { 0 });
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(2);
        }
    }
}

fn init_logging(cli: &Cli) {
    let level = match (cli.quiet, cli.verbose) {
        (true, _) => tracing::Level::WARN,
        (false, 0 | 1) => tracing::Level::INFO,
        (false, _) => tracing::Level::DEBUG,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .with_target(cli.verbose > 0)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: &Cli) -> Result<AuditReport> {
    let org = cli.org.trim();
    if org.is_empty() {
        bail!("GITHUB_ORG environment variable is not set");
    }
    if cli.token.trim().is_empty() {
        bail!("GITHUB_TOKEN environment variable is not set");
    }

    let config = resolve_config(cli)?;
    let registry = config.registry()?;
    let options = config.scan_options();
    let client = GitHubClient::new(cli.token.trim(), &config.scan.api_url)?;

    tracing::info!("Scanning repositories in organization: {}", org);
    let mut scan = scan_organization(&client, org, &options).await?;
    analyze_actions(&client, &mut scan.usages, &registry).await;

    let report = AuditReport::new(org, scan);
    match cli.format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&report)
                .context("Failed to serialize audit report")?;
            println!("{}", json);
        }
        OutputFormat::Text => display::print_audit_report(&report),
    }

    Ok(report)
}

/// File configuration with command-line overrides applied.
fn resolve_config(cli: &Cli) -> Result<AuditConfig> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
            config::load_config(Path::new(DEFAULT_CONFIG_FILE))?
        }
        None => AuditConfig::default(),
    };

    if let Some(max_repos) = cli.max_repos {
        config.scan.max_repos = max_repos;
    }
    if let Some(api_url) = &cli.api_url {
        config.scan.api_url = api_url.clone();
    }
    config.validate()?;

    Ok(config)
}

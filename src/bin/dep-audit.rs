//! CLI tool for auditing npm dependencies

use anyhow::Context;
use clap::{CommandFactory, Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use npm_dependency_audit::{
    project_name, render_detail, render_licenses, render_markdown, render_outdated, render_summary,
    scan_project, AuditConfig, ConfigStore, NetworkConfig, NoAudit, NpmAuditSource, ReportStore,
    VulnerabilitySource,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_MARKDOWN_REPORT: &str = "dependency-audit-report.md";
const DEFAULT_JSON_REPORT: &str = "dependency-audit-report.json";

#[derive(Parser)]
#[command(name = "dep-audit")]
#[command(about = "Audit npm project dependencies for outdated versions, vulnerabilities, and license compliance", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the project containing package.json
    #[arg(short = 'p', long, default_value = ".", global = true)]
    project_path: PathBuf,

    /// Enable verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Registry base URL (defaults to $NPM_CONFIG_REGISTRY or https://registry.npmjs.org)
    #[arg(long, global = true)]
    registry: Option<String>,

    /// Registry request timeout in seconds
    #[arg(long, default_value = "30", global = true)]
    timeout: u64,

    /// Maximum number of concurrent registry requests
    #[arg(long, default_value = "8", global = true)]
    concurrency: usize,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan dependencies and save the results
    Scan {
        /// Do not run `npm audit`; report no vulnerabilities
        #[arg(long)]
        skip_audit: bool,
    },

    /// List outdated dependencies from the last scan
    Outdated,

    /// List dependency licenses from the last scan
    Licenses,

    /// Update ignored packages and allowed licenses
    Config {
        /// Package to exclude from scans
        #[arg(long = "ignore", value_name = "NAME")]
        ignore: Option<String>,

        /// License to add to the allow-list
        #[arg(long = "add-license", value_name = "LICENSE")]
        add_license: Option<String>,
    },

    /// Generate a report file from the last scan
    Report {
        /// Output format
        #[arg(short = 'f', long, default_value = "markdown")]
        format: ReportFormat,

        /// Output file (default: dependency-audit-report.md in the project)
        #[arg(short = 'o', long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Debug)]
enum ReportFormat {
    Json,
    Markdown,
}

impl std::str::FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "markdown" | "md" => Ok(ReportFormat::Markdown),
            _ => Err(format!("Unknown format: {}", s)),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("{} {:#}", "Error:".red().bold(), e);
        process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        println!("\nRun `dep-audit scan` to audit the dependencies in package.json.");
        return Ok(());
    };

    let project = cli.project_path.as_path();

    match command {
        Commands::Scan { skip_audit } => {
            let mut network = NetworkConfig {
                timeout_secs: cli.timeout,
                concurrency: cli.concurrency,
                ..NetworkConfig::default()
            };
            if let Some(registry) = cli.registry {
                network.registry_url = registry;
            }
            scan(project, &network, skip_audit).await
        }

        Commands::Outdated => {
            let verdicts = ReportStore::for_project(project).load();
            hint_if_empty(verdicts.is_empty());
            print!("{}", render_outdated(&verdicts));
            Ok(())
        }

        Commands::Licenses => {
            let verdicts = ReportStore::for_project(project).load();
            hint_if_empty(verdicts.is_empty());
            print!("{}", render_licenses(&verdicts));
            Ok(())
        }

        Commands::Config {
            ignore,
            add_license,
        } => {
            let store = ConfigStore::for_project(project);
            let config = store
                .update(ignore.as_deref(), add_license.as_deref())
                .with_context(|| format!("failed to save configuration to {}", store.path().display()))?;

            println!(
                "{} Configuration saved to {}",
                "Success:".green().bold(),
                store.path().display()
            );
            display_config(&config);
            Ok(())
        }

        Commands::Report { format, output } => {
            let verdicts = ReportStore::for_project(project).load();
            hint_if_empty(verdicts.is_empty());

            let (content, default_name) = match format {
                ReportFormat::Json => (serde_json::to_string_pretty(&verdicts)? + "\n", DEFAULT_JSON_REPORT),
                ReportFormat::Markdown => (
                    render_markdown(&project_name(project), &verdicts, chrono::Utc::now()),
                    DEFAULT_MARKDOWN_REPORT,
                ),
            };

            let output_path = output.unwrap_or_else(|| project.join(default_name));
            std::fs::write(&output_path, content)
                .with_context(|| format!("failed to write report to {}", output_path.display()))?;
            println!("Report written to: {}", output_path.display());
            Ok(())
        }
    }
}

async fn scan(project: &Path, network: &NetworkConfig, skip_audit: bool) -> anyhow::Result<()> {
    let config = ConfigStore::for_project(project).load();

    let audit: Box<dyn VulnerabilitySource> = if skip_audit {
        Box::new(NoAudit)
    } else {
        Box::new(NpmAuditSource::new(project))
    };

    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Auditing dependencies...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let result = scan_project(project, &config, network, audit.as_ref()).await;

    spinner.finish_and_clear();

    let verdicts = result.context("scan failed")?;

    let store = ReportStore::for_project(project);
    store
        .save(&verdicts)
        .with_context(|| format!("failed to save report to {}", store.path().display()))?;

    print!("{}", render_summary(&verdicts));
    println!();
    print!("{}", render_detail(&verdicts));
    Ok(())
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn hint_if_empty(empty: bool) {
    if empty {
        eprintln!(
            "{} No scan results found. Run `dep-audit scan` first.",
            "Note:".yellow().bold()
        );
    }
}

fn display_config(config: &AuditConfig) {
    let ignored = if config.ignored_packages.is_empty() {
        "(none)".to_string()
    } else {
        config.ignored_packages.join(", ")
    };
    println!("Ignored packages: {}", ignored);
    println!("Allowed licenses: {}", config.allowed_licenses.join(", "));
}

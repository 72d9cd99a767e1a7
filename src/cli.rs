//! Command-line interface

use chrono::Utc;
use clap::{Parser, Subcommand};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::auth::{load_client_secret, CredentialProvider, ScopeSet};
use crate::classifier::{TriageRules, Whitelist};
use crate::client::{
    Deleter, GmailDeleteMode, ProductionDriveClient, ProductionGmailClient, ProgressCallback,
};
use crate::config::Config;
use crate::drive_session::{is_affirmative, DriveSession, InquirePrompt, Prompt};
use crate::error::{CleanupError, Result};
use crate::executor::ActionExecutor;
use crate::lister::ListOptions;
use crate::models::{BatchReport, Category};
use crate::planner::GmailPlanner;
use crate::reporter::{format_mb, NO_EMAILS_FOUND};
use crate::staging::StagedDeletionSet;

#[derive(Parser, Debug)]
#[command(name = "google-cleanup")]
#[command(version)]
#[command(about = "Find and delete large, old and unwanted files in Google Drive and Gmail", long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Path to OAuth2 client secret file
    #[arg(long, global = true, default_value = "credentials.json")]
    pub credentials: PathBuf,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Obtain and cache a token for a scope set
    Auth {
        /// Which permissions to request
        #[arg(long, value_enum, default_value_t = ScopeSet::Drive)]
        scope: ScopeSet,

        /// Force re-authentication even if a token is cached
        #[arg(long)]
        force: bool,
    },

    /// Interactive Google Drive manager
    Drive,

    /// Find spam, large and old emails and stage them for review
    GmailPlan,

    /// Delete the emails listed in the staging file
    GmailDelete {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,

        /// Delete permanently instead of moving to Trash
        #[arg(long)]
        permanent: bool,

        /// Show what would be deleted without deleting anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Create an example configuration file
    InitConfig {
        /// Path to create config file
        #[arg(short, long, default_value = "config.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(long)]
        force: bool,
    },
}

/// Progress reporter using indicatif
pub struct ProgressReporter {
    multi: MultiProgress,
    spinner_style: ProgressStyle,
    bar_style: ProgressStyle,
}

impl ProgressReporter {
    /// Reporter drawing into `multi`; share it with the log writer so log
    /// lines print above the bars
    pub fn new(multi: MultiProgress) -> Self {
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed:>6}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");

        let bar_style = ProgressStyle::default_bar()
            .template("[{elapsed:>6}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("##-");

        Self {
            multi,
            spinner_style,
            bar_style,
        }
    }

    pub fn add_spinner(&self, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new_spinner());
        pb.set_style(self.spinner_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    pub fn add_progress_bar(&self, len: u64, msg: &str) -> ProgressBar {
        let pb = self.multi.add(ProgressBar::new(len));
        pb.set_style(self.bar_style.clone());
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Finish a spinner and clear it from the multi-progress display
    pub fn finish_spinner(&self, pb: &ProgressBar, msg: &str) {
        pb.finish_and_clear();
        let _ = self.multi.println(format!("  ✓ {}", msg));
    }

    /// Print a line above any active bars
    pub fn println(&self, msg: impl AsRef<str>) {
        let _ = self.multi.println(msg);
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new(MultiProgress::new())
    }
}

fn provider(cli: &Cli, config: &Config, scope_set: ScopeSet) -> CredentialProvider {
    CredentialProvider::new(&cli.credentials, &config.auth.token_dir, scope_set)
}

/// `auth`: obtain a credential and show what was cached
pub async fn run_auth(cli: &Cli, config: &Config, scope_set: ScopeSet, force: bool) -> Result<()> {
    let secret = load_client_secret(&cli.credentials).await?;
    if let Some(project) = secret.installed.project_id.as_deref() {
        info!("Using OAuth client of project {}", project);
    }

    let provider = provider(cli, config, scope_set);

    if force && provider.forget().await? {
        println!("Removed cached token for {}", scope_set);
    }

    info!("Authenticating for scope set {}", scope_set);
    let credential = provider.obtain().await?;

    println!("Successfully authenticated ({})", scope_set);
    println!("Token cached at: {:?}", provider.token_cache_path());
    match credential.expiry {
        Some(expiry) => println!("Access token expires at: {}", expiry.to_rfc3339()),
        None => println!("Access token has no expiry"),
    }
    println!(
        "Refresh token cached: {}",
        if credential.refresh_token.is_some() { "yes" } else { "no" }
    );
    println!("Token status: {}", credential.status_at(Utc::now()));
    Ok(())
}

/// `drive`: interactive menu over the user's Drive files
pub async fn run_drive(cli: &Cli, config: &Config) -> Result<()> {
    let provider = provider(cli, config, ScopeSet::Drive);
    let (hub, _credential) = provider.drive_hub().await?;
    let client = ProductionDriveClient::new(hub);

    let options = ListOptions::new(config.drive.page_size, config.drive.max_pages);
    let mut session = DriveSession::new(
        &client,
        InquirePrompt,
        std::io::stdout(),
        options,
        config.drive.list_limit,
    );

    let summary = session.run().await?;
    if summary.deleted > 0 || summary.failed > 0 {
        info!(
            "Deleted {} files ({} MB), {} failed",
            summary.deleted,
            format_mb(summary.bytes_deleted),
            summary.failed
        );
    }
    Ok(())
}

/// `gmail-plan`: build the deletion plan and write staging and statistics files
pub async fn run_gmail_plan(cli: &Cli, config: &Config, reporter: &ProgressReporter) -> Result<()> {
    let auth_spinner = reporter.add_spinner("Authenticating with Gmail API...");
    let provider = provider(cli, config, ScopeSet::GmailReadonly);
    let (hub, _credential) = provider.gmail_hub().await?;
    reporter.finish_spinner(&auth_spinner, "Gmail API authenticated");

    let client = ProductionGmailClient::new(hub, ScopeSet::GmailReadonly, GmailDeleteMode::Trash);
    let whitelist = Whitelist::new(config.whitelist_with_env());
    if !whitelist.is_empty() {
        info!("Whitelisting {} sender patterns", whitelist.entries().len());
    }

    let rules = TriageRules::from_config(&config.gmail, whitelist);
    let options = ListOptions::new(config.gmail.page_size, config.gmail.max_pages);

    let fetch_spinner = reporter.add_spinner("Fetching message details...");
    let spinner = fetch_spinner.clone();
    let progress: ProgressCallback = Arc::new(move || spinner.inc(1));

    let plan = GmailPlanner::new(&client, rules, options)
        .with_malformed_policy(config.gmail.malformed_policy)
        .with_progress(progress)
        .plan()
        .await?;
    reporter.finish_spinner(
        &fetch_spinner,
        &format!("Fetched details for {} messages", fetch_spinner.position()),
    );

    let stats = &plan.statistics;
    for category in Category::ALL {
        let count = stats.category(category).map(|c| c.count).unwrap_or(0);
        let line = match category {
            Category::Spam => format!("Found {} emails from spam senders.", count),
            Category::Large => format!("Found {} large emails.", count),
            Category::Old => format!("Found {} emails older than {}.", count, config.gmail.older_than),
        };
        reporter.println(line);
    }
    if stats.failed_queries > 0 {
        reporter.println(format!(
            "Warning: {} queries failed and were counted as empty.",
            stats.failed_queries
        ));
    }

    if plan.staged.is_empty() {
        reporter.println(NO_EMAILS_FOUND);
    }

    plan.write(&config.gmail.staging_file, &config.gmail.stats_file)
        .await?;

    reporter.println(format!(
        "Deletion statistics saved to {}.",
        config.gmail.stats_file.display()
    ));
    reporter.println(format!(
        "{} emails ({} MB) saved to {} for review.",
        plan.staged.len(),
        format_mb(plan.staged.total_size()),
        config.gmail.staging_file.display()
    ));
    Ok(())
}

/// `gmail-delete`: delete every staged message after confirmation
pub async fn run_gmail_delete(
    cli: &Cli,
    config: &Config,
    reporter: &ProgressReporter,
    yes: bool,
    permanent: bool,
    dry_run: bool,
) -> Result<()> {
    let staged = StagedDeletionSet::load(&config.gmail.staging_file).await?;

    if staged.is_empty() {
        reporter.println("No emails staged for deletion. Nothing to do.");
        return Ok(());
    }

    let action = if permanent { "permanently delete" } else { "move to Trash" };
    reporter.println(format!(
        "{} emails ({} MB) staged in {}",
        staged.len(),
        format_mb(staged.total_size()),
        config.gmail.staging_file.display()
    ));

    if dry_run {
        let report = execute_deletion(&ActionExecutor::preview(), &staged, reporter).await;
        reporter.println(format!(
            "Dry run: would {} {} emails. No changes were made.",
            action,
            report.deleted.len()
        ));
        return Ok(());
    }

    if !yes {
        let mut prompt = InquirePrompt;
        let question = format!("Do you want to {} these emails? (yes/no):", action);
        let confirmed = match prompt.input(&question) {
            Ok(answer) => is_affirmative(&answer),
            Err(CleanupError::OperationCancelled(_)) => false,
            Err(e) => return Err(e),
        };
        if !confirmed {
            reporter.println("Operation cancelled. No emails were deleted.");
            return Ok(());
        }
    }

    let (scope_set, mode) = if permanent {
        (ScopeSet::GmailFull, GmailDeleteMode::Permanent)
    } else {
        (ScopeSet::GmailModify, GmailDeleteMode::Trash)
    };
    let provider = provider(cli, config, scope_set);
    let (hub, _credential) = provider.gmail_hub().await?;
    let client = ProductionGmailClient::new(hub, scope_set, mode);

    let report = execute_deletion(&ActionExecutor::new(&client), &staged, reporter).await;
    reporter.println(format!(
        "Cleanup completed: {} deleted, {} failed.",
        report.deleted.len(),
        report.failed.len()
    ));
    Ok(())
}

async fn execute_deletion<D: Deleter + ?Sized>(
    executor: &ActionExecutor<'_, D>,
    staged: &StagedDeletionSet,
    reporter: &ProgressReporter,
) -> BatchReport {
    let bar = reporter.add_progress_bar(staged.len() as u64, "Deleting emails...");
    let bar_handle = bar.clone();
    let progress: ProgressCallback = Arc::new(move || bar_handle.inc(1));

    let report = executor.delete_all(staged.messages(), Some(progress)).await;
    bar.finish_and_clear();

    for (id, error) in &report.failed {
        reporter.println(format!("Failed to delete {}: {}", id, error));
    }
    report
}

/// `init-config`: write the default configuration
pub async fn run_init_config(output: &Path, force: bool) -> Result<()> {
    if output.exists() && !force {
        return Err(CleanupError::ConfigError(format!(
            "{:?} already exists; use --force to overwrite",
            output
        )));
    }

    Config::create_example(output).await?;
    println!("Created example configuration at {:?}", output);
    Ok(())
}

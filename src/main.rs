use anyhow::Result;
use clap::Parser;
use google_cleanup::cli::{self, Cli, Commands, ProgressReporter};
use google_cleanup::config::Config;
use google_cleanup::error::CleanupError;
use indicatif::MultiProgress;
use std::io::Write;
use std::process;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// A writer that prints through MultiProgress to avoid progress bar conflicts
#[derive(Clone)]
struct MultiProgressWriter {
    multi: MultiProgress,
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl MultiProgressWriter {
    fn new(multi: MultiProgress) -> Self {
        Self {
            multi,
            buffer: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn buffer(&self) -> MutexGuard<'_, Vec<u8>> {
        self.buffer.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Write for MultiProgressWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        let mut buffer = self.buffer();
        if !buffer.is_empty() {
            let msg = String::from_utf8_lossy(&buffer);
            let msg = msg.trim_end_matches('\n');
            if !msg.is_empty() {
                let _ = self.multi.println(msg);
            }
            buffer.clear();
        }
        Ok(())
    }
}

impl Drop for MultiProgressWriter {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

/// MakeWriter implementation for tracing
#[derive(Clone)]
struct MultiProgressMakeWriter {
    multi: MultiProgress,
}

impl<'a> MakeWriter<'a> for MultiProgressMakeWriter {
    type Writer = MultiProgressWriter;

    fn make_writer(&'a self) -> Self::Writer {
        MultiProgressWriter::new(self.multi.clone())
    }
}

#[tokio::main]
async fn main() {
    // .env may supply WHITELISTED_EMAILS; a missing file is fine
    dotenv::dotenv().ok();

    if let Err(e) = run().await {
        display_error(&e);
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    // On non-Windows platforms use aws-lc-rs, on Windows ring
    #[cfg(not(windows))]
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    #[cfg(windows)]
    rustls::crypto::ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install default crypto provider"))?;

    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("google_cleanup=debug,info"))
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("google_cleanup=info,warn"))
    };

    // Logs and progress bars share one MultiProgress so logs print above the bars
    let multi_progress = MultiProgress::new();
    let make_writer = MultiProgressMakeWriter {
        multi: multi_progress.clone(),
    };

    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(make_writer)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(make_writer)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .init();
    }

    if let Commands::InitConfig { output, force } = &cli.command {
        cli::run_init_config(output, *force).await?;
        return Ok(());
    }

    let config = Config::load(&cli.config).await?;
    let reporter = ProgressReporter::new(multi_progress);

    match &cli.command {
        Commands::Auth { scope, force } => {
            cli::run_auth(&cli, &config, *scope, *force).await?;
        }
        Commands::Drive => {
            cli::run_drive(&cli, &config).await?;
        }
        Commands::GmailPlan => {
            cli::run_gmail_plan(&cli, &config, &reporter).await?;
        }
        Commands::GmailDelete {
            yes,
            permanent,
            dry_run,
        } => {
            cli::run_gmail_delete(&cli, &config, &reporter, *yes, *permanent, *dry_run).await?;
        }
        Commands::InitConfig { .. } => {}
    }

    Ok(())
}

/// Print the error chain and a hint for the common failure kinds
fn display_error(error: &anyhow::Error) {
    eprintln!("Error: {}", error);

    let mut cause = error.source();
    while let Some(e) = cause {
        eprintln!("  Caused by: {}", e);
        cause = e.source();
    }

    if let Some(cleanup_err) = error.downcast_ref::<CleanupError>() {
        match cleanup_err {
            CleanupError::AuthError(_) => {
                eprintln!("\nHint: Make sure your credentials.json file is valid.");
                eprintln!("      You can download it from Google Cloud Console.");
                eprintln!("      Try running: google-cleanup auth --force");
            }
            CleanupError::RateLimited(_) => {
                eprintln!("\nHint: You've hit Google API rate limits.");
                eprintln!("      Wait a few minutes and try again.");
            }
            CleanupError::ConfigError(_) => {
                eprintln!("\nHint: Check your configuration file for errors.");
                eprintln!("      Run: google-cleanup init-config --force");
            }
            _ => {}
        }
    }
}

//! Google Drive and Gmail cleanup
//!
//! Finds large, old and unwanted resources in a user's Google Drive and
//! Gmail account and deletes them after confirmation.
//!
//! # Overview
//!
//! Every tool runs the same triage pipeline:
//!
//! authenticate → list → (enrich) → classify → rank → confirm → delete → report
//!
//! - **Drive manager**: an interactive menu over the user's Drive files
//! - **Gmail planner**: stages spam-sender, large and old messages in
//!   `emails_to_delete.json` and writes `deletion_stats.txt`
//! - **Gmail deleter**: deletes the staged messages
//!
//! # Example Usage
//!
//! ```no_run
//! use google_cleanup::auth::{CredentialProvider, ScopeSet};
//! use google_cleanup::client::ProductionDriveClient;
//! use google_cleanup::config::Config;
//! use google_cleanup::lister::{list_drive_files, ListOptions};
//! use google_cleanup::ranker::{top, SortKey};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.toml".as_ref()).await?;
//!
//!     let provider = CredentialProvider::new(
//!         "credentials.json".as_ref(),
//!         &config.auth.token_dir,
//!         ScopeSet::Drive,
//!     );
//!     let (hub, _credential) = provider.drive_hub().await?;
//!     let client = ProductionDriveClient::new(hub);
//!
//!     let files = list_drive_files(&client, ListOptions::new(1000, None)).await?;
//!     for file in top(&files, SortKey::Size, 10) {
//!         println!("{} ({} bytes)", file.name, file.size_bytes);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Organization
//!
//! - [`auth`] - OAuth2 credential provider, one token cache per scope set
//! - [`client`] - Drive and Gmail API clients behind mockable traits
//! - [`lister`] - Paginated listings as page streams
//! - [`enricher`] - Per-message Gmail detail fetches
//! - [`classifier`] - Size threshold, search queries, whitelist, dedupe
//! - [`ranker`] - Stable descending sort by size or date
//! - [`executor`] - Per-item deletion that never aborts a batch
//! - [`reporter`] - Console lines and the statistics report
//! - [`staging`] - The staged deletion set on disk
//! - [`planner`] - Gmail plan phase
//! - [`drive_session`] - Interactive Drive menu
//! - [`cli`] - Command-line interface
//! - [`config`] - Configuration management
//! - [`error`] - Error types and result aliases
//! - [`models`] - Core data structures

pub mod auth;
pub mod classifier;
pub mod cli;
pub mod client;
pub mod config;
pub mod drive_session;
pub mod enricher;
pub mod error;
pub mod executor;
pub mod lister;
pub mod models;
pub mod planner;
pub mod ranker;
pub mod reporter;
pub mod staging;

pub use error::{CleanupError, Result};

pub use models::{
    BatchReport, Category, CategoryStats, DeletionStatistics, DriveFile, GmailMessage, Resource,
};

pub use auth::{Credential, CredentialProvider, ScopeSet};

pub use client::{
    Deleter, DriveClient, GmailClient, GmailDeleteMode, Page, ProductionDriveClient,
    ProductionGmailClient,
};

pub use classifier::{TriageRules, Whitelist};
pub use config::{Config, MalformedPolicy};
pub use drive_session::{DriveSession, MenuState, Prompt};
pub use executor::ActionExecutor;
pub use lister::ListOptions;
pub use planner::{DeletionPlan, GmailPlanner};
pub use ranker::SortKey;
pub use staging::StagedDeletionSet;

pub use cli::{Cli, Commands, ProgressReporter};

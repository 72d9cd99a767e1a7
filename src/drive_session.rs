//! Interactive Drive manager
//!
//! A small menu state machine over one cached Drive listing:
//!
//! ```text
//!            ┌──────────── 1 ───────────► LIST_LARGEST ─┐
//!   MENU ◄───┼──────────── 2 ───────────► LIST_RECENT ──┤
//!   ▲  │     └──────────── 3 ───────────► DELETE_LARGE ─┘
//!   │  └── 4 ──► EXIT
//!   └── invalid choice / invalid threshold
//! ```
//!
//! The listing is fetched once at start and again after every deletion batch.

use std::io::Write;
use tracing::{debug, info};

use crate::classifier::{mb_to_bytes, select_larger_than};
use crate::client::DriveClient;
use crate::error::{CleanupError, Result};
use crate::executor::ActionExecutor;
use crate::lister::{list_drive_files, ListOptions};
use crate::models::DriveFile;
use crate::ranker::{rank, top, SortKey};
use crate::reporter::{modified_line, size_line, write_file_listing};

/// Where the session is in the menu loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuState {
    Menu,
    ListLargest,
    ListRecent,
    DeleteLarge,
    Exit,
}

impl MenuState {
    /// Transition for a numeric menu choice; `None` for anything else
    pub fn from_choice(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuState::ListLargest),
            "2" => Some(MenuState::ListRecent),
            "3" => Some(MenuState::DeleteLarge),
            "4" => Some(MenuState::Exit),
            _ => None,
        }
    }
}

/// Parse a size threshold in MB; must be a finite, non-negative number
pub fn parse_threshold_mb(input: &str) -> Result<f64> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| CleanupError::InvalidInput(format!("'{}' is not a number", input.trim())))?;

    if !value.is_finite() || value < 0.0 {
        return Err(CleanupError::InvalidInput(format!(
            "threshold must be a non-negative number of MB, got {}",
            input.trim()
        )));
    }
    Ok(value)
}

/// `yes` or `y`, case-insensitive
pub fn is_affirmative(input: &str) -> bool {
    matches!(input.trim().to_lowercase().as_str(), "yes" | "y")
}

/// Line-oriented user input
pub trait Prompt {
    /// Show `message` and return what the user typed.
    ///
    /// Returns `OperationCancelled` when the user aborts input (Ctrl-C/Esc).
    fn input(&mut self, message: &str) -> Result<String>;
}

/// Terminal prompt backed by `inquire`
#[derive(Debug, Default)]
pub struct InquirePrompt;

impl Prompt for InquirePrompt {
    fn input(&mut self, message: &str) -> Result<String> {
        match inquire::Text::new(message).prompt() {
            Ok(answer) => Ok(answer),
            Err(inquire::InquireError::OperationCanceled)
            | Err(inquire::InquireError::OperationInterrupted) => Err(
                CleanupError::OperationCancelled("input cancelled".to_string()),
            ),
            Err(e) => Err(CleanupError::InvalidInput(e.to_string())),
        }
    }
}

/// Totals over a whole session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub deleted: usize,
    pub failed: usize,
    pub bytes_deleted: u64,
}

pub struct DriveSession<'a, C, P, W>
where
    C: DriveClient + ?Sized,
    P: Prompt,
    W: Write,
{
    client: &'a C,
    prompt: P,
    out: W,
    list_options: ListOptions,
    list_limit: usize,
    files: Vec<DriveFile>,
    state: MenuState,
    summary: SessionSummary,
}

impl<'a, C, P, W> DriveSession<'a, C, P, W>
where
    C: DriveClient + ?Sized,
    P: Prompt,
    W: Write,
{
    pub fn new(client: &'a C, prompt: P, out: W, list_options: ListOptions, list_limit: usize) -> Self {
        Self {
            client,
            prompt,
            out,
            list_options,
            list_limit,
            files: Vec::new(),
            state: MenuState::Menu,
            summary: SessionSummary::default(),
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn files(&self) -> &[DriveFile] {
        &self.files
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    /// Fetch the listing and run the menu until the user exits
    pub async fn run(&mut self) -> Result<SessionSummary> {
        self.refresh().await?;

        while self.state != MenuState::Exit {
            self.step().await?;
        }

        writeln!(self.out, "Exiting Google Drive Manager. Goodbye!")?;
        info!(
            "Drive session finished: {} deleted, {} failed",
            self.summary.deleted, self.summary.failed
        );
        Ok(self.summary)
    }

    /// Execute the current state and move to the next one
    pub async fn step(&mut self) -> Result<()> {
        self.state = match self.state {
            MenuState::Menu => self.menu()?,
            MenuState::ListLargest => {
                self.list_largest()?;
                MenuState::Menu
            }
            MenuState::ListRecent => {
                self.list_recent()?;
                MenuState::Menu
            }
            MenuState::DeleteLarge => {
                self.delete_large().await?;
                MenuState::Menu
            }
            MenuState::Exit => MenuState::Exit,
        };
        debug!("Drive session state: {:?}", self.state);
        Ok(())
    }

    async fn refresh(&mut self) -> Result<()> {
        self.files = list_drive_files(self.client, self.list_options).await?;
        write_file_listing(&mut self.out, &self.files)?;
        Ok(())
    }

    /// Read input, treating a cancelled prompt as a request to leave
    fn ask(&mut self, message: &str) -> Result<Option<String>> {
        self.out.flush()?;
        match self.prompt.input(message) {
            Ok(answer) => Ok(Some(answer)),
            Err(CleanupError::OperationCancelled(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn menu(&mut self) -> Result<MenuState> {
        writeln!(self.out)?;
        writeln!(self.out, "Google Drive Manager")?;
        writeln!(self.out, "1. List top {} largest files", self.list_limit)?;
        writeln!(self.out, "2. List {} most recently modified files", self.list_limit)?;
        writeln!(self.out, "3. Delete large files")?;
        writeln!(self.out, "4. Exit")?;

        let Some(choice) = self.ask("Enter your choice (1-4):")? else {
            return Ok(MenuState::Exit);
        };

        match MenuState::from_choice(&choice) {
            Some(next) => Ok(next),
            None => {
                writeln!(self.out, "Invalid choice. Please try again.")?;
                Ok(MenuState::Menu)
            }
        }
    }

    fn list_largest(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Top {} largest files:", self.list_limit)?;
        for file in top(&self.files, SortKey::Size, self.list_limit) {
            writeln!(self.out, "{}", size_line(&file))?;
        }
        Ok(())
    }

    fn list_recent(&mut self) -> Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "Most recently modified files:")?;
        for file in top(&self.files, SortKey::Date, self.list_limit) {
            writeln!(self.out, "{}", modified_line(&file))?;
        }
        Ok(())
    }

    async fn delete_large(&mut self) -> Result<()> {
        let Some(raw) = self.ask("Enter size threshold in MB:")? else {
            return Ok(());
        };

        let threshold_mb = match parse_threshold_mb(&raw) {
            Ok(t) => t,
            Err(e) => {
                writeln!(self.out, "{}", e)?;
                return Ok(());
            }
        };

        let ranked = rank(&self.files, SortKey::Size);
        let large = select_larger_than(&ranked, mb_to_bytes(threshold_mb));

        if large.is_empty() {
            writeln!(self.out, "No files larger than {} MB found.", threshold_mb)?;
            return Ok(());
        }

        writeln!(self.out)?;
        writeln!(self.out, "Files larger than {} MB:", threshold_mb)?;
        for file in &large {
            writeln!(self.out, "{}", size_line(file))?;
        }

        let confirmed = self
            .ask("Do you want to delete these files? (yes/no):")?
            .map(|answer| is_affirmative(&answer))
            .unwrap_or(false);

        if !confirmed {
            writeln!(self.out, "Operation cancelled. No files were deleted.")?;
            return Ok(());
        }

        let executor = ActionExecutor::new(self.client);
        for file in &large {
            if executor.delete(&file.id).await {
                self.summary.deleted += 1;
                self.summary.bytes_deleted += file.size_bytes;
                writeln!(self.out, "Deleted: {}", size_line(file))?;
            } else {
                self.summary.failed += 1;
                writeln!(self.out, "Failed to delete: {}", file.name)?;
            }
        }

        self.refresh().await
    }
}

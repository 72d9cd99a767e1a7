use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Common view over the remote objects the triage pipeline works on
pub trait Resource {
    /// Remote identifier, unique within one listing
    fn id(&self) -> &str;

    /// Human-readable label for console output
    fn display_name(&self) -> &str;

    /// Size in bytes; 0 when the API reports none
    fn size_bytes(&self) -> u64;

    /// Last modification time, if the resource carries one
    fn modified_time(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// A file in the user's Google Drive
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveFile {
    pub id: String,
    pub name: String,
    pub mime_type: String,
    /// Folders and shortcuts have no size; stored as 0
    #[serde(default)]
    pub size_bytes: u64,
    pub modified_time: Option<DateTime<Utc>>,
}

impl Resource for DriveFile {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    fn modified_time(&self) -> Option<DateTime<Utc>> {
        self.modified_time
    }
}

/// A Gmail message as written to the staging file
///
/// Field names match the staging JSON: `{id, snippet, size, from}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GmailMessage {
    pub id: String,
    #[serde(default)]
    pub snippet: String,
    #[serde(rename = "size", default)]
    pub size_bytes: u64,
    pub from: String,
}

impl Resource for GmailMessage {
    fn id(&self) -> &str {
        &self.id
    }

    fn display_name(&self) -> &str {
        &self.from
    }

    fn size_bytes(&self) -> u64 {
        self.size_bytes
    }
}

/// Why a message was selected for deletion
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Spam,
    Large,
    Old,
}

impl Category {
    pub const ALL: [Category; 3] = [Category::Spam, Category::Large, Category::Old];

    /// Heading used in the statistics report
    pub fn heading(&self) -> &'static str {
        match self {
            Category::Spam => "Spam emails",
            Category::Large => "Large emails",
            Category::Old => "Old emails",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Spam => "spam",
            Category::Large => "large",
            Category::Old => "old",
        };
        f.write_str(name)
    }
}

/// Messages found for one category, with their summed size
#[derive(Debug, Clone, Default)]
pub struct CategoryBatch {
    pub messages: Vec<GmailMessage>,
    pub total_size: u64,
    /// Ids dropped during enrichment (malformed or vanished)
    pub skipped: usize,
    /// Queries whose listing failed and were counted as empty
    pub failed_queries: usize,
}

/// Count and byte total for one category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryStats {
    pub category: Category,
    pub count: usize,
    pub bytes: u64,
}

/// Aggregate figures written to the statistics report. Built once per run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletionStatistics {
    pub generated_at: DateTime<Utc>,
    pub total_count: usize,
    pub total_bytes: u64,
    pub categories: Vec<CategoryStats>,
    pub whitelisted: usize,
    pub duplicates_removed: usize,
    pub failed_queries: usize,
}

impl DeletionStatistics {
    pub fn category(&self, category: Category) -> Option<&CategoryStats> {
        self.categories.iter().find(|c| c.category == category)
    }
}

/// Outcome of a deletion batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    pub deleted: Vec<String>,
    /// (id, error message) for every failed deletion
    pub failed: Vec<(String, String)>,
    /// Nothing was sent to the API; `deleted` lists what would have gone
    pub dry_run: bool,
}

impl BatchReport {
    pub fn attempted(&self) -> usize {
        self.deleted.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

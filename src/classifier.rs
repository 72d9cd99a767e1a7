//! Selection rules: spam senders, size and age thresholds, whitelist

use std::collections::HashSet;

use crate::config::GmailConfig;
use crate::models::{Category, GmailMessage, Resource};

/// Bytes in one megabyte as used by every size shown to the user
pub const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Convert a user-supplied MB figure into bytes
pub fn mb_to_bytes(mb: f64) -> f64 {
    mb * BYTES_PER_MB
}

/// Records strictly larger than `threshold_bytes`, order preserved
pub fn select_larger_than<R: Resource + Clone>(records: &[R], threshold_bytes: f64) -> Vec<R> {
    records
        .iter()
        .filter(|r| r.size_bytes() as f64 > threshold_bytes)
        .cloned()
        .collect()
}

/// Gmail search query for one spam sender
pub fn sender_query(sender: &str) -> String {
    format!("from:{}", sender)
}

/// Gmail search query for messages above a size (`5M`, `500K`, bytes)
pub fn larger_than_query(threshold: &str) -> String {
    format!("larger:{}", threshold)
}

/// Gmail search query for messages older than an age (`2y`, `6m`, `30d`)
pub fn older_than_query(age: &str) -> String {
    format!("older_than:{}", age)
}

/// Sender substrings that are never selected for deletion.
///
/// Matching is a plain substring test on the raw `From` header, so an entry
/// like `ann@x.com` also covers `joann@x.com`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Whitelist {
    entries: Vec<String>,
}

impl Whitelist {
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|e| Into::<String>::into(e).trim().to_string())
                .filter(|e| !e.is_empty())
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn matches(&self, from: &str) -> bool {
        self.entries.iter().any(|entry| from.contains(entry.as_str()))
    }
}

/// Drop whitelisted messages; the rest keep their relative order
pub fn filter_whitelist(messages: Vec<GmailMessage>, whitelist: &Whitelist) -> Vec<GmailMessage> {
    messages
        .into_iter()
        .filter(|m| !whitelist.matches(&m.from))
        .collect()
}

/// Keep the first occurrence of every id
pub fn dedupe_by_id(messages: Vec<GmailMessage>) -> Vec<GmailMessage> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|m| seen.insert(m.id.clone()))
        .collect()
}

/// Everything the Gmail planner needs to decide what to stage
#[derive(Debug, Clone)]
pub struct TriageRules {
    pub spam_senders: Vec<String>,
    pub large_threshold: String,
    pub older_than: String,
    pub whitelist: Whitelist,
    pub deduplicate: bool,
}

impl TriageRules {
    /// Rules from config with an explicit whitelist (config entries plus env)
    pub fn from_config(config: &GmailConfig, whitelist: Whitelist) -> Self {
        Self {
            spam_senders: config.spam_senders.clone(),
            large_threshold: config.large_threshold.clone(),
            older_than: config.older_than.clone(),
            whitelist,
            deduplicate: config.deduplicate,
        }
    }

    /// Search queries issued for a category, in order
    pub fn queries(&self, category: Category) -> Vec<String> {
        match category {
            Category::Spam => self.spam_senders.iter().map(|s| sender_query(s)).collect(),
            Category::Large => vec![larger_than_query(&self.large_threshold)],
            Category::Old => vec![older_than_query(&self.older_than)],
        }
    }
}

/// Result of combining the category selections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub messages: Vec<GmailMessage>,
    pub whitelisted: usize,
    pub duplicates_removed: usize,
}

/// union(spam, large, old) → subtract(whitelist) → optional dedupe by id
pub fn combine(categories: Vec<Vec<GmailMessage>>, rules: &TriageRules) -> Selection {
    let union: Vec<GmailMessage> = categories.into_iter().flatten().collect();
    let before_whitelist = union.len();

    let kept = filter_whitelist(union, &rules.whitelist);
    let whitelisted = before_whitelist - kept.len();

    let (messages, duplicates_removed) = if rules.deduplicate {
        let before = kept.len();
        let unique = dedupe_by_id(kept);
        let removed = before - unique.len();
        (unique, removed)
    } else {
        (kept, 0)
    };

    Selection {
        messages,
        whitelisted,
        duplicates_removed,
    }
}

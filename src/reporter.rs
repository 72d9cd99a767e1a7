//! Console summaries and the deletion statistics report

use chrono::{DateTime, Utc};
use std::io::Write;
use std::path::Path;

use crate::classifier::BYTES_PER_MB;
use crate::error::Result;
use crate::models::{DeletionStatistics, DriveFile};

/// Size in MB with two decimals, e.g. `50.00`
pub fn format_mb(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / BYTES_PER_MB)
}

/// `YYYY-MM-DD HH:MM:SS+00:00`, or `unknown` when the API gave no time
pub fn format_timestamp(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(t) => t.format("%Y-%m-%d %H:%M:%S%:z").to_string(),
        None => "unknown".to_string(),
    }
}

/// `name (X.XX MB)`
pub fn size_line(file: &DriveFile) -> String {
    format!("{} ({} MB)", file.name, format_mb(file.size_bytes))
}

/// `name - Last modified: ts`
pub fn modified_line(file: &DriveFile) -> String {
    format!(
        "{} - Last modified: {}",
        file.name,
        format_timestamp(file.modified_time)
    )
}

/// Full listing printed after every Drive listing
pub fn write_file_listing<W: Write>(out: &mut W, files: &[DriveFile]) -> std::io::Result<()> {
    if files.is_empty() {
        return writeln!(out, "No files found.");
    }

    writeln!(out, "Files:")?;
    for file in files {
        writeln!(
            out,
            "{} ({} MB) - Last modified: {}",
            file.name,
            format_mb(file.size_bytes),
            format_timestamp(file.modified_time)
        )?;
    }
    Ok(())
}

/// Line printed and reported when the plan selected nothing
pub const NO_EMAILS_FOUND: &str = "No emails found matching the cleanup criteria.";

/// Plain-text statistics report, fixed layout
pub fn render_statistics(stats: &DeletionStatistics) -> String {
    let mut report = String::new();

    report.push_str("Deletion Statistics:\n");
    report.push_str("====================\n\n");
    report.push_str(&format!("Total emails to be deleted: {}\n", stats.total_count));
    report.push_str(&format!(
        "Total size to be deleted: {} MB\n\n",
        format_mb(stats.total_bytes)
    ));

    if stats.total_count == 0 {
        report.push_str(&format!("{}\n\n", NO_EMAILS_FOUND));
    }

    report.push_str("Breakdown by Category:\n");
    report.push_str("----------------------\n");
    for category in &stats.categories {
        report.push_str(&format!("{}:\n", category.category.heading()));
        report.push_str(&format!("  Number: {}\n", category.count));
        report.push_str(&format!("  Size: {} MB\n\n", format_mb(category.bytes)));
    }

    if stats.whitelisted > 0 || stats.duplicates_removed > 0 || stats.failed_queries > 0 {
        report.push_str("Excluded:\n");
        report.push_str("---------\n");
        report.push_str(&format!("  Whitelisted senders: {}\n", stats.whitelisted));
        report.push_str(&format!("  Duplicates removed: {}\n", stats.duplicates_removed));
        report.push_str(&format!("  Failed queries: {}\n\n", stats.failed_queries));
    }

    report.push_str(&format!(
        "Generated at: {}\n",
        format_timestamp(Some(stats.generated_at))
    ));
    report
}

/// Write the report, replacing any previous one
pub async fn write_statistics(path: &Path, stats: &DeletionStatistics) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await?;
        }
    }
    tokio::fs::write(path, render_statistics(stats)).await?;
    tracing::debug!("Wrote statistics to {:?}", path);
    Ok(())
}

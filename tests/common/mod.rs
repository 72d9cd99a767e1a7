//! Common test utilities and fixtures
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use google_cleanup::client::{Deleter, DriveClient, GmailClient, Page};
use google_cleanup::drive_session::Prompt;
use google_cleanup::error::{CleanupError, Result};
use google_cleanup::models::{DriveFile, GmailMessage};
use mockall::mock;
use std::collections::VecDeque;

pub const MB: u64 = 1024 * 1024;

/// Midday UTC on the given day of January 2024
pub fn january(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap()
}

/// Create a Drive file of `size_mb` whole megabytes
pub fn create_drive_file(id: &str, size_mb: u64, modified_day: Option<u32>) -> DriveFile {
    DriveFile {
        id: id.to_string(),
        name: format!("{}.bin", id),
        mime_type: "application/octet-stream".to_string(),
        size_bytes: size_mb * MB,
        modified_time: modified_day.map(january),
    }
}

/// Create a Gmail message with default snippet
pub fn create_message(id: &str, from: &str, size_bytes: u64) -> GmailMessage {
    GmailMessage {
        id: id.to_string(),
        snippet: format!("snippet of {}", id),
        size_bytes,
        from: from.to_string(),
    }
}

/// Single page with no continuation
pub fn last_page<T>(items: Vec<T>) -> Page<T> {
    Page {
        items,
        next_page_token: None,
    }
}

/// Page followed by another one
pub fn page_with_next<T>(items: Vec<T>, token: &str) -> Page<T> {
    Page {
        items,
        next_page_token: Some(token.to_string()),
    }
}

pub fn ids(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| s.to_string()).collect()
}

pub fn server_error() -> CleanupError {
    CleanupError::ServerError {
        status: 500,
        message: "HTTP 500: Internal Server Error".to_string(),
    }
}

pub fn not_found(id: &str) -> CleanupError {
    CleanupError::NotFound(format!("HTTP 404: {}", id))
}

/// Prompt that replays canned answers and cancels once they run out
#[derive(Debug, Default)]
pub struct ScriptedPrompt {
    answers: VecDeque<String>,
    pub asked: Vec<String>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            asked: Vec::new(),
        }
    }
}

impl Prompt for ScriptedPrompt {
    fn input(&mut self, message: &str) -> Result<String> {
        self.asked.push(message.to_string());
        self.answers
            .pop_front()
            .ok_or_else(|| CleanupError::OperationCancelled("script exhausted".to_string()))
    }
}

mock! {
    pub DriveClient {}

    #[async_trait::async_trait]
    impl Deleter for DriveClient {
        async fn delete(&self, id: &str) -> Result<()>;
    }

    #[async_trait::async_trait]
    impl DriveClient for DriveClient {
        async fn list_files_page(
            &self,
            page_size: u32,
            page_token: Option<String>,
        ) -> Result<Page<DriveFile>>;
    }
}

mock! {
    pub GmailClient {}

    #[async_trait::async_trait]
    impl Deleter for GmailClient {
        async fn delete(&self, id: &str) -> Result<()>;
    }

    #[async_trait::async_trait]
    impl GmailClient for GmailClient {
        async fn list_message_ids_page(
            &self,
            query: &str,
            page_size: u32,
            page_token: Option<String>,
        ) -> Result<Page<String>>;
        async fn get_message(&self, id: &str) -> Result<GmailMessage>;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_drive_file() {
        let file = create_drive_file("video", 50, Some(3));
        assert_eq!(file.size_bytes, 50 * MB);
        assert_eq!(file.modified_time, Some(january(3)));
    }

    #[test]
    fn test_scripted_prompt_cancels_when_exhausted() {
        let mut prompt = ScriptedPrompt::new(&["1"]);
        assert_eq!(prompt.input("choice").unwrap(), "1");
        assert!(matches!(
            prompt.input("choice"),
            Err(CleanupError::OperationCancelled(_))
        ));
        assert_eq!(prompt.asked.len(), 2);
    }
}

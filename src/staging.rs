//! Staged deletion set shared by the plan and delete phases
//!
//! The plan phase writes the selected messages to `emails_to_delete.json`
//! as a pretty-printed array of `{id, snippet, size, from}` objects. The user
//! can review or edit the file before the delete phase reads it back.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CleanupError, Result};
use crate::models::GmailMessage;

/// Ordered messages awaiting deletion
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StagedDeletionSet {
    messages: Vec<GmailMessage>,
}

impl StagedDeletionSet {
    pub fn new(messages: Vec<GmailMessage>) -> Self {
        Self { messages }
    }

    pub fn messages(&self) -> &[GmailMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn total_size(&self) -> u64 {
        self.messages.iter().map(|m| m.size_bytes).sum()
    }

    /// Read a staging file written by [`save`](Self::save) or by hand
    pub async fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CleanupError::ConfigError(format!(
                "Staging file {:?} not found; run gmail-plan first",
                path
            )));
        }

        let json = tokio::fs::read_to_string(path).await?;
        let set: Self = serde_json::from_str(&json)?;
        tracing::debug!("Loaded {} staged messages from {:?}", set.len(), path);
        Ok(set)
    }

    /// Write the set, replacing any previous file
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_as_plain_array() {
        let set = StagedDeletionSet::new(vec![GmailMessage {
            id: "abc".to_string(),
            snippet: "hi".to_string(),
            size_bytes: 10,
            from: "a@b.com".to_string(),
        }]);

        let value = serde_json::to_value(&set).unwrap();
        assert!(value.is_array());
        assert_eq!(value[0]["size"], 10);
    }

    #[test]
    fn test_reads_hand_edited_file() {
        let json = r#"[
            {"id": "1", "snippet": "x", "size": 100, "from": "a@b.com"},
            {"id": "2", "from": "c@d.com"}
        ]"#;
        let set: StagedDeletionSet = serde_json::from_str(json).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.total_size(), 100);
        assert_eq!(set.messages()[1].snippet, "");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = StagedDeletionSet::load(&dir.path().join("missing.json"))
            .await
            .unwrap_err();
        assert!(matches!(err, CleanupError::ConfigError(_)));
    }
}

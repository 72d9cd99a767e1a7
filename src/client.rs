//! Drive and Gmail API clients behind mockable traits

use async_trait::async_trait;
use google_drive3::api::File;
use google_gmail1::api::Message;
use std::sync::Arc;
use tracing::debug;

use crate::auth::{DriveApiHub, GmailHub, ScopeSet, DRIVE_SCOPE, GMAIL_FULL_SCOPE};
use crate::error::{CleanupError, Result};
use crate::models::{DriveFile, GmailMessage};

/// Fields requested from `files.list`; keeps responses small
pub const DRIVE_LIST_FIELDS: &str = "nextPageToken, files(id, name, mimeType, size, modifiedTime)";

/// Largest page `files.list` accepts
pub const DRIVE_MAX_PAGE_SIZE: u32 = 1000;

/// Largest page `messages.list` accepts
pub const GMAIL_MAX_PAGE_SIZE: u32 = 500;

/// One page of a listing plus the token for the next one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub next_page_token: Option<String>,
}

/// Progress callback type for sequential batch operations
pub type ProgressCallback = Arc<dyn Fn() + Send + Sync>;

/// Anything that can delete a remote resource by id
#[async_trait]
pub trait Deleter: Send + Sync {
    async fn delete(&self, id: &str) -> Result<()>;
}

/// Drive operations used by the Drive manager
#[async_trait]
pub trait DriveClient: Deleter {
    /// Fetch one page of files
    async fn list_files_page(
        &self,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<Page<DriveFile>>;
}

/// Gmail operations used by the planner and the deleter
#[async_trait]
pub trait GmailClient: Deleter {
    /// Fetch one page of message ids matching a search query
    async fn list_message_ids_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<Page<String>>;

    /// Fetch sender, size estimate and snippet of one message
    async fn get_message(&self, id: &str) -> Result<GmailMessage>;
}

/// Drive client over the generated `google-drive3` hub
pub struct ProductionDriveClient {
    hub: DriveApiHub,
}

impl ProductionDriveClient {
    pub fn new(hub: DriveApiHub) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl Deleter for ProductionDriveClient {
    async fn delete(&self, id: &str) -> Result<()> {
        self.hub
            .files()
            .delete(id)
            .add_scope(DRIVE_SCOPE)
            .doit()
            .await?;
        Ok(())
    }
}

#[async_trait]
impl DriveClient for ProductionDriveClient {
    async fn list_files_page(
        &self,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<Page<DriveFile>> {
        let page_size = page_size.min(DRIVE_MAX_PAGE_SIZE) as i32;
        let mut call = self
            .hub
            .files()
            .list()
            .page_size(page_size)
            .param("fields", DRIVE_LIST_FIELDS);

        if let Some(token) = page_token.as_ref() {
            call = call.page_token(token);
        }

        let (_, response) = call.add_scope(DRIVE_SCOPE).doit().await?;

        let items: Vec<DriveFile> = response
            .files
            .unwrap_or_default()
            .into_iter()
            .filter_map(parse_drive_file)
            .collect();
        debug!("Listed {} Drive files", items.len());

        Ok(Page {
            items,
            next_page_token: response.next_page_token,
        })
    }
}

/// How the Gmail client removes messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GmailDeleteMode {
    /// `messages.trash`; Gmail purges Trash after 30 days
    Trash,
    /// `messages.delete`; immediate and irreversible
    Permanent,
}

/// Gmail client over the generated `google-gmail1` hub
pub struct ProductionGmailClient {
    hub: GmailHub,
    scope: &'static str,
    delete_mode: GmailDeleteMode,
}

impl ProductionGmailClient {
    /// `scope_set` must be the one the hub's token was granted for
    pub fn new(hub: GmailHub, scope_set: ScopeSet, delete_mode: GmailDeleteMode) -> Self {
        Self {
            hub,
            scope: scope_set.primary_scope(),
            delete_mode,
        }
    }
}

#[async_trait]
impl Deleter for ProductionGmailClient {
    async fn delete(&self, id: &str) -> Result<()> {
        match self.delete_mode {
            GmailDeleteMode::Trash => {
                self.hub
                    .users()
                    .messages_trash("me", id)
                    .add_scope(self.scope)
                    .doit()
                    .await?;
            }
            GmailDeleteMode::Permanent => {
                self.hub
                    .users()
                    .messages_delete("me", id)
                    .add_scope(GMAIL_FULL_SCOPE)
                    .doit()
                    .await?;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GmailClient for ProductionGmailClient {
    async fn list_message_ids_page(
        &self,
        query: &str,
        page_size: u32,
        page_token: Option<String>,
    ) -> Result<Page<String>> {
        let mut call = self
            .hub
            .users()
            .messages_list("me")
            .q(query)
            .max_results(page_size.min(GMAIL_MAX_PAGE_SIZE));

        if let Some(token) = page_token.as_ref() {
            call = call.page_token(token);
        }

        let (_, response) = call.add_scope(self.scope).doit().await?;

        let items: Vec<String> = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|msg_ref| msg_ref.id)
            .collect();
        debug!("Query '{}' returned {} ids on this page", query, items.len());

        Ok(Page {
            items,
            next_page_token: response.next_page_token,
        })
    }

    async fn get_message(&self, id: &str) -> Result<GmailMessage> {
        let (_, msg) = self
            .hub
            .users()
            .messages_get("me", id)
            .format("metadata")
            .add_metadata_headers("From")
            .add_scope(self.scope)
            .doit()
            .await?;

        parse_gmail_message(id, msg)
    }
}

/// Convert an API file into our record; files without an id are dropped
fn parse_drive_file(file: File) -> Option<DriveFile> {
    let id = file.id?;
    Some(DriveFile {
        name: file.name.unwrap_or_else(|| id.clone()),
        id,
        mime_type: file.mime_type.unwrap_or_default(),
        size_bytes: file.size.map(|s| s.max(0) as u64).unwrap_or(0),
        modified_time: file.modified_time,
    })
}

/// Convert an API message into our record.
///
/// Fails with `MalformedRecord` when the `From` header is absent; the caller
/// decides whether that skips the message or aborts the batch.
fn parse_gmail_message(requested_id: &str, msg: Message) -> Result<GmailMessage> {
    let id = msg.id.unwrap_or_else(|| requested_id.to_string());

    let from = msg
        .payload
        .as_ref()
        .and_then(|p| p.headers.as_ref())
        .and_then(|headers| {
            headers.iter().find_map(|header| match (&header.name, &header.value) {
                (Some(name), Some(value)) if name.eq_ignore_ascii_case("from") => {
                    Some(value.clone())
                }
                _ => None,
            })
        })
        .ok_or_else(|| CleanupError::MalformedRecord {
            id: id.clone(),
            reason: "missing From header".to_string(),
        })?;

    Ok(GmailMessage {
        id,
        snippet: msg.snippet.unwrap_or_default(),
        size_bytes: msg.size_estimate.map(|s| s.max(0) as u64).unwrap_or(0),
        from,
    })
}

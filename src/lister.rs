//! Paginated listings as lazy, restartable page streams
//!
//! Each call to [`drive_pages`] or [`message_id_pages`] starts a fresh walk
//! from the first page. Nothing is requested until the stream is polled, and
//! the walk ends at the last page or once `max_pages` pages were produced.

use async_stream::stream;
use futures::stream::{Stream, StreamExt};
use std::pin::Pin;
use tracing::{debug, info, warn};

use crate::client::{DriveClient, GmailClient};
use crate::error::Result;
use crate::models::DriveFile;

/// Boxed stream of pages
pub type PageStream<'a, T> = Pin<Box<dyn Stream<Item = Result<Vec<T>>> + Send + 'a>>;

/// Page size and optional page cap for one listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub page_size: u32,
    pub max_pages: Option<usize>,
}

impl ListOptions {
    pub fn new(page_size: u32, max_pages: Option<usize>) -> Self {
        Self {
            page_size,
            max_pages,
        }
    }

    /// Exactly one request, like a plain `list` call
    pub fn single_page(page_size: u32) -> Self {
        Self::new(page_size, Some(1))
    }

    fn allows(&self, pages_fetched: usize) -> bool {
        self.max_pages.map(|max| pages_fetched < max).unwrap_or(true)
    }
}

/// Stream the user's Drive files page by page
pub fn drive_pages<'a, C>(client: &'a C, options: ListOptions) -> PageStream<'a, DriveFile>
where
    C: DriveClient + ?Sized,
{
    Box::pin(stream! {
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        while options.allows(pages) {
            match client.list_files_page(options.page_size, page_token.clone()).await {
                Ok(page) => {
                    pages += 1;
                    debug!("Drive page {}: {} files", pages, page.items.len());
                    page_token = page.next_page_token;
                    yield Ok(page.items);
                    if page_token.is_none() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Error listing Drive files: {}", e);
                    yield Err(e);
                    break;
                }
            }
        }

        if page_token.is_some() {
            info!("Stopped Drive listing after {} pages; more files remain", pages);
        }
    })
}

/// Stream ids of messages matching `query` page by page
pub fn message_id_pages<'a, C>(
    client: &'a C,
    query: &'a str,
    options: ListOptions,
) -> PageStream<'a, String>
where
    C: GmailClient + ?Sized,
{
    Box::pin(stream! {
        let mut page_token: Option<String> = None;
        let mut pages = 0usize;

        while options.allows(pages) {
            match client
                .list_message_ids_page(query, options.page_size, page_token.clone())
                .await
            {
                Ok(page) => {
                    pages += 1;
                    page_token = page.next_page_token;
                    yield Ok(page.items);
                    if page_token.is_none() {
                        break;
                    }
                }
                Err(e) => {
                    warn!("Error listing messages for '{}': {}", query, e);
                    yield Err(e);
                    break;
                }
            }
        }

        if page_token.is_some() {
            info!("Stopped listing '{}' after {} pages; more messages remain", query, pages);
        }
    })
}

/// Drain a page stream into one vector, failing on the first page error
pub async fn collect_pages<T>(mut pages: PageStream<'_, T>) -> Result<Vec<T>> {
    let mut all = Vec::new();
    while let Some(page) = pages.next().await {
        all.extend(page?);
    }
    Ok(all)
}

/// All Drive files permitted by `options`
pub async fn list_drive_files<C>(client: &C, options: ListOptions) -> Result<Vec<DriveFile>>
where
    C: DriveClient + ?Sized,
{
    let files = collect_pages(drive_pages(client, options)).await?;
    info!("Listed {} Drive files", files.len());
    Ok(files)
}

/// All message ids matching `query` permitted by `options`
pub async fn list_message_ids<C>(
    client: &C,
    query: &str,
    options: ListOptions,
) -> Result<Vec<String>>
where
    C: GmailClient + ?Sized,
{
    collect_pages(message_id_pages(client, query, options)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_options_allows() {
        let unlimited = ListOptions::new(100, None);
        assert!(unlimited.allows(0));
        assert!(unlimited.allows(10_000));

        let single = ListOptions::single_page(1000);
        assert!(single.allows(0));
        assert!(!single.allows(1));

        let three = ListOptions::new(50, Some(3));
        assert!(three.allows(2));
        assert!(!three.allows(3));
    }
}

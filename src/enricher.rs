//! Per-message detail fetches for Gmail listings

use tracing::{debug, warn};

use crate::client::{GmailClient, ProgressCallback};
use crate::config::MalformedPolicy;
use crate::error::{CleanupError, Result};
use crate::models::CategoryBatch;

/// Fetch sender, size and snippet for each id, strictly one after another.
///
/// Messages without a `From` header are skipped or abort the batch according
/// to `policy`. A message that vanished since it was listed (404) is skipped.
/// Any other remote error aborts enrichment.
pub async fn enrich<C>(
    client: &C,
    ids: &[String],
    policy: MalformedPolicy,
    on_progress: Option<ProgressCallback>,
) -> Result<CategoryBatch>
where
    C: GmailClient + ?Sized,
{
    let mut batch = CategoryBatch::default();

    for id in ids {
        match client.get_message(id).await {
            Ok(message) => {
                batch.total_size += message.size_bytes;
                batch.messages.push(message);
            }
            Err(e @ CleanupError::MalformedRecord { .. }) => match policy {
                MalformedPolicy::Skip => {
                    warn!("Skipping message: {}", e);
                    batch.skipped += 1;
                }
                MalformedPolicy::Abort => return Err(e),
            },
            Err(e) if e.is_not_found() => {
                warn!("Message {} disappeared before it could be fetched", id);
                batch.skipped += 1;
            }
            Err(e) => return Err(e),
        }

        if let Some(progress) = on_progress.as_ref() {
            progress();
        }
    }

    debug!(
        "Enriched {} messages ({} bytes, {} skipped)",
        batch.messages.len(),
        batch.total_size,
        batch.skipped
    );
    Ok(batch)
}

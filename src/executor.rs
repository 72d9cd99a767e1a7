//! Deletion of remote resources, one id at a time

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::client::{Deleter, ProgressCallback};
use crate::error::{CleanupError, Result};
use crate::models::{BatchReport, Resource};

/// Deleter behind [`ActionExecutor::preview`]. Every call is refused.
pub struct NoDeleter;

#[async_trait]
impl Deleter for NoDeleter {
    async fn delete(&self, id: &str) -> Result<()> {
        Err(CleanupError::OperationCancelled(format!(
            "refusing to delete {} during a dry run",
            id
        )))
    }
}

impl ActionExecutor<'static, NoDeleter> {
    /// Dry-run executor that needs no authenticated client
    pub fn preview() -> Self {
        Self {
            deleter: &NoDeleter,
            dry_run: true,
        }
    }
}

/// Issues deletes through a [`Deleter`] and never lets a single failure
/// escape the batch.
pub struct ActionExecutor<'a, D: Deleter + ?Sized> {
    deleter: &'a D,
    dry_run: bool,
}

impl<'a, D: Deleter + ?Sized> ActionExecutor<'a, D> {
    pub fn new(deleter: &'a D) -> Self {
        Self {
            deleter,
            dry_run: false,
        }
    }

    /// Report what would be deleted without calling the API
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Delete one resource. Any failure is logged and returned as `false`.
    pub async fn delete(&self, id: &str) -> bool {
        self.try_delete(id).await.is_ok()
    }

    async fn try_delete(&self, id: &str) -> std::result::Result<(), String> {
        if self.dry_run {
            debug!("Dry run: would delete {}", id);
            return Ok(());
        }

        match self.deleter.delete(id).await {
            Ok(()) => {
                debug!("Deleted {}", id);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete {}: {}", id, e);
                Err(e.to_string())
            }
        }
    }

    /// Delete every record in order, continuing past failures
    pub async fn delete_all<R: Resource>(
        &self,
        records: &[R],
        on_progress: Option<ProgressCallback>,
    ) -> BatchReport {
        let mut report = BatchReport {
            dry_run: self.dry_run,
            ..BatchReport::default()
        };

        for record in records {
            match self.try_delete(record.id()).await {
                Ok(()) => report.deleted.push(record.id().to_string()),
                Err(message) => report.failed.push((record.id().to_string(), message)),
            }
            if let Some(progress) = on_progress.as_ref() {
                progress();
            }
        }

        if self.dry_run {
            info!("Dry run: would delete {} resources", report.deleted.len());
        } else {
            info!(
                "Deleted {} of {} resources ({} failed)",
                report.deleted.len(),
                report.attempted(),
                report.failed.len()
            );
        }
        report
    }
}

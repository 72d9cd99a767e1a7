//! Gmail plan phase: list, enrich, classify, stage and report

use chrono::Utc;
use std::path::Path;
use tracing::{info, warn};

use crate::classifier::{combine, TriageRules};
use crate::client::{GmailClient, ProgressCallback};
use crate::config::MalformedPolicy;
use crate::enricher::enrich;
use crate::error::Result;
use crate::lister::{list_message_ids, ListOptions};
use crate::models::{Category, CategoryBatch, CategoryStats, DeletionStatistics};
use crate::reporter::write_statistics;
use crate::staging::StagedDeletionSet;

/// Staged messages plus the figures describing them
#[derive(Debug, Clone)]
pub struct DeletionPlan {
    pub staged: StagedDeletionSet,
    pub statistics: DeletionStatistics,
}

impl DeletionPlan {
    /// Write the staging file and the statistics report
    pub async fn write(&self, staging_path: &Path, stats_path: &Path) -> Result<()> {
        self.staged.save(staging_path).await?;
        write_statistics(stats_path, &self.statistics).await?;
        info!(
            "Staged {} messages in {:?}, statistics in {:?}",
            self.staged.len(),
            staging_path,
            stats_path
        );
        Ok(())
    }
}

/// Builds a [`DeletionPlan`] from the user's mailbox
pub struct GmailPlanner<'a, C: GmailClient + ?Sized> {
    client: &'a C,
    rules: TriageRules,
    list_options: ListOptions,
    malformed_policy: MalformedPolicy,
    on_progress: Option<ProgressCallback>,
}

impl<'a, C: GmailClient + ?Sized> GmailPlanner<'a, C> {
    pub fn new(client: &'a C, rules: TriageRules, list_options: ListOptions) -> Self {
        Self {
            client,
            rules,
            list_options,
            malformed_policy: MalformedPolicy::default(),
            on_progress: None,
        }
    }

    pub fn with_malformed_policy(mut self, policy: MalformedPolicy) -> Self {
        self.malformed_policy = policy;
        self
    }

    /// Called once per enriched message id
    pub fn with_progress(mut self, callback: ProgressCallback) -> Self {
        self.on_progress = Some(callback);
        self
    }

    /// Ids for every query of a category. A failing query is logged,
    /// counted and contributes nothing.
    async fn collect_ids(&self, category: Category) -> Result<(Vec<String>, usize)> {
        let mut ids = Vec::new();
        let mut failed = 0;

        for query in self.rules.queries(category) {
            match list_message_ids(self.client, &query, self.list_options).await {
                Ok(found) => ids.extend(found),
                Err(e) if e.is_fatal_auth() => return Err(e),
                Err(e) => {
                    warn!("Query '{}' failed, treating as empty: {}", query, e);
                    failed += 1;
                }
            }
        }

        Ok((ids, failed))
    }

    async fn category_batch(&self, category: Category) -> Result<CategoryBatch> {
        let (ids, failed_queries) = self.collect_ids(category).await?;
        let mut batch = enrich(
            self.client,
            &ids,
            self.malformed_policy,
            self.on_progress.clone(),
        )
        .await?;
        batch.failed_queries = failed_queries;

        info!("Found {} {} emails", batch.messages.len(), category);
        Ok(batch)
    }

    /// Run every category in order (spam, large, old) and combine them
    pub async fn plan(&self) -> Result<DeletionPlan> {
        let mut selections = Vec::with_capacity(Category::ALL.len());
        let mut categories = Vec::with_capacity(Category::ALL.len());
        let mut failed_queries = 0;

        for category in Category::ALL {
            let batch = self.category_batch(category).await?;
            categories.push(CategoryStats {
                category,
                count: batch.messages.len(),
                bytes: batch.total_size,
            });
            failed_queries += batch.failed_queries;
            selections.push(batch.messages);
        }

        let selection = combine(selections, &self.rules);
        let staged = StagedDeletionSet::new(selection.messages);

        let statistics = DeletionStatistics {
            generated_at: Utc::now(),
            total_count: staged.len(),
            total_bytes: staged.total_size(),
            categories,
            whitelisted: selection.whitelisted,
            duplicates_removed: selection.duplicates_removed,
            failed_queries,
        };

        Ok(DeletionPlan { staged, statistics })
    }
}

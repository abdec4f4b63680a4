//! Batch orchestration.
//!
//! The controller walks `DISCOVERING → FILTERING → PROCESSING(i) → DONE`:
//! discovery pulls the listing in incremental batches until enough
//! unprocessed candidates have accumulated (filtering against the ledger as
//! it goes), then each item runs extract → build → record → catalog with
//! per-item failure isolation. One item's failure never aborts the batch;
//! it is logged, counted as skipped, and the loop advances.
//!
//! Cancellation is cooperative: the [`CancelFlag`] is checked only at item
//! boundaries, so the in-flight item always finishes or fails cleanly
//! before a stop request is honored.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, info, warn};
use url::Url;

use crate::Result;
use crate::catalog::{CatalogRow, CatalogService};
use crate::enhance::{Enhancer, apply_enhancement};
use crate::extract::{ExtractConfig, extract_item};
use crate::fetch::{FetchConfig, PageFetcher};
use crate::item::ExtractedItem;
use crate::ledger::{Ledger, ProcessingRecord};
use crate::listing::list_items;
use crate::sites::{Site, SiteProfile};
use crate::slides::{PresentationBuilder, SlideImage};

/// Where the controller gets its items.
///
/// [`SiteClient`] is the real implementation; tests substitute their own.
#[async_trait]
pub trait ItemSource: Send + Sync {
    /// Item URLs most-recent-first, restarting from the first listing page
    /// on every call. Errors surface as partial results, never failures.
    async fn list_items(&self, limit: Option<usize>) -> Vec<Url>;

    /// Extracts one item page; `Ok(None)` means the page could not be
    /// fetched and the item should be skipped.
    async fn fetch_item(&self, url: &Url) -> Result<Option<ExtractedItem>>;

    /// Politeness pause between successive item fetches. The default is a
    /// no-op; sources backed by a live website sleep here.
    async fn throttle(&self) {}
}

/// Listing + extraction against a live site, through one shared fetcher.
pub struct SiteClient {
    fetcher: PageFetcher,
    profile: &'static dyn SiteProfile,
    extract_config: ExtractConfig,
}

impl SiteClient {
    pub fn new(site: Site, fetch_config: FetchConfig, extract_config: ExtractConfig) -> Result<Self> {
        Ok(Self { fetcher: PageFetcher::new(fetch_config)?, profile: site.profile(), extract_config })
    }
}

#[async_trait]
impl ItemSource for SiteClient {
    async fn list_items(&self, limit: Option<usize>) -> Vec<Url> {
        list_items(&self.fetcher, self.profile, limit).await
    }

    async fn fetch_item(&self, url: &Url) -> Result<Option<ExtractedItem>> {
        extract_item(&self.fetcher, self.profile, url, &self.extract_config).await
    }

    async fn throttle(&self) {
        self.fetcher.item_pause().await;
    }
}

/// Cooperative stop signal, checked between items only.
#[derive(Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests a stop. The current item still finishes or fails cleanly.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Per-run settings resolved at setup time.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of new items to process.
    pub target: usize,
    /// Drive folder collecting the produced presentations.
    pub folder_id: String,
    /// Spreadsheet catalog receiving one row per presentation.
    pub catalog_id: String,
}

/// One successfully processed item.
#[derive(Debug, Clone)]
pub struct CreatedItem {
    pub article_url: String,
    pub title: String,
    pub presentation_url: String,
    pub slide_count: usize,
}

/// One item that produced no presentation, with the reason.
#[derive(Debug, Clone)]
pub struct SkippedItem {
    pub article_url: String,
    pub reason: String,
}

/// Final tally of a batch run.
#[derive(Debug, Clone, Default)]
pub struct RunSummary {
    pub created: Vec<CreatedItem>,
    pub skipped: Vec<SkippedItem>,
    /// True when the run ended on a stop request rather than exhaustion.
    pub stopped: bool,
}

impl RunSummary {
    pub fn total_slides(&self) -> usize {
        self.created.iter().map(|c| c.slide_count).sum()
    }
}

enum ItemOutcome {
    Created(CreatedItem),
    Skipped(&'static str),
}

/// Orchestrates one batch run over a single site.
///
/// The ledger and catalog are the only mutable resources; exactly one
/// controller instance may be active at a time (documented precondition,
/// not enforced by locking).
pub struct BatchController<S, B, C> {
    source: S,
    builder: B,
    catalog: C,
    ledger: Ledger,
    enhancer: Arc<dyn Enhancer>,
    config: BatchConfig,
}

impl<S, B, C> BatchController<S, B, C>
where
    S: ItemSource,
    B: PresentationBuilder,
    C: CatalogService,
{
    pub fn new(source: S, builder: B, catalog: C, ledger: Ledger, enhancer: Arc<dyn Enhancer>, config: BatchConfig) -> Self {
        Self { source, builder, catalog, ledger, enhancer, config }
    }

    /// Runs the batch to completion, exhaustion, or a stop request.
    pub async fn run(&mut self, cancel: &CancelFlag) -> RunSummary {
        let queue = self.discover().await;
        info!(queued = queue.len(), target = self.config.target, "discovery complete");

        let mut summary = RunSummary::default();

        for (idx, url) in queue.iter().enumerate() {
            if cancel.is_cancelled() {
                info!("stop requested, ending batch at item boundary");
                summary.stopped = true;
                break;
            }
            if idx > 0 {
                self.source.throttle().await;
            }

            match self.process_item(url).await {
                Ok(ItemOutcome::Created(created)) => {
                    info!(url = %url, title = %created.title, slides = created.slide_count, "presentation created");
                    summary.created.push(created);
                }
                Ok(ItemOutcome::Skipped(reason)) => {
                    info!(url = %url, reason, "item skipped");
                    summary.skipped.push(SkippedItem { article_url: url.to_string(), reason: reason.to_string() });
                }
                Err(e) => {
                    warn!(url = %url, error = %e, "item failed");
                    summary.skipped.push(SkippedItem { article_url: url.to_string(), reason: e.to_string() });
                }
            }
        }

        info!(
            created = summary.created.len(),
            skipped = summary.skipped.len(),
            slides = summary.total_slides(),
            "batch done"
        );

        summary
    }

    /// Pulls the listing in incremental batches, filtering against the
    /// ledger, until enough unprocessed candidates have accumulated or the
    /// listing is exhausted. Avoids listing everything when only a handful
    /// of new items are needed; each pull restarts from page 1 per the
    /// listing contract.
    async fn discover(&self) -> Vec<Url> {
        let target = self.config.target;
        if target == 0 {
            return Vec::new();
        }

        let mut batch = target.saturating_mul(2);
        loop {
            let listed = self.source.list_items(Some(batch)).await;
            let exhausted = listed.len() < batch;

            let mut fresh: Vec<Url> =
                listed.into_iter().filter(|url| !self.ledger.is_processed(url)).collect();

            if fresh.len() >= target || exhausted {
                fresh.truncate(target);
                return fresh;
            }

            batch = batch.saturating_mul(2);
            debug!(batch, fresh = fresh.len(), "relisting with a larger batch");
        }
    }

    /// Processes one item: extract, enhance gaps, build, record, catalog.
    ///
    /// The ledger write happens strictly after a successful build, and
    /// nothing here rolls back: a catalog failure after the record leaves
    /// the record in place.
    async fn process_item(&mut self, url: &Url) -> Result<ItemOutcome> {
        let Some(extracted) = self.source.fetch_item(url).await? else {
            return Ok(ItemOutcome::Skipped("page could not be fetched"));
        };
        let ExtractedItem { mut item, images, excerpt } = extracted;

        if images.is_empty() {
            return Ok(ItemOutcome::Skipped("no qualifying images"));
        }

        if item.needs_enhancement()
            && let Some(fields) = self.enhancer.enhance(&excerpt, &item.title).await
        {
            debug!(url = %url, "metadata gaps enhanced");
            apply_enhancement(&mut item, &fields);
        }

        let slides: Vec<SlideImage> = images
            .iter()
            .map(|image| SlideImage { url: image.url.clone(), caption_lines: image.caption_lines(&item) })
            .collect();

        let built = self.builder.build(&item.title, &item.url, &slides).await?;
        self.catalog.move_into_folder(&built.id, &self.config.folder_id).await?;

        let record = ProcessingRecord {
            presentation_id: built.id,
            presentation_url: built.url,
            title: item.title.clone(),
            author: item.author.clone(),
            year: item.year.clone(),
            medium: item.medium.clone(),
            keywords: item.keywords.clone(),
            slide_count: slides.len(),
            processed_at: Utc::now(),
        };
        self.ledger.record(url, record.clone())?;

        self.catalog.append_row(&self.config.catalog_id, &CatalogRow::from_record(url, &record)).await?;

        Ok(ItemOutcome::Created(CreatedItem {
            article_url: url.to_string(),
            title: record.title,
            presentation_url: record.presentation_url,
            slide_count: record.slide_count,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancel_flag() {
        let flag = CancelFlag::new();
        assert!(!flag.is_cancelled());

        let clone = flag.clone();
        clone.cancel();
        assert!(flag.is_cancelled());
    }

    #[test]
    fn test_summary_slide_total() {
        let mut summary = RunSummary::default();
        assert_eq!(summary.total_slides(), 0);

        summary.created.push(CreatedItem {
            article_url: "https://example.com/a".to_string(),
            title: "A".to_string(),
            presentation_url: "https://docs.google.com/presentation/d/1".to_string(),
            slide_count: 3,
        });
        summary.created.push(CreatedItem {
            article_url: "https://example.com/b".to_string(),
            title: "B".to_string(),
            presentation_url: "https://docs.google.com/presentation/d/2".to_string(),
            slide_count: 2,
        });
        assert_eq!(summary.total_slides(), 5);
    }
}

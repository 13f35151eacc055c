//! Runs the full per-type scrape and assembles the final record map.

use anyhow::Result;
use tracing::{info, warn};

use crate::core::config::ScrapeTuning;
use crate::core::types::{GachaRecord, GachaRecordMap};
use crate::scraping::paginate::{collect_all_pages, resolve_container};
use crate::scraping::view::{
    RecordView, ViewFactory, EMPTY_TABLE, ROW_SELECTOR, TYPE_DROPDOWN, TYPE_OPTION,
};

/// Iterates draw types serially, one fresh view per type.
///
/// Serial on purpose: the record UI keeps category state in a single shared
/// viewport, and concurrent tabs against the same session race on it. The
/// view is released unconditionally after each type, success or failure.
pub struct ScrapeOrchestrator<'a, F: ViewFactory> {
    factory: &'a F,
    tuning: ScrapeTuning,
}

impl<'a, F: ViewFactory> ScrapeOrchestrator<'a, F> {
    pub fn new(factory: &'a F, tuning: ScrapeTuning) -> Self {
        Self { factory, tuning }
    }

    /// Scrape every draw type in `types` order. Types that yield no records
    /// are omitted from the map; per-type failures are logged and skipped so
    /// one broken category never aborts the run.
    pub async fn collect_all_types(&self, base_url: &str, types: &[String]) -> GachaRecordMap {
        let mut result = GachaRecordMap::new();

        for type_name in types {
            info!("scraping draw type: {}", type_name);
            match self.collect_one_type(base_url, type_name).await {
                Ok(records) if !records.is_empty() => {
                    info!("{}: {} record(s)", type_name, records.len());
                    result.insert(type_name.clone(), records);
                }
                Ok(_) => info!("{}: no records", type_name),
                Err(e) => warn!("{}: scrape failed, skipping: {:#}", type_name, e),
            }
        }

        result
    }

    async fn collect_one_type(&self, base_url: &str, type_name: &str) -> Result<Vec<GachaRecord>> {
        let view = self.factory.open(base_url).await?;
        let result = self.scrape_in_view(&view, type_name).await;
        view.close().await;
        result
    }

    async fn scrape_in_view<V: RecordView>(
        &self,
        view: &V,
        type_name: &str,
    ) -> Result<Vec<GachaRecord>> {
        if !view.exists(TYPE_DROPDOWN).await {
            warn!("draw-type dropdown not found, skipping {}", type_name);
            return Ok(Vec::new());
        }
        view.click(TYPE_DROPDOWN).await?;
        if !view.wait_for(TYPE_OPTION, self.tuning.option_wait).await {
            warn!("dropdown options never appeared, skipping {}", type_name);
            return Ok(Vec::new());
        }
        if !view.click_option(TYPE_OPTION, type_name).await? {
            info!("option {} not present in dropdown, skipping", type_name);
            return Ok(Vec::new());
        }

        // Let the table re-render for the newly selected category.
        view.settle(self.tuning.settle_delay).await;

        // A known-empty table short-circuits the pagination machine entirely.
        let container = resolve_container(view).await;
        let row_probe = format!("{} {}", container, ROW_SELECTOR);
        if !view.exists(&row_probe).await && view.exists(EMPTY_TABLE).await {
            info!("{}: table reports empty", type_name);
            return Ok(Vec::new());
        }

        collect_all_pages(view, &self.tuning).await
    }
}

//! Pagination over one draw type's record table.
//!
//! The record UI exposes no "page N of M" signal and no page query
//! parameter, only a next button and DOM mutation. Termination therefore
//! rests on two signals: a page shorter than the fixed page size is the last
//! one, and a page whose fingerprint equals the previous capture means the
//! click changed nothing (or the render raced us) and the table is exhausted.

use anyhow::Result;
use tracing::info;

use crate::core::config::ScrapeTuning;
use crate::core::types::GachaRecord;
use crate::scraping::view::{
    RecordView, CONTENT_SELECTORS, FALLBACK_CONTAINER, NEXT_BUTTON,
};

/// Equality key over a captured page: the ordered (type, name, time) of every
/// row, joined. Compared only against the immediately preceding capture.
pub fn page_fingerprint(records: &[GachaRecord]) -> String {
    records
        .iter()
        .map(|r| format!("{}|{}|{}", r.draw_type, r.name, r.time))
        .collect()
}

/// First content-container selector that matches, falling back to the whole
/// document.
pub async fn resolve_container<V: RecordView>(view: &V) -> &'static str {
    for selector in CONTENT_SELECTORS.iter().copied() {
        if view.exists(selector).await {
            return selector;
        }
    }
    FALLBACK_CONTAINER
}

/// Drive the table through every page and collect all records.
///
/// Per iteration: snapshot the container, capture the rows, stop on an empty
/// or repeated page, append, stop on a shortfall page or a missing/disabled
/// next button, otherwise click next and wait (bounded) for the container to
/// visibly change. A timed-out wait is treated as "probably advanced"; a
/// wrong guess only produces one duplicate capture, which the fingerprint
/// check catches next iteration.
pub async fn collect_all_pages<V: RecordView>(
    view: &V,
    tuning: &ScrapeTuning,
) -> Result<Vec<GachaRecord>> {
    let selector = resolve_container(view).await;
    let mut records: Vec<GachaRecord> = Vec::new();
    let mut last_fingerprint = String::new();

    loop {
        if !view.exists(selector).await {
            break;
        }
        let before = view.inner_html(selector).await?.unwrap_or_default();

        let page = view.capture_rows().await?;
        if page.is_empty() {
            break;
        }

        let fingerprint = page_fingerprint(&page);
        if fingerprint == last_fingerprint {
            break;
        }
        last_fingerprint = fingerprint;

        for record in &page {
            log_record(record);
        }
        let last_page = page.len() < tuning.page_size;
        records.extend(page);
        if last_page {
            break;
        }

        if !view.exists(NEXT_BUTTON).await {
            break;
        }
        if view.attribute(NEXT_BUTTON, "disabled").await?.is_some() {
            break;
        }
        view.click(NEXT_BUTTON).await?;
        view.wait_for_change(selector, &before, tuning.mutation_wait)
            .await;
        view.settle(tuning.advance_pause).await;
    }

    Ok(records)
}

fn log_record(record: &GachaRecord) {
    info!(
        quality = record.quality.as_deref().unwrap_or(""),
        "[{}] {} x{} @{}",
        record.draw_type,
        record.name,
        record.count,
        record.time
    );
}

//! Reads the selectable draw types from the category dropdown.

use std::collections::HashSet;

use anyhow::Result;
use tracing::warn;

use crate::core::config::ScrapeTuning;
use crate::scraping::view::{RecordView, TYPE_DROPDOWN, TYPE_OPTION};

/// Open the dropdown, read the option labels, and close it again.
///
/// An absent dropdown means "no categories available" and yields an empty
/// list, not an error. The close click runs even when the read fails, so a
/// later scrape never starts with the dropdown left open.
pub async fn enumerate_draw_types<V: RecordView>(
    view: &V,
    tuning: &ScrapeTuning,
) -> Result<Vec<String>> {
    if !view.exists(TYPE_DROPDOWN).await {
        return Ok(Vec::new());
    }

    view.click(TYPE_DROPDOWN).await?;

    let read = async {
        if !view.wait_for(TYPE_OPTION, tuning.option_wait).await {
            // Distinct from the absent-dropdown case above: the control is
            // there but its options never rendered, which usually means the
            // page is still loading rather than the account having no history.
            warn!(
                "draw-type dropdown is present but no options appeared within {:?}; \
                 the record page may not have finished loading",
                tuning.option_wait
            );
            return Ok(Vec::new());
        }
        view.option_labels(TYPE_OPTION).await
    }
    .await;

    // Restore the closed state before reporting any read failure.
    if let Err(e) = view.click(TYPE_DROPDOWN).await {
        warn!("failed to close the draw-type dropdown: {}", e);
    }

    let labels = read?;
    let mut seen = HashSet::new();
    Ok(labels
        .into_iter()
        .filter(|label| !label.is_empty() && seen.insert(label.clone()))
        .collect())
}

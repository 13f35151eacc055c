//! Pagination and orchestration against a scripted in-memory record UI.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use gacha_harvest::core::config::ScrapeTuning;
use gacha_harvest::core::types::GachaRecord;
use gacha_harvest::scraping::draw_types::enumerate_draw_types;
use gacha_harvest::scraping::paginate::{collect_all_pages, resolve_container};
use gacha_harvest::scraping::view::{
    RecordView, ViewFactory, CONTENT_SELECTORS, EMPTY_TABLE, FALLBACK_CONTAINER, NEXT_BUTTON,
    ROW_SELECTOR, TYPE_DROPDOWN, TYPE_OPTION,
};
use gacha_harvest::ScrapeOrchestrator;

fn fast_tuning() -> ScrapeTuning {
    ScrapeTuning {
        page_size: 5,
        settle_delay: Duration::ZERO,
        mutation_wait: Duration::from_millis(5),
        advance_pause: Duration::ZERO,
        option_wait: Duration::from_millis(5),
    }
}

fn rec(name: &str, time: &str) -> GachaRecord {
    GachaRecord {
        draw_type: "Featured".to_string(),
        name: name.to_string(),
        count: 1,
        time: time.to_string(),
        quality: Some("quality4".to_string()),
    }
}

fn page_of(ids: std::ops::Range<usize>) -> Vec<GachaRecord> {
    ids.map(|i| rec(&format!("Item{i}"), &format!("2024-06-01 12:00:{i:02}")))
        .collect()
}

// ── Scripted view ────────────────────────────────────────────────────────────

#[derive(Clone)]
struct FakeState {
    pages: Vec<Vec<GachaRecord>>,
    index: usize,
    /// Whether a next-click actually advances — `false` simulates the click
    /// that produced no visible change.
    advance_on_click: bool,
    has_container: bool,
    /// When false, not even the document-level fallback container matches;
    /// models a page that never rendered.
    has_document: bool,
    has_empty_indicator: bool,
    dropdown_present: bool,
    options: Vec<String>,
    next_clicks: usize,
    dropdown_clicks: usize,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            pages: Vec::new(),
            index: 0,
            advance_on_click: true,
            has_container: true,
            has_document: true,
            has_empty_indicator: false,
            dropdown_present: true,
            options: Vec::new(),
            next_clicks: 0,
            dropdown_clicks: 0,
        }
    }
}

#[derive(Clone)]
struct FakeView {
    state: Arc<Mutex<FakeState>>,
}

impl FakeView {
    fn new(state: FakeState) -> Self {
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn current_rows(&self) -> Vec<GachaRecord> {
        let s = self.state.lock().unwrap();
        s.pages.get(s.index).cloned().unwrap_or_default()
    }
}

#[async_trait]
impl RecordView for FakeView {
    async fn exists(&self, selector: &str) -> bool {
        let s = self.state.lock().unwrap();
        match selector {
            sel if sel == TYPE_DROPDOWN => s.dropdown_present,
            sel if sel == TYPE_OPTION => s.dropdown_present && !s.options.is_empty(),
            sel if sel == EMPTY_TABLE => s.has_empty_indicator,
            sel if sel == NEXT_BUTTON => true,
            sel if sel == CONTENT_SELECTORS[0] => s.has_container && s.has_document,
            sel if sel == FALLBACK_CONTAINER => s.has_document,
            // The "<container> <row>" probe used before pagination starts.
            sel if sel.ends_with(ROW_SELECTOR) && sel.len() > ROW_SELECTOR.len() => {
                s.pages.get(s.index).map(|p| !p.is_empty()).unwrap_or(false)
            }
            _ => false,
        }
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let mut s = self.state.lock().unwrap();
        if selector == NEXT_BUTTON {
            s.next_clicks += 1;
            if s.advance_on_click && s.index + 1 < s.pages.len() {
                s.index += 1;
            }
        } else if selector == TYPE_DROPDOWN {
            s.dropdown_clicks += 1;
        }
        Ok(())
    }

    async fn attribute(&self, _selector: &str, _name: &str) -> Result<Option<String>> {
        Ok(None) // next button is never disabled in these scripts
    }

    async fn inner_html(&self, _selector: &str) -> Result<Option<String>> {
        let s = self.state.lock().unwrap();
        Ok(Some(format!("page-{}", s.index)))
    }

    async fn option_labels(&self, _selector: &str) -> Result<Vec<String>> {
        Ok(self.state.lock().unwrap().options.clone())
    }

    async fn click_option(&self, _selector: &str, label: &str) -> Result<bool> {
        Ok(self
            .state
            .lock()
            .unwrap()
            .options
            .iter()
            .any(|o| o == label))
    }

    async fn capture_rows(&self) -> Result<Vec<GachaRecord>> {
        Ok(self.current_rows())
    }

    async fn wait_for(&self, selector: &str, _timeout: Duration) -> bool {
        self.exists(selector).await
    }

    async fn wait_for_change(&self, selector: &str, before: &str, _timeout: Duration) -> bool {
        self.inner_html(selector).await.ok().flatten().as_deref() != Some(before)
    }

    async fn settle(&self, _delay: Duration) {}

    async fn close(self) {}
}

struct FakeFactory {
    template: FakeState,
}

#[async_trait]
impl ViewFactory for FakeFactory {
    type View = FakeView;

    async fn open(&self, _url: &str) -> Result<FakeView> {
        Ok(FakeView::new(self.template.clone()))
    }
}

// ── PaginatedTableScraper ────────────────────────────────────────────────────

#[tokio::test]
async fn test_three_pages_with_shortfall_capture_all_records() {
    let view = FakeView::new(FakeState {
        pages: vec![page_of(0..5), page_of(5..10), page_of(10..13)],
        ..Default::default()
    });

    let records = collect_all_pages(&view, &fast_tuning()).await.unwrap();

    assert_eq!(records.len(), 13);
    // The shortfall page (3 < 5) is the last one: no click after it.
    assert_eq!(view.state.lock().unwrap().next_clicks, 2);
    // Scrape order is preserved across page boundaries.
    assert_eq!(records[0].name, "Item0");
    assert_eq!(records[12].name, "Item12");
}

#[tokio::test]
async fn test_noop_click_stops_without_double_counting() {
    let view = FakeView::new(FakeState {
        pages: vec![page_of(0..5)],
        advance_on_click: false,
        ..Default::default()
    });

    let records = collect_all_pages(&view, &fast_tuning()).await.unwrap();

    // Page one was full, so the scraper clicked next; the click changed
    // nothing and the repeated fingerprint terminated the loop.
    assert_eq!(records.len(), 5);
    assert_eq!(view.state.lock().unwrap().next_clicks, 1);
}

#[tokio::test]
async fn test_empty_table_yields_zero_records() {
    let view = FakeView::new(FakeState {
        pages: vec![vec![]],
        ..Default::default()
    });

    let records = collect_all_pages(&view, &fast_tuning()).await.unwrap();
    assert!(records.is_empty());
    assert_eq!(view.state.lock().unwrap().next_clicks, 0);
}

#[tokio::test]
async fn test_unrendered_page_yields_zero_records_without_clicking() {
    // Not even the document-level fallback matches: the scraper must stop
    // before capturing or paging, even though row data is scripted.
    let view = FakeView::new(FakeState {
        pages: vec![page_of(0..5)],
        has_container: false,
        has_document: false,
        ..Default::default()
    });

    let records = collect_all_pages(&view, &fast_tuning()).await.unwrap();

    assert!(records.is_empty());
    assert_eq!(view.state.lock().unwrap().next_clicks, 0);
}

#[tokio::test]
async fn test_container_resolution_falls_back_to_document() {
    let view = FakeView::new(FakeState {
        has_container: false,
        ..Default::default()
    });
    assert_eq!(resolve_container(&view).await, FALLBACK_CONTAINER);

    let view = FakeView::new(FakeState::default());
    assert_eq!(resolve_container(&view).await, CONTENT_SELECTORS[0]);
}

// ── DrawTypeEnumerator ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_enumerate_draw_types_reads_and_closes_dropdown() {
    let view = FakeView::new(FakeState {
        options: vec![
            "Featured Resonator".to_string(),
            String::new(),
            "Featured Resonator".to_string(),
            "Standard".to_string(),
        ],
        ..Default::default()
    });

    let types = enumerate_draw_types(&view, &fast_tuning()).await.unwrap();

    assert_eq!(types, ["Featured Resonator", "Standard"]);
    // Opened once, closed once.
    assert_eq!(view.state.lock().unwrap().dropdown_clicks, 2);
}

#[tokio::test]
async fn test_enumerate_draw_types_timeout_is_empty_but_still_closes() {
    // Dropdown is there, options never render within the wait budget. The
    // result degrades to "no categories" and the dropdown is closed again.
    let view = FakeView::new(FakeState {
        options: Vec::new(),
        ..Default::default()
    });

    let types = enumerate_draw_types(&view, &fast_tuning()).await.unwrap();
    assert!(types.is_empty());
    assert_eq!(view.state.lock().unwrap().dropdown_clicks, 2);
}

#[tokio::test]
async fn test_enumerate_draw_types_absent_control_is_empty() {
    let view = FakeView::new(FakeState {
        dropdown_present: false,
        ..Default::default()
    });

    let types = enumerate_draw_types(&view, &fast_tuning()).await.unwrap();
    assert!(types.is_empty());
    assert_eq!(view.state.lock().unwrap().dropdown_clicks, 0);
}

// ── ScrapeOrchestrator ───────────────────────────────────────────────────────

#[tokio::test]
async fn test_empty_indicator_category_is_absent_from_map() {
    let factory = FakeFactory {
        template: FakeState {
            pages: vec![vec![]],
            has_empty_indicator: true,
            options: vec!["Beginner Convene".to_string()],
            ..Default::default()
        },
    };
    let orchestrator = ScrapeOrchestrator::new(&factory, fast_tuning());

    let map = orchestrator
        .collect_all_types("https://example.test/record", &["Beginner Convene".to_string()])
        .await;

    // Key absent entirely, not mapped to an empty sequence.
    assert!(!map.contains_key("Beginner Convene"));
    assert!(map.is_empty());
}

#[tokio::test]
async fn test_unknown_option_is_skipped_not_fatal() {
    let factory = FakeFactory {
        template: FakeState {
            pages: vec![page_of(0..3)],
            options: vec!["Featured".to_string()],
            ..Default::default()
        },
    };
    let orchestrator = ScrapeOrchestrator::new(&factory, fast_tuning());

    let map = orchestrator
        .collect_all_types(
            "https://example.test/record",
            &["Ghost Banner".to_string(), "Featured".to_string()],
        )
        .await;

    // The unknown category is skipped; the run continues to the next one.
    assert!(!map.contains_key("Ghost Banner"));
    assert_eq!(map["Featured"].len(), 3);
}

#[tokio::test]
async fn test_map_preserves_enumerated_type_order() {
    let factory = FakeFactory {
        template: FakeState {
            pages: vec![page_of(0..2)],
            options: vec!["Featured".to_string(), "Standard".to_string()],
            ..Default::default()
        },
    };
    let orchestrator = ScrapeOrchestrator::new(&factory, fast_tuning());

    let map = orchestrator
        .collect_all_types(
            "https://example.test/record",
            &["Featured".to_string(), "Standard".to_string()],
        )
        .await;

    let keys: Vec<_> = map.keys().cloned().collect();
    assert_eq!(keys, ["Featured", "Standard"]);
    assert_eq!(map["Standard"].len(), 2);
}

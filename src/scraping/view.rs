//! The capability seam between the scrape engines and the browser.
//!
//! The engines only ever need a small set of page operations: existence
//! checks, clicks, attribute/HTML reads, row capture, and bounded waits.
//! [`RecordView`] captures exactly that set so the engines depend on the
//! capabilities, not on `chromiumoxide` itself, and tests can drive them
//! with scripted fakes.

use std::time::{Duration, Instant};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chromiumoxide::Page;

use crate::core::types::GachaRecord;
use crate::scraping::browser::BrowserSession;

// ── Record UI selectors ──────────────────────────────────────────────────────

/// Content container candidates, tried in priority order. The record SPA has
/// shipped several wrappers; `body` is the last resort.
pub const CONTENT_SELECTORS: &[&str] = &[".content-x", ".record-table", ".app-content", ".content"];
pub const FALLBACK_CONTAINER: &str = "body";

/// One visible record row. Shares a class with the first container candidate;
/// that is how the SPA ships its markup.
pub const ROW_SELECTOR: &str = ".content-x";

/// The four `<p>` cells of a row: type, name, count, time.
pub const ROW_CELL_SELECTOR: &str = ".content-item p";

pub const NEXT_BUTTON: &str = ".arrow-right.default-btn";
pub const TYPE_DROPDOWN: &str = ".app-select-value";
pub const TYPE_OPTION: &str = ".app-select-list-label";
pub const EMPTY_TABLE: &str = ".app-table-content.empty .app-table-empty";

// ── Capability traits ────────────────────────────────────────────────────────

/// A single page/view of the record UI.
#[async_trait]
pub trait RecordView: Send + Sync {
    /// Whether `selector` currently matches anything.
    async fn exists(&self, selector: &str) -> bool;

    /// Click the first match of `selector`.
    async fn click(&self, selector: &str) -> Result<()>;

    /// Read an attribute of the first match; `Ok(None)` when the attribute
    /// (or the element) is absent.
    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>>;

    /// Serialized inner content of the first match, for change detection.
    async fn inner_html(&self, selector: &str) -> Result<Option<String>>;

    /// Trimmed, non-empty text of every match of `selector`, in document order.
    async fn option_labels(&self, selector: &str) -> Result<Vec<String>>;

    /// Click the match of `selector` whose trimmed text equals `label`
    /// exactly. Returns whether such a match existed.
    async fn click_option(&self, selector: &str, label: &str) -> Result<bool>;

    /// Parse every visible record row into a [`GachaRecord`].
    async fn capture_rows(&self) -> Result<Vec<GachaRecord>>;

    /// Wait (bounded) until `selector` matches something. `false` on timeout.
    async fn wait_for(&self, selector: &str, timeout: Duration) -> bool;

    /// Wait (bounded) until the inner content of `selector` differs from
    /// `before`. `false` on timeout; the caller treats that as "probably
    /// advanced anyway", never as an error.
    async fn wait_for_change(&self, selector: &str, before: &str, timeout: Duration) -> bool;

    /// Fixed cooperative pause.
    async fn settle(&self, delay: Duration);

    /// Release the view. Must be infallible from the caller's perspective.
    async fn close(self);
}

/// Opens one isolated [`RecordView`] per draw type.
#[async_trait]
pub trait ViewFactory: Send + Sync {
    type View: RecordView;

    /// Navigate a fresh view to `url` and wait for it to be ready.
    async fn open(&self, url: &str) -> Result<Self::View>;
}

// ── chromiumoxide implementation ─────────────────────────────────────────────

/// JSON-escape a string for safe embedding into an evaluated script.
fn js_str(s: &str) -> String {
    serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
}

pub struct CdpView {
    page: Page,
}

impl CdpView {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    async fn eval<T: serde::de::DeserializeOwned>(&self, script: String) -> Result<T> {
        self.page
            .evaluate(script)
            .await
            .map_err(|e| anyhow!("page evaluate failed: {}", e))?
            .into_value::<T>()
            .map_err(|e| anyhow!("unexpected evaluate result shape: {}", e))
    }
}

#[async_trait]
impl RecordView for CdpView {
    async fn exists(&self, selector: &str) -> bool {
        self.page.find_element(selector).await.is_ok()
    }

    async fn click(&self, selector: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .map_err(|e| anyhow!("element {} not found: {}", selector, e))?;
        element
            .click()
            .await
            .map_err(|e| anyhow!("click on {} failed: {}", selector, e))?;
        Ok(())
    }

    async fn attribute(&self, selector: &str, name: &str) -> Result<Option<String>> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? el.getAttribute({attr}) : null; }})()",
            sel = js_str(selector),
            attr = js_str(name),
        );
        self.eval(script).await
    }

    async fn inner_html(&self, selector: &str) -> Result<Option<String>> {
        let script = format!(
            "(() => {{ const el = document.querySelector({sel}); \
             return el ? el.innerHTML : null; }})()",
            sel = js_str(selector),
        );
        self.eval(script).await
    }

    async fn option_labels(&self, selector: &str) -> Result<Vec<String>> {
        let script = format!(
            "Array.from(document.querySelectorAll({sel}))\
             .map((el) => (el.textContent || '').trim())\
             .filter(Boolean)",
            sel = js_str(selector),
        );
        self.eval(script).await
    }

    async fn click_option(&self, selector: &str, label: &str) -> Result<bool> {
        let script = format!(
            "(() => {{ \
             const el = Array.from(document.querySelectorAll({sel}))\
                 .find((el) => (el.textContent || '').trim() === {label}); \
             if (!el) return false; \
             el.click(); \
             return true; }})()",
            sel = js_str(selector),
            label = js_str(label),
        );
        self.eval(script).await
    }

    async fn capture_rows(&self) -> Result<Vec<GachaRecord>> {
        let script = format!(
            "(() => {{ \
             const rows = Array.from(document.querySelectorAll({row})); \
             return rows.map((row) => {{ \
                 const cols = row.querySelectorAll({cell}); \
                 const text = (i) => (cols[i] && cols[i].textContent || '').trim(); \
                 const count = parseInt(text(2) || '0', 10); \
                 return {{ \
                     type: text(0), \
                     name: text(1), \
                     count: Number.isFinite(count) && count >= 0 ? count : 0, \
                     time: text(3), \
                     quality: (cols[1] && cols[1].className) || null, \
                 }}; \
             }}); }})()",
            row = js_str(ROW_SELECTOR),
            cell = js_str(ROW_CELL_SELECTOR),
        );
        self.eval(script).await
    }

    async fn wait_for(&self, selector: &str, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            if self.exists(selector).await {
                return true;
            }
            if start.elapsed() >= timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn wait_for_change(&self, selector: &str, before: &str, timeout: Duration) -> bool {
        let start = Instant::now();
        loop {
            match self.inner_html(selector).await {
                Ok(Some(html)) if html != before => return true,
                // Absent container counts as unchanged; keep polling.
                _ => {}
            }
            if start.elapsed() >= timeout {
                return false;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }

    async fn settle(&self, delay: Duration) {
        tokio::time::sleep(delay).await;
    }

    async fn close(self) {
        let _ = self.page.close().await;
    }
}

#[async_trait]
impl ViewFactory for BrowserSession {
    type View = CdpView;

    async fn open(&self, url: &str) -> Result<CdpView> {
        let page = self.open_page(url).await?;
        Ok(CdpView::new(page))
    }
}

use std::path::Path;
use std::time::Duration;

// ---------------------------------------------------------------------------
// HarvestConfig — file-based config loader (gacha-harvest.json) with env-var
// fallback for every knob.
// ---------------------------------------------------------------------------

/// Top-level config loaded from `gacha-harvest.json`.
///
/// Every field is optional; unset fields fall back to an env var and then to
/// a built-in default. The timing knobs are empirically tuned against the
/// live record UI, so they are deliberately exposed rather than hard-coded.
#[derive(serde::Deserialize, Default, Clone, Debug)]
pub struct HarvestConfig {
    /// Rows per table page as rendered by the record UI. The "last page"
    /// shortfall heuristic depends on this; revisit if the UI changes.
    pub page_size: Option<usize>,
    /// Delay after selecting a draw type, while the table re-renders.
    pub settle_delay_ms: Option<u64>,
    /// Grace timeout for the post-click "did the table actually change"
    /// wait. On expiry the scraper assumes the page advanced.
    pub mutation_wait_ms: Option<u64>,
    /// Short pause after each page advance.
    pub advance_pause_ms: Option<u64>,
    /// Timeout when waiting for dropdown option labels to appear.
    pub option_wait_ms: Option<u64>,
    /// Output file for the final record map.
    pub output_path: Option<String>,
    /// Run the browser headless. Defaults to `true`.
    pub headless: Option<bool>,
}

impl HarvestConfig {
    /// Page size: JSON field → `GACHA_HARVEST_PAGE_SIZE` env var → 5.
    pub fn resolve_page_size(&self) -> usize {
        if let Some(n) = self.page_size {
            return n;
        }
        std::env::var("GACHA_HARVEST_PAGE_SIZE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5)
    }

    /// Settle delay: JSON field → `GACHA_HARVEST_SETTLE_DELAY_MS` → 1600 ms.
    pub fn resolve_settle_delay_ms(&self) -> u64 {
        if let Some(n) = self.settle_delay_ms {
            return n;
        }
        std::env::var("GACHA_HARVEST_SETTLE_DELAY_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(1600)
    }

    /// Mutation wait: JSON field → `GACHA_HARVEST_MUTATION_WAIT_MS` → 5000 ms.
    pub fn resolve_mutation_wait_ms(&self) -> u64 {
        if let Some(n) = self.mutation_wait_ms {
            return n;
        }
        std::env::var("GACHA_HARVEST_MUTATION_WAIT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(5000)
    }

    /// Advance pause: JSON field → `GACHA_HARVEST_ADVANCE_PAUSE_MS` → 10 ms.
    pub fn resolve_advance_pause_ms(&self) -> u64 {
        if let Some(n) = self.advance_pause_ms {
            return n;
        }
        std::env::var("GACHA_HARVEST_ADVANCE_PAUSE_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10)
    }

    /// Option wait: JSON field → `GACHA_HARVEST_OPTION_WAIT_MS` → 10000 ms.
    pub fn resolve_option_wait_ms(&self) -> u64 {
        if let Some(n) = self.option_wait_ms {
            return n;
        }
        std::env::var("GACHA_HARVEST_OPTION_WAIT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(10_000)
    }

    /// Output path: JSON field → `GACHA_HARVEST_OUTPUT` → `gacha_records.json`.
    pub fn resolve_output_path(&self) -> std::path::PathBuf {
        if let Some(p) = &self.output_path {
            if !p.trim().is_empty() {
                return p.into();
            }
        }
        std::env::var("GACHA_HARVEST_OUTPUT")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "gacha_records.json".to_string())
            .into()
    }

    /// Headless mode: JSON field → `GACHA_HARVEST_HEADLESS` (set to "0" to
    /// watch the browser) → `true`.
    pub fn resolve_headless(&self) -> bool {
        if let Some(b) = self.headless {
            return b;
        }
        std::env::var("GACHA_HARVEST_HEADLESS")
            .map(|v| !matches!(v.trim(), "0" | "false" | "no" | "off"))
            .unwrap_or(true)
    }

    /// Bundle the resolved timing/shape knobs for the scrape engines.
    pub fn tuning(&self) -> ScrapeTuning {
        ScrapeTuning {
            page_size: self.resolve_page_size(),
            settle_delay: Duration::from_millis(self.resolve_settle_delay_ms()),
            mutation_wait: Duration::from_millis(self.resolve_mutation_wait_ms()),
            advance_pause: Duration::from_millis(self.resolve_advance_pause_ms()),
            option_wait: Duration::from_millis(self.resolve_option_wait_ms()),
        }
    }
}

/// Resolved timing/shape parameters shared by the scraping engines.
#[derive(Debug, Clone)]
pub struct ScrapeTuning {
    pub page_size: usize,
    pub settle_delay: Duration,
    pub mutation_wait: Duration,
    pub advance_pause: Duration,
    pub option_wait: Duration,
}

impl Default for ScrapeTuning {
    fn default() -> Self {
        HarvestConfig::default().tuning()
    }
}

/// Load `gacha-harvest.json` from standard locations.
///
/// Search order (first found wins):
/// 1. `GACHA_HARVEST_CONFIG` env var path
/// 2. `./gacha-harvest.json` (process cwd)
///
/// Missing file → `HarvestConfig::default()` (silent, all env-var fallbacks
/// apply). Parse error → log a warning, return the defaults.
pub fn load_config() -> HarvestConfig {
    let candidates: Vec<std::path::PathBuf> = {
        let mut v = vec![std::path::PathBuf::from("gacha-harvest.json")];
        if let Ok(env_path) = std::env::var("GACHA_HARVEST_CONFIG") {
            v.insert(0, std::path::PathBuf::from(env_path));
        }
        v
    };

    for path in &candidates {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<HarvestConfig>(&contents) {
                Ok(cfg) => {
                    tracing::info!("gacha-harvest.json loaded from {}", path.display());
                    return cfg;
                }
                Err(e) => {
                    tracing::warn!(
                        "gacha-harvest.json parse error at {}: {} — using defaults",
                        path.display(),
                        e
                    );
                    return HarvestConfig::default();
                }
            },
            Err(_) => continue, // file not found at this path — try next
        }
    }

    HarvestConfig::default()
}

// ---------------------------------------------------------------------------

pub const ENV_CHROME_EXECUTABLE: &str = "CHROME_EXECUTABLE";

/// Optional override for the Chromium-family browser executable.
///
/// Default behavior is **auto-discovery** (see `scraping::browser::find_chrome_executable()`).
/// This function only returns a value when `CHROME_EXECUTABLE` is set to an existing path.
pub fn chrome_executable_override() -> Option<String> {
    let p = std::env::var(ENV_CHROME_EXECUTABLE).ok()?;
    let p = p.trim();
    if p.is_empty() {
        return None;
    }
    if Path::new(p).exists() {
        Some(p.to_string())
    } else {
        None
    }
}

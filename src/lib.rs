pub mod core;
pub mod discovery;
pub mod output;
pub mod scraping;

// --- Primary core exports ---
pub use core::config;
pub use core::types;
pub use core::types::{GachaRecord, GachaRecordMap};

pub use discovery::DiscoveryError;
pub use scraping::orchestrator::ScrapeOrchestrator;
pub use scraping::view::{RecordView, ViewFactory};

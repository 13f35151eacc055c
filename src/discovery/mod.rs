//! Locating the player's gacha record link.
//!
//! The game client writes one JSON payload per interesting log line; the
//! payload for the in-game record viewer carries the authenticated `url` we
//! need. Discovery is: pick the install folder → find `Client.log` under it →
//! scan the whole file for marker lines → recover the JSON → collect URLs.

pub mod json_recovery;
pub mod locate;
pub mod log_scan;

use std::path::PathBuf;
use thiserror::Error;

/// Fatal and user-abort outcomes of link discovery.
///
/// Per-line parse failures are *not* errors: lines that carry the marker but
/// no recoverable JSON are skipped silently inside the scan.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("no folder was chosen")]
    FolderNotChosen,
    #[error("no Client.log found under {}", .0.display())]
    LogNotFound(PathBuf),
    #[error("log rescan aborted by user")]
    Aborted,
    #[error("failed to read log file")]
    Io(#[from] std::io::Error),
}

pub use locate::{choose_folder, discover_gacha_links, find_game_log, GACHA_LINK_MARKER};
pub use log_scan::{scan_log, scan_log_with_retry};

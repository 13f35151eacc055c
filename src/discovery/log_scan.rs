//! One-shot full scan of the client log for gacha record links.
//!
//! The file is read in fixed-size chunks and reassembled into lines through a
//! carry-over buffer, so a line split across two reads is never seen twice or
//! half-parsed. Every completed line containing the marker substring goes
//! through JSON recovery; `url` values are collected deduplicated, first-seen
//! order preserved (the newest link the client wrote tends to be last).

use std::collections::HashSet;
use std::path::Path;

use tokio::io::AsyncReadExt;
use tracing::{debug, warn};

use super::json_recovery::recover_json;
use super::DiscoveryError;

const CHUNK_SIZE: usize = 8192;

/// Reassembles byte chunks into complete text lines.
///
/// Bytes after the last newline of a chunk are carried over into the next
/// `push`. Decoding is lossy per completed line; the client log is UTF-8 in
/// practice and a mangled character in an uninteresting line costs nothing.
#[derive(Default)]
pub struct LineAssembler {
    carry: Vec<u8>,
}

impl LineAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk; returns every line completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.carry.extend_from_slice(chunk);
        let mut lines = Vec::new();
        while let Some(pos) = self.carry.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.carry.drain(..=pos).collect();
            line.pop(); // the newline itself
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            lines.push(String::from_utf8_lossy(&line).into_owned());
        }
        lines
    }

    /// The final, unterminated line (if any) once the stream has ended.
    pub fn finish(self) -> Option<String> {
        if self.carry.is_empty() {
            return None;
        }
        let mut line = self.carry;
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Some(String::from_utf8_lossy(&line).into_owned())
    }
}

/// Scan the whole file at `path` for lines containing `marker` and collect
/// the `url` field of every recoverable JSON payload.
///
/// Returns the URLs deduplicated in first-seen order. Marker lines with no
/// recoverable JSON (or no `url` field) are skipped silently.
pub async fn scan_log(path: &Path, marker: &str) -> Result<Vec<String>, std::io::Error> {
    let mut file = tokio::fs::File::open(path).await?;
    let mut assembler = LineAssembler::new();
    let mut chunk = vec![0u8; CHUNK_SIZE];
    let mut urls: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();

    loop {
        let n = file.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        for line in assembler.push(&chunk[..n]) {
            collect_url(&line, marker, &mut urls, &mut seen);
        }
    }
    // The log rarely ends with a newline while the game is running.
    if let Some(tail) = assembler.finish() {
        collect_url(&tail, marker, &mut urls, &mut seen);
    }

    debug!("log scan found {} distinct link(s)", urls.len());
    Ok(urls)
}

fn collect_url(line: &str, marker: &str, urls: &mut Vec<String>, seen: &mut HashSet<String>) {
    if !line.contains(marker) {
        return;
    }
    let Some(payload) = recover_json(line) else {
        // Marker present but nothing parseable; not an error.
        return;
    };
    if let Some(url) = payload.get("url").and_then(|u| u.as_str()) {
        if !url.is_empty() && seen.insert(url.to_string()) {
            urls.push(url.to_string());
        }
    }
}

/// Scan the log, and when nothing is found let the caller's hook decide
/// whether to rescan.
///
/// The hook runs between attempts; typically it tells the user to open the
/// in-game record screen and waits for a keypress. Returning `false` aborts
/// with [`DiscoveryError::Aborted`]. There is no automatic retry bound; the
/// loop ends only on found links, user abort, or an I/O error.
pub async fn scan_log_with_retry(
    path: &Path,
    marker: &str,
    mut try_again: impl FnMut() -> bool,
) -> Result<Vec<String>, DiscoveryError> {
    loop {
        let urls = scan_log(path, marker).await?;
        if !urls.is_empty() {
            return Ok(urls);
        }
        warn!("no gacha record links in the log yet");
        if !try_again() {
            return Err(DiscoveryError::Aborted);
        }
    }
}

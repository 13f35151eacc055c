//! Folder selection and client-log discovery.

use std::path::{Path, PathBuf};

use tracing::info;

use super::log_scan::scan_log_with_retry;
use super::DiscoveryError;

/// Fixed link prefix the client logs when the player opens the in-game
/// record viewer. Game client updates may move this.
pub const GACHA_LINK_MARKER: &str =
    "https://aki-gm-resources.aki-game.com/aki/gacha/index.html#/record?";

/// The expected log location relative to the install root, `/`-normalized.
pub const LOG_PATH_SUFFIX: &str = "Client/Saved/Logs/Client.log";

const LOG_FILE_NAME: &str = "Client.log";

/// Ask the user for the game install directory. `None` means cancelled.
pub async fn choose_folder() -> Option<PathBuf> {
    let handle = rfd::AsyncFileDialog::new()
        .set_title("Select the Wuthering Waves install directory")
        .pick_folder()
        .await?;
    Some(handle.path().to_path_buf())
}

/// Search `root` recursively for a `Client.log` whose normalized path ends
/// with [`LOG_PATH_SUFFIX`]. First match wins; unreadable directories are
/// skipped.
pub fn find_game_log(root: &Path) -> Option<PathBuf> {
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        let Ok(entries) = std::fs::read_dir(&dir) else {
            continue;
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else if path.file_name().and_then(|n| n.to_str()) == Some(LOG_FILE_NAME) {
                let normalized = path.to_string_lossy().replace('\\', "/");
                if normalized.ends_with(LOG_PATH_SUFFIX) {
                    return Some(path);
                }
            }
        }
    }
    None
}

/// Full link discovery: folder pick → log search → scan with user-driven
/// rescans. Returns at least one candidate URL on success.
///
/// `try_again` runs whenever a scan finds nothing; it should prompt the user
/// to open the in-game record screen and report whether to rescan.
pub async fn discover_gacha_links(
    try_again: impl FnMut() -> bool,
) -> Result<Vec<String>, DiscoveryError> {
    let folder = choose_folder().await.ok_or(DiscoveryError::FolderNotChosen)?;
    info!("searching for {} under {}", LOG_FILE_NAME, folder.display());

    let log_path =
        find_game_log(&folder).ok_or_else(|| DiscoveryError::LogNotFound(folder.clone()))?;
    info!("client log: {}", log_path.display());

    scan_log_with_retry(&log_path, GACHA_LINK_MARKER, try_again).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_game_log_matches_full_suffix() {
        let root = tempfile::tempdir().unwrap();
        let good = root.path().join("Game/Client/Saved/Logs");
        std::fs::create_dir_all(&good).unwrap();
        std::fs::write(good.join("Client.log"), "x").unwrap();

        // Same file name in the wrong place must not match.
        let decoy = root.path().join("Backup/Logs");
        std::fs::create_dir_all(&decoy).unwrap();
        std::fs::write(decoy.join("Client.log"), "x").unwrap();

        let found = find_game_log(root.path()).expect("log should be found");
        let normalized = found.to_string_lossy().replace('\\', "/");
        assert!(normalized.ends_with(LOG_PATH_SUFFIX));
    }

    #[test]
    fn test_find_game_log_none_when_absent() {
        let root = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(root.path().join("empty/tree")).unwrap();
        assert!(find_game_log(root.path()).is_none());
    }
}

use anyhow::anyhow;
use tracing::{info, warn};

use gacha_harvest::core::config;
use gacha_harvest::discovery::{self, DiscoveryError};
use gacha_harvest::output;
use gacha_harvest::scraping::browser::{find_chrome_executable, BrowserSession};
use gacha_harvest::scraping::draw_types::enumerate_draw_types;
use gacha_harvest::scraping::view::{RecordView, ViewFactory};
use gacha_harvest::ScrapeOrchestrator;

/// Between empty log scans: tell the user what to do in-game and block for a
/// keypress. Returns whether to rescan.
///
/// The read is synchronous by nature, so it runs under
/// [`tokio::task::block_in_place`] to keep the worker thread it lands on
/// available to the runtime.
fn confirm_rescan() -> bool {
    println!("No record link in the log yet.");
    println!("Open the Convene History screen in-game, then press Enter to rescan (q to quit).");
    tokio::task::block_in_place(|| read_rescan_decision(&mut std::io::stdin().lock()))
}

/// One line of user input decides the rescan: anything but `q`/`quit` means
/// try again; a closed or failing stream means stop.
fn read_rescan_decision(input: &mut impl std::io::BufRead) -> bool {
    let mut line = String::new();
    match input.read_line(&mut line) {
        Ok(0) => false, // stream closed
        Ok(_) => !matches!(line.trim(), "q" | "quit"),
        Err(_) => false,
    }
}

/// Blocking user notice for fatal discovery errors and run completion.
fn blocking_notice(message: &str) {
    let _ = rfd::MessageDialog::new()
        .set_level(rfd::MessageLevel::Info)
        .set_title("gacha-harvest")
        .set_description(message)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let cfg = config::load_config();
    let tuning = cfg.tuning();

    info!("pick any folder inside the game install directory");
    let links = match discovery::discover_gacha_links(confirm_rescan).await {
        Ok(links) => links,
        Err(e @ (DiscoveryError::FolderNotChosen | DiscoveryError::LogNotFound(_))) => {
            blocking_notice(&e.to_string());
            return Err(e.into());
        }
        Err(e) => return Err(e.into()),
    };
    info!("candidate record links: {:?}", links);

    // The link the client logged most recently is the one whose auth
    // parameters are freshest.
    let base_url = links
        .last()
        .cloned()
        .ok_or_else(|| anyhow!("link discovery returned an empty candidate list"))?;
    info!("opening record page: {}", base_url);

    let exe = find_chrome_executable().ok_or_else(|| {
        anyhow!("No browser found. Install Chrome, Chromium, or Edge. Set CHROME_EXECUTABLE if installed in a non-standard location.")
    })?;
    let session = BrowserSession::launch(&exe, cfg.resolve_headless()).await?;

    let view = session.open(&base_url).await?;
    let types = enumerate_draw_types(&view, &tuning).await?;
    view.close().await;
    info!("draw types: {:?}", types);

    let orchestrator = ScrapeOrchestrator::new(&session, tuning);
    let records = orchestrator.collect_all_types(&base_url, &types).await;

    session.close().await;
    info!("browser closed");

    for (type_name, recs) in &records {
        info!("{}: {} record(s)", type_name, recs.len());
    }
    if records.is_empty() {
        warn!("no records scraped; the account may have no draw history");
    }

    let output_path = cfg.resolve_output_path();
    output::save_records(&records, &output_path).await?;
    info!("saved to {}", output_path.display());
    blocking_notice(&format!(
        "Gacha records saved to {}",
        output_path.display()
    ));

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::read_rescan_decision;
    use std::io::Cursor;

    #[test]
    fn test_enter_means_rescan() {
        assert!(read_rescan_decision(&mut Cursor::new(b"\n")));
        assert!(read_rescan_decision(&mut Cursor::new(b"anything else\n")));
    }

    #[test]
    fn test_quit_words_abort() {
        assert!(!read_rescan_decision(&mut Cursor::new(b"q\n")));
        assert!(!read_rescan_decision(&mut Cursor::new(b"quit\n")));
        assert!(!read_rescan_decision(&mut Cursor::new(b"  q  \n")));
    }

    #[test]
    fn test_closed_stream_aborts() {
        assert!(!read_rescan_decision(&mut Cursor::new(b"")));
    }
}

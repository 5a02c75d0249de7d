use notes_engine::Browser;
use notes_logging::{notes_info, notes_warn};
use url::Url;

/// Headless stand-in for the browser: popups and notices go to the terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleBrowser;

impl Browser for ConsoleBrowser {
    fn open_popup(&self, url: &Url, name: &str, features: &str) {
        notes_info!("Popup {} ({}) requested for {}", name, features, url);
        println!("Open {url} to sign in to Notes AI.");
    }

    fn alert(&self, message: &str) {
        notes_warn!("Notice: {}", message);
        eprintln!("{message}");
    }
}

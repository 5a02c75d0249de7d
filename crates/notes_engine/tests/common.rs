#![allow(dead_code)]

use std::sync::{Arc, Mutex, Once};

use notes_engine::{AuthTransport, Browser, ServiceClient, ServiceSettings};
use url::Url;
use wiremock::MockServer;

pub fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(notes_logging::initialize_for_tests);
}

pub fn client_for(server: &MockServer, transport: Arc<dyn AuthTransport>) -> ServiceClient {
    let settings = ServiceSettings {
        base_url: server.uri(),
        ..ServiceSettings::default()
    };
    ServiceClient::new(settings, transport).expect("service client")
}

#[derive(Default)]
pub struct RecordingBrowser {
    pub popups: Mutex<Vec<(String, String, String)>>,
    pub alerts: Mutex<Vec<String>>,
}

impl Browser for RecordingBrowser {
    fn open_popup(&self, url: &Url, name: &str, features: &str) {
        self.popups
            .lock()
            .unwrap()
            .push((url.to_string(), name.to_string(), features.to_string()));
    }

    fn alert(&self, message: &str) {
        self.alerts.lock().unwrap().push(message.to_string());
    }
}

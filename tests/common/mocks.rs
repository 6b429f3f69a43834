use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use wfs_validate::{Transport, TransportResponse};

/// Canned response for one URL
#[derive(Clone, Debug)]
pub struct MockResponse {
    pub status: u16,
    pub body: Vec<u8>,
    pub fail_network: bool,
}

/// Transport replaying canned responses and logging every request, so tests
/// can assert exactly how many fetches went out.
pub struct MockTransport {
    responses: Mutex<HashMap<String, MockResponse>>,
    request_log: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            request_log: Mutex::new(Vec::new()),
        }
    }

    pub fn add_document(&self, url: &str, body: &[u8]) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            MockResponse {
                status: 200,
                body: body.to_vec(),
                fail_network: false,
            },
        );
    }

    pub fn add_status(&self, url: &str, status: u16) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            MockResponse {
                status,
                body: Vec::new(),
                fail_network: false,
            },
        );
    }

    pub fn add_network_error(&self, url: &str) {
        self.responses.lock().unwrap().insert(
            url.to_string(),
            MockResponse {
                status: 0,
                body: Vec::new(),
                fail_network: true,
            },
        );
    }

    /// Total number of requests issued
    pub fn request_count(&self) -> usize {
        self.request_log.lock().unwrap().len()
    }

    /// Number of requests issued for one URL
    pub fn requests_for(&self, url: &str) -> usize {
        self.request_log
            .lock()
            .unwrap()
            .iter()
            .filter(|logged| logged.as_str() == url)
            .count()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str) -> Result<TransportResponse, String> {
        self.request_log.lock().unwrap().push(url.to_string());

        let response = self.responses.lock().unwrap().get(url).cloned();
        match response {
            None => Err(format!("no route to host: {url}")),
            Some(r) if r.fail_network => Err("connection refused".to_string()),
            Some(r) => Ok(TransportResponse {
                status: r.status,
                body: r.body,
            }),
        }
    }
}

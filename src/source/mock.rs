use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use super::{DocumentSource, FetchError};

/// Scripted source keyed by target url; unknown urls time out.
#[derive(Debug, Default)]
pub struct MockSource {
    responses: Mutex<HashMap<String, Result<Bytes, FetchError>>>,
    calls: Mutex<Vec<String>>,
}

impl MockSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, resp: Result<Bytes, FetchError>) {
        self.responses.lock().unwrap().insert(url.to_string(), resp);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl DocumentSource for MockSource {
    async fn fetch_all_docs(&self, url: &str, _timeout: Duration) -> Result<Bytes, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .remove(url)
            .unwrap_or(Err(FetchError::Timeout))
    }
}

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{ObjectStore, PutAck, PutRequest, StoreError};

/// Records every put; answers from a queue, acking with a fake ETag once empty.
#[derive(Debug, Default)]
pub struct MockStore {
    responses: Mutex<VecDeque<Result<PutAck, StoreError>>>,
    calls: Mutex<Vec<PutRequest>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_response(&self, resp: Result<PutAck, StoreError>) {
        self.responses.lock().unwrap().push_back(resp);
    }

    pub fn calls(&self) -> Vec<PutRequest> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn put_object(&self, req: PutRequest) -> Result<PutAck, StoreError> {
        let n = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(req);
            calls.len()
        };
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(PutAck { etag: Some(format!("\"etag-{n}\"")) }))
    }
}

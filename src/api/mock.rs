//! In-memory transport for controller tests

use super::transport::{ApiRequest, RawResponse, Transport, TransportError};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

type Handler = Box<dyn Fn(&ApiRequest) -> Result<RawResponse, TransportError> + Send + Sync>;

/// Transport that answers from a handler and records every request
pub struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<ApiRequest>>,
}

#[allow(clippy::unwrap_used)] // Test helper can use unwrap
impl MockTransport {
    pub fn new<F>(handler: F) -> Arc<Self>
    where
        F: Fn(&ApiRequest) -> Result<RawResponse, TransportError> + Send + Sync + 'static,
    {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Answer by `"METHOD /path"` key
    ///
    /// Several entries for the same key are served in order; the last one
    /// keeps answering. Unrouted requests get a 500.
    pub fn with_routes(routes: Vec<(&str, RawResponse)>) -> Arc<Self> {
        let mut table: Vec<(String, VecDeque<RawResponse>)> = Vec::new();
        for (key, response) in routes {
            match table.iter_mut().find(|(k, _)| k == key) {
                Some((_, queue)) => queue.push_back(response),
                None => table.push((key.to_string(), VecDeque::from(vec![response]))),
            }
        }
        let table = Mutex::new(table);

        Self::new(move |req| {
            let key = route_key(req);
            let mut table = table.lock().unwrap();
            match table.iter_mut().find(|(k, _)| *k == key) {
                Some((_, queue)) if queue.len() > 1 => Ok(queue.pop_front().unwrap()),
                Some((_, queue)) => Ok(queue.front().cloned().unwrap()),
                None => Ok(RawResponse::new(500, format!("no route for {}", key))),
            }
        })
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests as `"METHOD /path"` strings
    pub fn calls(&self) -> Vec<String> {
        self.requests().iter().map(route_key).collect()
    }
}

pub fn route_key(req: &ApiRequest) -> String {
    format!("{} {}", req.method, req.path)
}

#[async_trait]
impl Transport for MockTransport {
    #[allow(clippy::unwrap_used)]
    async fn send(&self, request: ApiRequest) -> Result<RawResponse, TransportError> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(&request)
    }
}

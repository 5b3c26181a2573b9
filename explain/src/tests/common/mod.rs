// Common test utilities and helpers

use crate::models::{ExplainRequest, ExplainResponse, Explanation};
use crate::services::ExplainClient;
use crate::utils::ExplainResult;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&ExplainRequest) -> ExplainResult<ExplainResponse> + Send + Sync>;

/// Fake client that records every dispatched request
pub struct RecordingClient {
    requests: Mutex<Vec<ExplainRequest>>,
    responder: Responder,
}

impl RecordingClient {
    /// Answers every request with a matched explanation for the same document
    pub fn matching() -> Arc<Self> {
        Self::with_responder(|request| Ok(matched_response(request)))
    }

    pub fn with_responder<F>(responder: F) -> Arc<Self>
    where
        F: Fn(&ExplainRequest) -> ExplainResult<ExplainResponse> + Send + Sync + 'static,
    {
        Arc::new(Self { requests: Mutex::new(Vec::new()), responder: Box::new(responder) })
    }

    pub fn requests(&self) -> Vec<ExplainRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// The single request this client received
    pub fn only_request(&self) -> ExplainRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one dispatched request");
        requests.into_iter().next().unwrap()
    }
}

#[async_trait]
impl ExplainClient for RecordingClient {
    async fn explain(&self, request: ExplainRequest) -> ExplainResult<ExplainResponse> {
        let outcome = (self.responder)(&request);
        self.requests.lock().unwrap().push(request);
        outcome
    }
}

pub fn matched_response(request: &ExplainRequest) -> ExplainResponse {
    ExplainResponse {
        index: request.get_index().to_string(),
        doc_type: request.get_doc_type().to_string(),
        id: request.get_id().to_string(),
        matched: true,
        explanation: Some(Explanation {
            value: 1.0,
            description: "ConstantScore(*:*), product of:".to_string(),
            details: vec![],
        }),
    }
}

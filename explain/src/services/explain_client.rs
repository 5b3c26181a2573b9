use crate::config::ClusterConfig;
use crate::models::{ExplainRequest, ExplainResponse};
use crate::services::ExplainRequestBuilder;
use crate::utils::{ExplainError, ExplainResult};
use async_trait::async_trait;
use reqwest::{Client, StatusCode, header};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// Capability that carries an explain request to the search service
///
/// Implementations own everything past the request value: routing
/// resolution, wire format, retries and timeouts. The returned future
/// resolves exactly once, with a response or a failure.
#[async_trait]
pub trait ExplainClient: Send + Sync {
    async fn explain(&self, request: ExplainRequest) -> ExplainResult<ExplainResponse>;
}

/// HTTP client for a search cluster's `_explain` endpoint
pub struct SearchClient {
    pub http_client: Client,
    pub cluster: ClusterConfig,
}

impl SearchClient {
    pub fn new(cluster: ClusterConfig) -> Self {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(cluster.timeout_secs))
            .build()
            .unwrap_or_default();

        Self { http_client, cluster }
    }

    pub fn get_base_url(&self) -> &str {
        self.cluster.url.trim_end_matches('/')
    }

    /// Start an explain request for one document, bound to this client
    pub fn prepare_explain(
        self: &Arc<Self>,
        index: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
    ) -> ExplainRequestBuilder {
        ExplainRequestBuilder::with_document(Arc::clone(self) as Arc<dyn ExplainClient>, index, doc_type, id)
    }

    fn explain_url(&self, request: &ExplainRequest) -> String {
        format!(
            "{}/{}/{}/{}/_explain",
            self.get_base_url(),
            urlencoding::encode(request.get_index()),
            urlencoding::encode(request.get_doc_type()),
            urlencoding::encode(request.get_id())
        )
    }

    fn query_params(request: &ExplainRequest) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(routing) = request.get_routing() {
            params.push(("routing", routing.to_string()));
        }
        if let Some(preference) = request.get_preference() {
            params.push(("preference", preference.to_string()));
        }
        params
    }

    fn error_reason(body: &str) -> String {
        match serde_json::from_str::<Value>(body) {
            Ok(json) => match json.get("error") {
                Some(Value::String(reason)) => reason.clone(),
                Some(error) => error
                    .get("reason")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| error.to_string()),
                None => body.to_string(),
            },
            Err(_) => body.to_string(),
        }
    }
}

#[async_trait]
impl ExplainClient for SearchClient {
    async fn explain(&self, request: ExplainRequest) -> ExplainResult<ExplainResponse> {
        let url = self.explain_url(&request);
        tracing::debug!(
            "Explaining [{}][{}][{}] via {} (operation_threaded={})",
            request.get_index(),
            request.get_doc_type(),
            request.get_id(),
            url,
            request.is_operation_threaded()
        );

        let mut builder = match request.source_bytes() {
            Some(source) => self
                .http_client
                .post(&url)
                .header(header::CONTENT_TYPE, "application/json")
                .body(source.clone()),
            None => self.http_client.get(&url),
        };

        let params = Self::query_params(&request);
        if !params.is_empty() {
            builder = builder.query(&params);
        }

        if let Some(username) = &self.cluster.username {
            builder = builder.basic_auth(username, self.cluster.password.as_ref());
        }

        let response = builder.send().await.map_err(|e| {
            tracing::error!("Explain request to {} failed: {}", url, e);
            ExplainError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::NOT_FOUND => {
                    tracing::warn!(
                        "Document [{}][{}][{}] not found",
                        request.get_index(),
                        request.get_doc_type(),
                        request.get_id()
                    );
                    ExplainError::document_not_found(
                        request.get_index(),
                        request.get_doc_type(),
                        request.get_id(),
                    )
                },
                StatusCode::BAD_REQUEST => {
                    ExplainError::invalid_request(Self::error_reason(&body))
                },
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ExplainError::AuthFailed,
                _ => {
                    tracing::error!("Explain failed with status {}: {}", status, body);
                    ExplainError::service_error(status.as_u16(), Self::error_reason(&body))
                },
            });
        }

        let explain_response: ExplainResponse = response.json().await.map_err(|e| {
            ExplainError::invalid_response(format!("Failed to parse response: {}", e))
        })?;

        tracing::info!(
            "Explained [{}][{}][{}]: matched={}",
            explain_response.index,
            explain_response.doc_type,
            explain_response.id,
            explain_response.matched
        );
        Ok(explain_response)
    }
}

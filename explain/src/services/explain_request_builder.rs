//! Explain Request Builder
//!
//! Fluent construction of an [`ExplainRequest`] and its dispatch through an
//! [`ExplainClient`].
//!
//! # Query payload precedence
//! The payload can come from a structured query (`set_query`) or from raw
//! bytes (`set_source`). A structured query, once set, always wins: it is
//! serialized into the request when the builder executes, replacing raw
//! bytes no matter which setter was called last.

use crate::models::{ExplainRequest, ExplainResponse};
use crate::query::{ExplainSourceBuilder, QueryBuilder};
use crate::services::ExplainClient;
use crate::utils::ExplainResult;
use bytes::Bytes;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Builder for a single explain call
///
/// Setters consume and return the builder; `execute` consumes it for good,
/// so a dispatched request can no longer be changed.
pub struct ExplainRequestBuilder {
    client: Arc<dyn ExplainClient>,
    request: ExplainRequest,
    source_builder: Option<ExplainSourceBuilder>,
}

impl ExplainRequestBuilder {
    pub fn new(client: Arc<dyn ExplainClient>) -> Self {
        Self { client, request: ExplainRequest::new(), source_builder: None }
    }

    pub fn with_document(
        client: Arc<dyn ExplainClient>,
        index: impl Into<String>,
        doc_type: impl Into<String>,
        id: impl Into<String>,
    ) -> Self {
        let mut builder = Self::new(client);
        builder.request.index(index).doc_type(doc_type).id(id);
        builder
    }

    /// Sets the index to get a score explanation for
    pub fn set_index(mut self, index: impl Into<String>) -> Self {
        self.request.index(index);
        self
    }

    /// Sets the type to get a score explanation for
    pub fn set_type(mut self, doc_type: impl Into<String>) -> Self {
        self.request.doc_type(doc_type);
        self
    }

    /// Sets the id to get a score explanation for
    pub fn set_id(mut self, id: impl Into<String>) -> Self {
        self.request.id(id);
        self
    }

    /// Sets the routing for sharding
    pub fn set_routing(mut self, routing: impl Into<String>) -> Self {
        self.request.routing(routing);
        self
    }

    /// The parent is only used to reach the right shard
    pub fn set_parent(mut self, parent: impl Into<String>) -> Self {
        self.request.parent(parent);
        self
    }

    /// Sets the shard preference, e.g. `_local` or `_primary`
    pub fn set_preference(mut self, preference: impl Into<String>) -> Self {
        self.request.preference(preference);
        self
    }

    /// Sets the query to get a score explanation for
    pub fn set_query(mut self, query: impl Into<QueryBuilder>) -> Self {
        self.source_builder.get_or_insert_with(ExplainSourceBuilder::new).query(query);
        self
    }

    /// Sets a pre-serialized explain body.
    ///
    /// Ignored at execution if a query was set through `set_query`.
    pub fn set_source(mut self, source: impl Into<Bytes>, unsafe_reuse: bool) -> Self {
        self.request.source_raw(source.into(), unsafe_reuse);
        self
    }

    /// Sets whether the explain should run on a separate thread when executed locally
    pub fn operation_threaded(mut self, threaded: bool) -> Self {
        self.request.operation_threaded(threaded);
        self
    }

    pub fn request(&self) -> &ExplainRequest {
        &self.request
    }

    /// Finalize without dispatching
    pub fn into_request(self) -> ExplainResult<ExplainRequest> {
        let Self { mut request, source_builder, .. } = self;
        if let Some(source_builder) = source_builder {
            request.source_structured(source_builder.build_as_bytes()?);
        }
        Ok(request)
    }

    pub async fn execute(self) -> ExplainResult<ExplainResponse> {
        let client = Arc::clone(&self.client);
        let request = self.into_request().inspect_err(|e| {
            tracing::warn!("Failed to finalize explain request: {}", e);
        })?;

        tracing::debug!(
            "Dispatching explain for [{}][{}][{}]",
            request.get_index(),
            request.get_doc_type(),
            request.get_id()
        );
        client.explain(request).await
    }

    /// Execute in the background and hand the outcome to `listener`.
    ///
    /// The listener runs exactly once. Must be called within a Tokio runtime.
    pub fn execute_with<F>(self, listener: F) -> JoinHandle<()>
    where
        F: FnOnce(ExplainResult<ExplainResponse>) + Send + 'static,
    {
        tokio::spawn(async move {
            listener(self.execute().await);
        })
    }
}

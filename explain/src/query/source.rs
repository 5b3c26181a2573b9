use bytes::Bytes;
use serde::Serialize;

use super::QueryBuilder;
use crate::utils::ExplainResult;

/// Body of an explain call, accumulated before serialization
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExplainSourceBuilder {
    #[serde(skip_serializing_if = "Option::is_none")]
    query: Option<QueryBuilder>,
}

impl ExplainSourceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previously set query clause
    pub fn query(&mut self, query: impl Into<QueryBuilder>) -> &mut Self {
        self.query = Some(query.into());
        self
    }

    pub fn get_query(&self) -> Option<&QueryBuilder> {
        self.query.as_ref()
    }

    pub fn build_as_bytes(&self) -> ExplainResult<Bytes> {
        let body = serde_json::to_vec(self)?;
        Ok(Bytes::from(body))
    }
}

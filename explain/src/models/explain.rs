use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Query payload carried by an [`ExplainRequest`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuerySource {
    /// Serialized form of a structured explain source
    Structured(Bytes),
    /// Pre-serialized bytes supplied by the caller
    Raw(Bytes),
}

impl QuerySource {
    pub fn as_bytes(&self) -> &Bytes {
        match self {
            Self::Structured(bytes) | Self::Raw(bytes) => bytes,
        }
    }

    pub fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }
}

/// Explain a single document against a query
///
/// Plain value: every mutator overwrites its field and returns the request
/// for chaining. Nothing here validates or resolves addressing; routing
/// and preference travel to the transport exactly as set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplainRequest {
    index: String,
    doc_type: String,
    id: String,
    routing: Option<String>,
    preference: Option<String>,
    source: Option<QuerySource>,
    source_unsafe: bool,
    operation_threaded: bool,
}

impl ExplainRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&mut self, index: impl Into<String>) -> &mut Self {
        self.index = index.into();
        self
    }

    pub fn doc_type(&mut self, doc_type: impl Into<String>) -> &mut Self {
        self.doc_type = doc_type.into();
        self
    }

    pub fn id(&mut self, id: impl Into<String>) -> &mut Self {
        self.id = id.into();
        self
    }

    pub fn routing(&mut self, routing: impl Into<String>) -> &mut Self {
        self.routing = Some(routing.into());
        self
    }

    /// Simply sets the routing, since the parent is only used to get to the right shard.
    pub fn parent(&mut self, parent: impl Into<String>) -> &mut Self {
        self.routing = Some(parent.into());
        self
    }

    pub fn preference(&mut self, preference: impl Into<String>) -> &mut Self {
        self.preference = Some(preference.into());
        self
    }

    /// Replace the query payload with caller-supplied bytes.
    ///
    /// With `unsafe_reuse` the shared buffer is kept as is; otherwise the
    /// bytes are copied into a buffer owned by this request.
    pub fn source_raw(&mut self, source: Bytes, unsafe_reuse: bool) -> &mut Self {
        let bytes = if unsafe_reuse { source } else { Bytes::copy_from_slice(&source) };
        self.source = Some(QuerySource::Raw(bytes));
        self.source_unsafe = unsafe_reuse;
        self
    }

    /// Replace the query payload with a serialized explain source.
    pub fn source_structured(&mut self, source: Bytes) -> &mut Self {
        self.source = Some(QuerySource::Structured(source));
        self.source_unsafe = false;
        self
    }

    pub fn operation_threaded(&mut self, threaded: bool) -> &mut Self {
        self.operation_threaded = threaded;
        self
    }

    pub fn get_index(&self) -> &str {
        &self.index
    }

    pub fn get_doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn get_id(&self) -> &str {
        &self.id
    }

    pub fn get_routing(&self) -> Option<&str> {
        self.routing.as_deref()
    }

    pub fn get_preference(&self) -> Option<&str> {
        self.preference.as_deref()
    }

    pub fn get_source(&self) -> Option<&QuerySource> {
        self.source.as_ref()
    }

    pub fn source_bytes(&self) -> Option<&Bytes> {
        self.source.as_ref().map(QuerySource::as_bytes)
    }

    pub fn is_source_unsafe(&self) -> bool {
        self.source_unsafe
    }

    pub fn is_operation_threaded(&self) -> bool {
        self.operation_threaded
    }
}

/// Score explanation tree returned by the search service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub value: f32,
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<Explanation>,
}

impl Explanation {
    pub fn is_match(&self) -> bool {
        self.value > 0.0
    }

    /// Render as an indented tree, one node per line
    pub fn to_tree_string(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, depth: usize) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&format!("{} = {}\n", self.value, self.description));
        for detail in &self.details {
            detail.write_tree(out, depth + 1);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplainResponse {
    #[serde(rename = "_index")]
    pub index: String,
    #[serde(rename = "_type", default)]
    pub doc_type: String,
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(default)]
    pub matched: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::BytesMut;

    #[test]
    fn test_setters_overwrite() {
        let mut request = ExplainRequest::new();
        request.index("a").index("b").routing("r1").routing("r2").operation_threaded(true);

        assert_eq!(request.get_index(), "b");
        assert_eq!(request.get_routing(), Some("r2"));
        assert!(request.is_operation_threaded());
        assert!(request.get_source().is_none());
    }

    #[test]
    fn test_parent_and_routing_share_one_slot() {
        let mut request = ExplainRequest::new();
        request.parent("p1");
        assert_eq!(request.get_routing(), Some("p1"));

        request.routing("r1");
        assert_eq!(request.get_routing(), Some("r1"));

        request.parent("p2");
        assert_eq!(request.get_routing(), Some("p2"));
    }

    #[test]
    fn test_source_raw_copies_unless_unsafe() {
        let shared = Bytes::from_static(br#"{"query":{"match_all":{}}}"#);

        let mut request = ExplainRequest::new();
        request.source_raw(shared.clone(), false);
        assert_ne!(request.source_bytes().unwrap().as_ptr(), shared.as_ptr());
        assert_eq!(request.source_bytes().unwrap(), &shared);
        assert!(!request.is_source_unsafe());

        request.source_raw(shared.clone(), true);
        assert_eq!(request.source_bytes().unwrap().as_ptr(), shared.as_ptr());
        assert!(request.is_source_unsafe());
    }

    #[test]
    fn test_copied_source_survives_buffer_reuse() {
        let mut buffer = BytesMut::from(&br#"{"query":{"term":{"user":"kimchy"}}}"#[..]);

        let mut request = ExplainRequest::new();
        request.source_raw(Bytes::copy_from_slice(&buffer), false);
        buffer.clear();
        buffer.extend_from_slice(b"garbage");

        assert_eq!(
            request.source_bytes().unwrap().as_ref(),
            br#"{"query":{"term":{"user":"kimchy"}}}"#
        );
    }

    #[test]
    fn test_last_source_wins_either_way() {
        let mut request = ExplainRequest::new();
        request.source_raw(Bytes::from_static(b"raw"), true);
        request.source_structured(Bytes::from_static(b"structured"));
        assert_eq!(request.get_source(), Some(&QuerySource::Structured(Bytes::from_static(b"structured"))));
        assert!(!request.is_source_unsafe());

        request.source_raw(Bytes::from_static(b"raw again"), false);
        assert!(!request.get_source().unwrap().is_structured());
    }

    #[test]
    fn test_response_deserialize() {
        let body = r#"{
            "ok": true,
            "_index": "twitter",
            "_type": "tweet",
            "_id": "1",
            "matched": true,
            "explanation": {
                "value": 0.5,
                "description": "weight(user:kimchy), product of:",
                "details": [
                    {"value": 1.0, "description": "queryWeight"},
                    {"value": 0.5, "description": "fieldWeight"}
                ]
            }
        }"#;

        let response: ExplainResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.index, "twitter");
        assert_eq!(response.doc_type, "tweet");
        assert!(response.matched);

        let explanation = response.explanation.unwrap();
        assert!(explanation.is_match());
        assert_eq!(explanation.details.len(), 2);
        assert_eq!(
            explanation.to_tree_string(),
            "0.5 = weight(user:kimchy), product of:\n  1 = queryWeight\n  0.5 = fieldWeight\n"
        );
    }

    #[test]
    fn test_response_without_type() {
        let body = r#"{"_index":"twitter","_id":"1","matched":true}"#;
        let response: ExplainResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.doc_type, "");
        assert!(response.matched);
    }

    #[test]
    fn test_unmatched_response_without_explanation() {
        let body = r#"{"_index":"twitter","_type":"tweet","_id":"2","matched":false}"#;
        let response: ExplainResponse = serde_json::from_str(body).unwrap();
        assert!(!response.matched);
        assert!(response.explanation.is_none());
    }
}

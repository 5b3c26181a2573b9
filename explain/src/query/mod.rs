//! Query DSL
//!
//! A small typed tree for the search service's JSON query language, plus the
//! [`ExplainSourceBuilder`] that wraps one query into an explain body.
//!
//! ```text
//! bool_query()
//!     .must(term_query("user", "kimchy"))
//!     .filter(range_query("age").gte(18))
//!
//! => {"bool":{"must":[{"term":{"user":"kimchy"}}],"filter":[{"range":{"age":{"gte":18.0}}}]}}
//! ```

mod source;

use serde::ser::{Error as _, SerializeMap};
use serde::{Serialize, Serializer};
use serde_json::Value;

pub use source::ExplainSourceBuilder;

#[derive(Debug, Clone, PartialEq)]
pub enum QueryBuilder {
    MatchAll,
    Term { field: String, value: Value },
    Match { field: String, text: String },
    QueryString { query: String, default_field: Option<String> },
    Ids { values: Vec<String> },
    Range(RangeQuery),
    Bool(BoolQuery),
    /// Pre-built JSON, passed through untouched
    Raw(Value),
}

pub fn match_all_query() -> QueryBuilder {
    QueryBuilder::MatchAll
}

pub fn term_query(field: impl Into<String>, value: impl Into<Value>) -> QueryBuilder {
    QueryBuilder::Term { field: field.into(), value: value.into() }
}

pub fn match_query(field: impl Into<String>, text: impl Into<String>) -> QueryBuilder {
    QueryBuilder::Match { field: field.into(), text: text.into() }
}

pub fn query_string_query(query: impl Into<String>) -> QueryBuilder {
    QueryBuilder::QueryString { query: query.into(), default_field: None }
}

pub fn ids_query<I, S>(values: I) -> QueryBuilder
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    QueryBuilder::Ids { values: values.into_iter().map(Into::into).collect() }
}

pub fn range_query(field: impl Into<String>) -> RangeQuery {
    RangeQuery { field: field.into(), ..Default::default() }
}

pub fn bool_query() -> BoolQuery {
    BoolQuery::default()
}

pub fn raw_query(value: Value) -> QueryBuilder {
    QueryBuilder::Raw(value)
}

impl QueryBuilder {
    /// Set the default field of a `query_string` query; other variants are returned unchanged
    pub fn default_field(self, field: impl Into<String>) -> Self {
        match self {
            Self::QueryString { query, .. } => {
                Self::QueryString { query, default_field: Some(field.into()) }
            },
            other => other,
        }
    }
}

/// Numeric bounds must be finite; they are rejected when serialized otherwise.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeBound {
    Number(f64),
    Text(String),
}

impl From<f64> for RangeBound {
    fn from(v: f64) -> Self {
        Self::Number(v)
    }
}

impl From<i64> for RangeBound {
    fn from(v: i64) -> Self {
        Self::Number(v as f64)
    }
}

impl From<i32> for RangeBound {
    fn from(v: i32) -> Self {
        Self::Number(v as f64)
    }
}

impl From<&str> for RangeBound {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for RangeBound {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl Serialize for RangeBound {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Number(n) if !n.is_finite() => {
                Err(S::Error::custom(format!("range bound must be finite, got {}", n)))
            },
            Self::Number(n) => serializer.serialize_f64(*n),
            Self::Text(s) => serializer.serialize_str(s),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RangeQuery {
    field: String,
    gt: Option<RangeBound>,
    gte: Option<RangeBound>,
    lt: Option<RangeBound>,
    lte: Option<RangeBound>,
}

impl RangeQuery {
    pub fn gt(mut self, bound: impl Into<RangeBound>) -> Self {
        self.gt = Some(bound.into());
        self
    }

    pub fn gte(mut self, bound: impl Into<RangeBound>) -> Self {
        self.gte = Some(bound.into());
        self
    }

    pub fn lt(mut self, bound: impl Into<RangeBound>) -> Self {
        self.lt = Some(bound.into());
        self
    }

    pub fn lte(mut self, bound: impl Into<RangeBound>) -> Self {
        self.lte = Some(bound.into());
        self
    }
}

impl From<RangeQuery> for QueryBuilder {
    fn from(range: RangeQuery) -> Self {
        Self::Range(range)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    must: Vec<QueryBuilder>,
    should: Vec<QueryBuilder>,
    must_not: Vec<QueryBuilder>,
    filter: Vec<QueryBuilder>,
}

impl BoolQuery {
    pub fn must(mut self, query: impl Into<QueryBuilder>) -> Self {
        self.must.push(query.into());
        self
    }

    pub fn should(mut self, query: impl Into<QueryBuilder>) -> Self {
        self.should.push(query.into());
        self
    }

    pub fn must_not(mut self, query: impl Into<QueryBuilder>) -> Self {
        self.must_not.push(query.into());
        self
    }

    pub fn filter(mut self, query: impl Into<QueryBuilder>) -> Self {
        self.filter.push(query.into());
        self
    }

    pub fn has_clauses(&self) -> bool {
        !(self.must.is_empty()
            && self.should.is_empty()
            && self.must_not.is_empty()
            && self.filter.is_empty())
    }
}

impl From<BoolQuery> for QueryBuilder {
    fn from(query: BoolQuery) -> Self {
        Self::Bool(query)
    }
}

// {"key": value} with a single entry
struct Entry<'a, V: ?Sized>(&'a str, &'a V);

impl<V: Serialize + ?Sized> Serialize for Entry<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, self.1)?;
        map.end()
    }
}

struct RangeBody<'a>(&'a RangeQuery);

impl Serialize for RangeBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let range = self.0;
        let bounds = [("gt", &range.gt), ("gte", &range.gte), ("lt", &range.lt), ("lte", &range.lte)];
        let mut map = serializer.serialize_map(None)?;
        for (name, bound) in bounds {
            if let Some(bound) = bound {
                map.serialize_entry(name, bound)?;
            }
        }
        map.end()
    }
}

struct QueryStringBody<'a>(&'a str, Option<&'a str>);

impl Serialize for QueryStringBody<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("query", self.0)?;
        if let Some(field) = self.1 {
            map.serialize_entry("default_field", field)?;
        }
        map.end()
    }
}

impl Serialize for BoolQuery {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let clauses = [
            ("must", &self.must),
            ("should", &self.should),
            ("must_not", &self.must_not),
            ("filter", &self.filter),
        ];
        let mut map = serializer.serialize_map(None)?;
        for (name, queries) in clauses {
            if !queries.is_empty() {
                map.serialize_entry(name, queries)?;
            }
        }
        map.end()
    }
}

impl Serialize for QueryBuilder {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::MatchAll => {
                Entry("match_all", &serde_json::Map::new()).serialize(serializer)
            },
            Self::Term { field, value } => {
                Entry("term", &Entry(field, value)).serialize(serializer)
            },
            Self::Match { field, text } => {
                Entry("match", &Entry(field, text)).serialize(serializer)
            },
            Self::QueryString { query, default_field } => Entry(
                "query_string",
                &QueryStringBody(query, default_field.as_deref()),
            )
            .serialize(serializer),
            Self::Ids { values } => {
                Entry("ids", &Entry("values", values)).serialize(serializer)
            },
            Self::Range(range) => {
                Entry("range", &Entry(&range.field, &RangeBody(range))).serialize(serializer)
            },
            Self::Bool(query) => Entry("bool", query).serialize(serializer),
            Self::Raw(value) => value.serialize(serializer),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn to_json(query: &QueryBuilder) -> Value {
        serde_json::to_value(query).unwrap()
    }

    #[test]
    fn test_leaf_queries() {
        assert_eq!(to_json(&match_all_query()), json!({"match_all": {}}));
        assert_eq!(to_json(&term_query("user", "kimchy")), json!({"term": {"user": "kimchy"}}));
        assert_eq!(to_json(&term_query("age", 42)), json!({"term": {"age": 42}}));
        assert_eq!(
            to_json(&match_query("message", "quick fox")),
            json!({"match": {"message": "quick fox"}})
        );
        assert_eq!(to_json(&ids_query(["1", "4"])), json!({"ids": {"values": ["1", "4"]}}));
    }

    #[test]
    fn test_query_string_default_field() {
        let query = query_string_query("user:kimchy AND tweet").default_field("message");
        assert_eq!(
            to_json(&query),
            json!({"query_string": {"query": "user:kimchy AND tweet", "default_field": "message"}})
        );
        // Only query_string carries a default field
        assert_eq!(match_all_query().default_field("message"), match_all_query());
    }

    #[test]
    fn test_range_query_skips_unset_bounds() {
        let query: QueryBuilder = range_query("age").gte(18).lt("now").into();
        assert_eq!(to_json(&query), json!({"range": {"age": {"gte": 18.0, "lt": "now"}}}));
    }

    #[test]
    fn test_non_finite_range_bound_fails() {
        let query: QueryBuilder = range_query("score").gt(f64::NAN).into();
        let err = serde_json::to_vec(&query).unwrap_err();
        assert!(err.to_string().contains("range bound must be finite"));
    }

    #[test]
    fn test_bool_query_nesting() {
        let query: QueryBuilder = bool_query()
            .must(term_query("user", "kimchy"))
            .must_not(bool_query().should(match_all_query()))
            .into();

        assert_eq!(
            to_json(&query),
            json!({
                "bool": {
                    "must": [{"term": {"user": "kimchy"}}],
                    "must_not": [{"bool": {"should": [{"match_all": {}}]}}]
                }
            })
        );
        assert!(!bool_query().has_clauses());
    }

    #[test]
    fn test_raw_query_passthrough() {
        let raw = json!({"constant_score": {"filter": {"term": {"user": "kimchy"}}}});
        assert_eq!(to_json(&raw_query(raw.clone())), raw);
    }
}

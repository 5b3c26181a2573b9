//! Single-document score explanation against a search index.
//!
//! Build an [`ExplainRequest`] with [`ExplainRequestBuilder`], either from a
//! structured [`QueryBuilder`] or from pre-serialized bytes, and dispatch it
//! through an [`ExplainClient`] such as the HTTP [`SearchClient`].

pub mod config;
pub mod models;
pub mod query;
pub mod services;
pub mod utils;

pub use config::Config;
pub use models::{ExplainRequest, ExplainResponse, Explanation, QuerySource};
pub use query::{ExplainSourceBuilder, QueryBuilder};
pub use services::{ExplainClient, ExplainRequestBuilder, SearchClient};
pub use utils::{ExplainError, ExplainResult};

#[cfg(test)]
mod tests;

pub mod explain_client;
pub mod explain_request_builder;

pub use explain_client::{ExplainClient, SearchClient};
pub use explain_request_builder::ExplainRequestBuilder;

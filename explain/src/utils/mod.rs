pub mod error;
pub mod logging;

pub use error::{ExplainError, ExplainErrorResponse, ExplainResult};
pub use logging::init_logging;

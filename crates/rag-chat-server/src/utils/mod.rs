pub mod error;
pub mod limiters;
pub mod logger;
pub mod token_estimator;

pub use error::{ApiError, ChatError};
pub use limiters::Limiters;

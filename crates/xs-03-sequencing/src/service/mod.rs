//! Service layer for sequencing.

pub mod interceptor;
pub mod logger;

pub use interceptor::SequencingInterceptor;
pub use logger::{ConversationLogger, LoggerStats};

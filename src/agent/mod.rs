pub mod core;
pub mod memory;
pub mod postprocess;
pub mod query;

pub use self::core::{ChatAgent, Reply, ReplySource};
pub use memory::ConversationMemory;
pub use postprocess::{clean_response, FALLBACK_RESPONSE};
pub use query::{QueryKind, GREETING_REPLY};

pub mod client;
pub mod completion;

pub use client::LLMClient;
pub use completion::{CompletionError, CompletionService};

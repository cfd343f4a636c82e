pub mod cache;
pub mod cli;
pub mod config;
pub mod generator;
pub mod index;
pub mod llm;
pub mod logging;
pub mod store;

// Re-export commonly used types
pub use config::Config;
pub use generator::report::Report;
pub use generator::workflow::{PipelineRunner, launch};

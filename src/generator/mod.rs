pub mod context;
pub mod error;
pub mod outlet;
pub mod recovery;
pub mod report;
pub mod stage;
pub mod stages;
pub mod state;
pub mod workflow;

//! CLI library components for the QOF measure pipeline.

pub mod logging;
pub mod pipeline;
pub mod types;

pub mod ai;
pub mod analysis;
pub mod cli;
pub mod config;
pub mod context;
pub mod error;
pub mod parser;
pub mod pipeline;
pub mod probe;
pub mod progress;
pub mod prompt;
pub mod report;
pub mod scanner;
pub mod taxonomy;
pub mod theme;
pub mod tools;

#[cfg(test)]
mod tests;

// Re-export commonly used types
pub use analysis::Verdict;
pub use config::Config;
pub use error::RcaError;
pub use pipeline::{Collaborators, Pipeline, RcaOutcome, RunRequest};
pub use scanner::ScanRequest;
pub use taxonomy::{ErrorCategory, ImpactLevel};

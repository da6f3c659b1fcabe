use crate::ai::AIError;
use crate::report::ReportError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RcaError {
    #[error("Log file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read log file {}: {source}", .path.display())]
    LogRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to get response from model: {0}")]
    AnalysisFailed(#[source] AIError),

    #[error(transparent)]
    Report(#[from] ReportError),
}

impl RcaError {
    pub fn is_user_error(&self) -> bool {
        matches!(self, RcaError::FileNotFound(_))
    }
}

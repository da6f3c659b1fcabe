use crate::context::AdditionalContext;
use crate::parser::DocumentMetadata;
use crate::scanner::ScanMode;
use crate::taxonomy::{ErrorCategory, ImpactLevel};
use crate::tools::SystemContext;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

const PENDING: &str = "To be filled after resolution";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report to {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentParsingSummary {
    pub available: bool,
    #[serde(default)]
    pub metadata: Option<DocumentMetadata>,
    pub error_patterns_found: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LessonsLearned {
    pub root_cause: String,
    pub preventive_measures: String,
    pub improvement_areas: String,
}

impl Default for LessonsLearned {
    fn default() -> Self {
        Self {
            root_cause: PENDING.to_string(),
            preventive_measures: PENDING.to_string(),
            improvement_areas: PENDING.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub timestamp: DateTime<Local>,
    pub error_description: String,
    pub error_type: ErrorCategory,
    pub impact_level: ImpactLevel,
    pub analysis: String,
    #[serde(default)]
    pub model: Option<String>,
    pub scan_mode: ScanMode,
    #[serde(default)]
    pub triage_mode: bool,
    pub system_context: SystemContext,
    #[serde(default)]
    pub additional_context: AdditionalContext,
    pub document_parsing: DocumentParsingSummary,
    #[serde(default)]
    pub lessons_learned: LessonsLearned,
}

pub struct ReportStore {
    directory: PathBuf,
}

impl ReportStore {
    pub fn new(directory: PathBuf) -> Self {
        Self { directory }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn save(&self, report: &AnalysisReport) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(&self.directory).map_err(|source| ReportError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let stem = format!("rca_report_{}", report.timestamp.format("%Y%m%d_%H%M%S"));
        let mut path = self.directory.join(format!("{}.json", stem));
        let mut n = 1;
        while path.exists() {
            path = self.directory.join(format!("{}_{}.json", stem, n));
            n += 1;
        }

        let json = serde_json::to_string_pretty(report)?;
        fs::write(&path, json).map_err(|source| ReportError::Io {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }

    pub fn load(path: &Path) -> Result<AnalysisReport, ReportError> {
        let content = fs::read_to_string(path).map_err(|source| ReportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::TestUtils;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn sample() -> AnalysisReport {
        AnalysisReport {
            timestamp: Local::now(),
            error_description: "SELinux denied access to httpd".to_string(),
            error_type: ErrorCategory::Selinux,
            impact_level: ImpactLevel::High,
            analysis: "## Root Cause Analysis\nWrong \"httpd_sys_content_t\" label.\n".to_string(),
            model: Some("ollama:granite3.3:8b".to_string()),
            scan_mode: ScanMode::Quick,
            triage_mode: false,
            system_context: TestUtils::system_context(),
            additional_context: AdditionalContext {
                error_patterns: TestUtils::patterns(2),
                ..AdditionalContext::default()
            },
            document_parsing: DocumentParsingSummary {
                available: true,
                metadata: None,
                error_patterns_found: 2,
            },
            lessons_learned: LessonsLearned::default(),
        }
    }

    #[test]
    fn test_save_and_load_preserve_verdict_and_analysis() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path().join("reports"));
        let report = sample();

        let path = store.save(&report).unwrap();
        let name = path.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("rca_report_"));
        assert!(name.ends_with(".json"));

        let loaded = ReportStore::load(&path).unwrap();
        assert_eq!(loaded.error_type, report.error_type);
        assert_eq!(loaded.impact_level, report.impact_level);
        assert_eq!(loaded.analysis, report.analysis);
        assert_eq!(loaded, report);
    }

    #[test]
    fn test_same_second_reports_do_not_collide() {
        let dir = TempDir::new().unwrap();
        let store = ReportStore::new(dir.path().to_path_buf());
        let report = sample();
        let first = store.save(&report).unwrap();
        let second = store.save(&report).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_json_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        assert_eq!(value["error_type"], "selinux");
        assert_eq!(value["impact_level"], "high");
        assert_eq!(value["lessons_learned"]["root_cause"], PENDING);
        assert_eq!(value["document_parsing"]["error_patterns_found"], 2);
    }
}

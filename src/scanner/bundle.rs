use crate::analysis::ErrorPattern;
use crate::parser::{DocumentMetadata, ParsingMethod};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const QUICK_MODE_SENTINEL: &str =
    "No specific log file provided - analysis based on error description and system context.";
pub const NO_RECENT_ERRORS: &str = "No recent system errors detected in standard log locations.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    File,
    SystemScan,
    Quick,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedFile {
    pub path: PathBuf,
    pub metadata: Option<DocumentMetadata>,
    pub parsing_method: ParsingMethod,
}

#[derive(Debug, Clone)]
pub struct LogSource {
    pub name: String,
    pub content: String,
    pub error_patterns: Vec<ErrorPattern>,
    pub parsed_files: Vec<ParsedFile>,
}

impl LogSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: String::new(),
            error_patterns: Vec::new(),
            parsed_files: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LogBundle {
    pub mode: ScanMode,
    pub sources: Vec<LogSource>,
    pub metadata: Option<DocumentMetadata>,
    pub parsing_method: Option<ParsingMethod>,
}

impl LogBundle {
    pub fn quick() -> Self {
        Self {
            mode: ScanMode::Quick,
            sources: Vec::new(),
            metadata: None,
            parsing_method: None,
        }
    }

    pub fn text(&self) -> String {
        match self.mode {
            ScanMode::Quick => QUICK_MODE_SENTINEL.to_string(),
            ScanMode::File => self
                .sources
                .iter()
                .map(|s| s.content.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
            ScanMode::SystemScan if self.sources.is_empty() => NO_RECENT_ERRORS.to_string(),
            ScanMode::SystemScan => self
                .sources
                .iter()
                .map(|s| format!("=== {} LOGS ===\n{}", s.name.to_uppercase(), s.content))
                .collect::<Vec<_>>()
                .join("\n\n"),
        }
    }

    pub fn error_patterns(&self) -> Vec<ErrorPattern> {
        self.sources
            .iter()
            .flat_map(|s| s.error_patterns.iter().cloned())
            .collect()
    }

    pub fn source_names(&self) -> Vec<&str> {
        self.sources.iter().map(|s| s.name.as_str()).collect()
    }

    pub(crate) fn source_mut(&mut self, name: &str) -> &mut LogSource {
        if let Some(index) = self.sources.iter().position(|s| s.name == name) {
            return &mut self.sources[index];
        }
        self.sources.push(LogSource::new(name));
        let last = self.sources.len() - 1;
        &mut self.sources[last]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_quick_bundle_is_sentinel() {
        assert_eq!(LogBundle::quick().text(), QUICK_MODE_SENTINEL);
    }

    #[test]
    fn test_system_bundle_headers() {
        let mut bundle = LogBundle {
            mode: ScanMode::SystemScan,
            sources: Vec::new(),
            metadata: None,
            parsing_method: None,
        };
        assert_eq!(bundle.text(), NO_RECENT_ERRORS);

        bundle.source_mut("journal").content.push_str("unit failed");
        bundle.source_mut("kernel").content.push_str("oops");
        bundle.source_mut("journal").content.push_str("; again");

        assert_eq!(
            bundle.text(),
            "=== JOURNAL LOGS ===\nunit failed; again\n\n=== KERNEL LOGS ===\noops"
        );
        assert_eq!(bundle.source_names(), vec!["journal", "kernel"]);
    }
}

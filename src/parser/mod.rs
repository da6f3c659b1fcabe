mod structured;

use colored::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;
const CHUNK_LINES: usize = 1000;
const MAX_CHUNKS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParsingMethod {
    Structured,
    Basic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogType {
    KernelLog,
    SelinuxLog,
    SystemdLog,
    ApplicationLog,
    AuditLog,
    AuthLog,
    GeneralLog,
}

impl LogType {
    pub fn detect(content: &str) -> Self {
        let lower = content.to_lowercase();

        if lower.contains("kernel:") || lower.contains("dmesg") {
            LogType::KernelLog
        } else if lower.contains("selinux") || lower.contains("avc:") {
            LogType::SelinuxLog
        } else if lower.contains("systemd") || lower.contains("journalctl") {
            LogType::SystemdLog
        } else if lower.contains("java") || lower.contains("exception") {
            LogType::ApplicationLog
        } else if lower.contains("audit") {
            LogType::AuditLog
        } else if lower.contains("auth") {
            LogType::AuthLog
        } else {
            LogType::GeneralLog
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::KernelLog => "kernel_log",
            LogType::SelinuxLog => "selinux_log",
            LogType::SystemdLog => "systemd_log",
            LogType::ApplicationLog => "application_log",
            LogType::AuditLog => "audit_log",
            LogType::AuthLog => "auth_log",
            LogType::GeneralLog => "general_log",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub document_type: LogType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub structure_elements: Option<usize>,
    pub line_count: usize,
    pub character_count: usize,
    pub estimated_size: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_format: Option<String>,
}

impl DocumentMetadata {
    pub fn describe(content: &str, original_format: Option<String>) -> Self {
        Self {
            document_type: LogType::detect(content),
            structure_elements: None,
            line_count: content.split('\n').count(),
            character_count: content.chars().count(),
            estimated_size: content.len(),
            original_format,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub index: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct ParsedDocument {
    pub source: String,
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunks: Vec<Chunk>,
    pub method: ParsingMethod,
}

impl ParsedDocument {
    pub fn raw(source: impl Into<String>, content: String) -> Self {
        Self {
            source: source.into(),
            metadata: DocumentMetadata::describe(&content, None),
            chunks: chunk_lines(&content),
            content,
            method: ParsingMethod::Basic,
        }
    }
}

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("File too large: {size} bytes (max: {max})")]
    TooLarge { size: u64, max: u64 },
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Structured parsing failed: {0}")]
    Structured(String),
}

/// The document-parsing collaborator used by the log scanner.
pub trait DocumentParser: Send + Sync {
    fn parse_file(&self, path: &Path) -> Result<ParsedDocument, ParseError>;
    fn parse_stream(&self, data: &[u8], name: &str) -> Result<ParsedDocument, ParseError>;
    fn structured_available(&self) -> bool;
}

#[derive(Debug, Clone)]
pub struct ParserOptions {
    pub artifacts_path: Option<PathBuf>,
    pub show_hints: bool,
    pub max_file_size: u64,
}

impl Default for ParserOptions {
    fn default() -> Self {
        Self {
            artifacts_path: None,
            show_hints: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

pub struct LogDocumentParser {
    options: ParserOptions,
    structured: bool,
}

impl LogDocumentParser {
    pub fn new(options: ParserOptions) -> Self {
        let structured = match &options.artifacts_path {
            Some(path) if !path.exists() => {
                warn!(
                    "parser artifacts path {} does not exist; structured parsing disabled",
                    path.display()
                );
                false
            }
            _ => true,
        };

        let parser = Self {
            options,
            structured,
        };
        if parser.structured && parser.options.show_hints {
            eprintln!(
                "{} structured parsing covers {}. Plain text logs use basic parsing.",
                "Note:".yellow().bold(),
                parser.supported_formats().join(", ")
            );
        }
        parser
    }

    pub fn supported_formats(&self) -> Vec<&'static str> {
        let mut formats = vec!["txt", "log"];
        if self.structured {
            formats.extend(structured::EXTENSIONS);
        }
        formats
    }

    fn structured_format(&self, name: &str) -> Option<structured::Format> {
        if !self.structured {
            return None;
        }
        let extension = Path::new(name).extension()?.to_str()?.to_lowercase();
        structured::Format::from_extension(&extension)
    }

    fn parse_bytes(&self, data: &[u8], source: &str) -> ParsedDocument {
        if let Some(format) = self.structured_format(source) {
            match structured::parse(format, data) {
                Ok((content, elements)) => {
                    let mut metadata =
                        DocumentMetadata::describe(&content, Some(format.extension().to_string()));
                    metadata.structure_elements = Some(elements);
                    let chunks = chunk_lines(&content);
                    return ParsedDocument {
                        source: source.to_string(),
                        content,
                        metadata,
                        chunks,
                        method: ParsingMethod::Structured,
                    };
                }
                Err(e) => debug!("structured parsing of {} failed, using basic: {}", source, e),
            }
        }

        let content = String::from_utf8_lossy(data).into_owned();
        let original_format = Path::new(source)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());
        ParsedDocument {
            source: source.to_string(),
            metadata: DocumentMetadata::describe(&content, original_format),
            chunks: chunk_lines(&content),
            content,
            method: ParsingMethod::Basic,
        }
    }
}

impl DocumentParser for LogDocumentParser {
    fn parse_file(&self, path: &Path) -> Result<ParsedDocument, ParseError> {
        let metadata = fs::metadata(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ParseError::NotFound(path.to_path_buf()),
            _ => ParseError::Io {
                path: path.to_path_buf(),
                source: e,
            },
        })?;

        if metadata.len() > self.options.max_file_size {
            return Err(ParseError::TooLarge {
                size: metadata.len(),
                max: self.options.max_file_size,
            });
        }

        let data = fs::read(path).map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(self.parse_bytes(&data, &path.to_string_lossy()))
    }

    fn parse_stream(&self, data: &[u8], name: &str) -> Result<ParsedDocument, ParseError> {
        Ok(self.parse_bytes(data, name))
    }

    fn structured_available(&self) -> bool {
        self.structured
    }
}

fn chunk_lines(content: &str) -> Vec<Chunk> {
    let lines: Vec<&str> = content.split('\n').collect();

    lines
        .chunks(CHUNK_LINES)
        .take(MAX_CHUNKS)
        .enumerate()
        .map(|(index, block)| Chunk {
            index,
            start_line: index * CHUNK_LINES + 1,
            end_line: index * CHUNK_LINES + block.len(),
            text: block.join("\n"),
        })
        .collect()
}

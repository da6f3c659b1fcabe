use crate::parser::ParsedDocument;
use crate::taxonomy::{PatternKind, DETECTORS};
use serde::{Deserialize, Serialize};

pub const MAX_PATTERNS: usize = 100;
const CONTEXT_RADIUS: usize = 200;
const CHUNK_PREVIEW: usize = 500;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPattern {
    pub category: PatternKind,
    pub pattern: String,
    #[serde(rename = "match")]
    pub matched: String,
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<usize>,
}

pub fn extract_error_patterns(document: &ParsedDocument) -> Vec<ErrorPattern> {
    let content = &document.content;
    let mut found = Vec::new();

    for detector in DETECTORS.iter() {
        for hit in detector.regex.find_iter(content) {
            if found.len() == MAX_PATTERNS {
                return found;
            }
            let start = floor_boundary(content, hit.start().saturating_sub(CONTEXT_RADIUS));
            let end = ceil_boundary(content, hit.end() + CONTEXT_RADIUS);
            found.push(ErrorPattern {
                category: detector.target,
                pattern: detector.source.to_string(),
                matched: hit.as_str().to_string(),
                context: content[start..end].to_string(),
                position: Some(hit.start()),
                chunk_index: None,
            });
        }
    }

    for chunk in &document.chunks {
        for detector in DETECTORS.iter() {
            if let Some(hit) = detector.regex.find(&chunk.text) {
                if found.len() == MAX_PATTERNS {
                    return found;
                }
                let preview_end = ceil_boundary(&chunk.text, CHUNK_PREVIEW);
                found.push(ErrorPattern {
                    category: detector.target,
                    pattern: detector.source.to_string(),
                    matched: hit.as_str().to_string(),
                    context: chunk.text[..preview_end].to_string(),
                    position: None,
                    chunk_index: Some(chunk.index),
                });
            }
        }
    }

    found
}

fn floor_boundary(text: &str, mut index: usize) -> usize {
    while index > 0 && !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DocumentParser, LogDocumentParser, ParserOptions};

    fn parse(content: &str) -> ParsedDocument {
        LogDocumentParser::new(ParserOptions {
            show_hints: false,
            ..ParserOptions::default()
        })
        .parse_stream(content.as_bytes(), "sample.log")
        .unwrap()
    }

    #[test]
    fn test_content_and_chunk_hits() {
        let doc = parse("boot ok\nsshd: permission denied for root\n");
        let patterns = extract_error_patterns(&doc);

        let content_hit = patterns
            .iter()
            .find(|p| p.category == PatternKind::Security && p.position.is_some())
            .unwrap();
        assert_eq!(content_hit.matched, "denied");
        assert!(content_hit.context.contains("sshd"));

        assert!(patterns
            .iter()
            .any(|p| p.category == PatternKind::Security && p.chunk_index == Some(0)));
    }

    #[test]
    fn test_output_is_capped() {
        let doc = parse(&"error\n".repeat(500));
        assert_eq!(extract_error_patterns(&doc).len(), MAX_PATTERNS);
    }

    #[test]
    fn test_context_respects_char_boundaries() {
        let text = format!("{}failed{}", "é".repeat(150), "ü".repeat(150));
        let doc = parse(&text);
        let patterns = extract_error_patterns(&doc);
        assert_eq!(patterns[0].matched, "failed");
        assert!(patterns[0].context.starts_with('é'));
    }

    #[test]
    fn test_clean_log_has_no_patterns() {
        assert!(extract_error_patterns(&parse("service started\nall good\n")).is_empty());
    }
}

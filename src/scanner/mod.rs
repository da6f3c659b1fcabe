mod bundle;

pub use bundle::{
    LogBundle, LogSource, ParsedFile, ScanMode, NO_RECENT_ERRORS, QUICK_MODE_SENTINEL,
};

use crate::analysis::extract_error_patterns;
use crate::error::RcaError;
use crate::parser::{DocumentParser, ParsedDocument};
use crate::probe::{self, ProbeError};
use crate::taxonomy::contains_recent_errors;
use chrono::{Duration as ChronoDuration, Local};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub const DEFAULT_MAX_TAIL_BYTES: u64 = 4 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanRequest {
    File(PathBuf),
    System { hours_back: u32 },
    Quick,
}

impl ScanRequest {
    pub fn from_flags(logfile: Option<PathBuf>, scan_system: bool, hours_back: u32) -> Self {
        match (logfile, scan_system) {
            (Some(path), _) => ScanRequest::File(path),
            (None, true) => ScanRequest::System { hours_back },
            (None, false) => ScanRequest::Quick,
        }
    }

    pub fn mode(&self) -> ScanMode {
        match self {
            ScanRequest::File(_) => ScanMode::File,
            ScanRequest::System { .. } => ScanMode::SystemScan,
            ScanRequest::Quick => ScanMode::Quick,
        }
    }
}

pub fn default_log_paths() -> Vec<(String, Vec<String>)> {
    [
        (
            "kernel",
            &["/var/log/kern.log", "/var/log/dmesg", "/var/log/messages"][..],
        ),
        (
            "system",
            &["/var/log/syslog", "/var/log/messages", "/var/log/system.log"][..],
        ),
        ("selinux", &["/var/log/audit/audit.log", "/var/log/audit.log"][..]),
        (
            "boot",
            &["/var/log/boot.log", "/var/log/boot", "/var/log/dmesg"][..],
        ),
        (
            "application",
            &[
                "/var/log/*.log",
                "/opt/*/logs/*.log",
                "~/.local/share/logs/*.log",
            ][..],
        ),
    ]
    .into_iter()
    .map(|(name, paths)| {
        (
            name.to_string(),
            paths.iter().map(|p| p.to_string()).collect(),
        )
    })
    .collect()
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub journal_timeout: Duration,
    pub file_timeout: Duration,
    pub max_lines_per_file: usize,
    pub max_tail_bytes: u64,
    pub use_journal: bool,
    pub log_paths: Vec<(String, Vec<String>)>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            journal_timeout: Duration::from_secs(10),
            file_timeout: Duration::from_secs(5),
            max_lines_per_file: 1000,
            max_tail_bytes: DEFAULT_MAX_TAIL_BYTES,
            use_journal: true,
            log_paths: default_log_paths(),
        }
    }
}

pub struct SystemLogScanner {
    parser: Arc<dyn DocumentParser>,
    options: ScanOptions,
}

impl SystemLogScanner {
    pub fn new(parser: Arc<dyn DocumentParser>, options: ScanOptions) -> Self {
        Self { parser, options }
    }

    pub fn structured_available(&self) -> bool {
        self.parser.structured_available()
    }

    pub async fn scan(&self, request: &ScanRequest) -> Result<LogBundle, RcaError> {
        match request {
            ScanRequest::File(path) => self.scan_file(path).await,
            ScanRequest::System { hours_back } => Ok(self.scan_system(*hours_back).await),
            ScanRequest::Quick => Ok(LogBundle::quick()),
        }
    }

    pub async fn scan_file(&self, path: &Path) -> Result<LogBundle, RcaError> {
        if !path.exists() {
            return Err(RcaError::FileNotFound(path.to_path_buf()));
        }

        let document = match self.parse_with_timeout(path).await {
            Ok(document) => document,
            Err(reason) => {
                debug!("parser gave up on {}: {}; reading raw", path.display(), reason);
                let content = probe::read_text(path, self.options.file_timeout)
                    .await
                    .map_err(|e| match e {
                        ProbeError::Read { path, source } => RcaError::LogRead { path, source },
                        other => RcaError::LogRead {
                            path: path.to_path_buf(),
                            source: std::io::Error::new(
                                std::io::ErrorKind::TimedOut,
                                other.to_string(),
                            ),
                        },
                    })?;
                ParsedDocument::raw(path.to_string_lossy(), content)
            }
        };

        info!(
            "read {} ({} lines, {:?} parsing)",
            path.display(),
            document.metadata.line_count,
            document.method
        );

        let mut bundle = LogBundle {
            mode: ScanMode::File,
            sources: Vec::new(),
            metadata: Some(document.metadata.clone()),
            parsing_method: Some(document.method),
        };
        let source = bundle.source_mut("file");
        source.error_patterns = extract_error_patterns(&document);
        source.parsed_files.push(ParsedFile {
            path: path.to_path_buf(),
            metadata: Some(document.metadata.clone()),
            parsing_method: document.method,
        });
        source.content = document.content;
        Ok(bundle)
    }

    pub async fn scan_system(&self, hours_back: u32) -> LogBundle {
        let mut bundle = LogBundle {
            mode: ScanMode::SystemScan,
            sources: Vec::new(),
            metadata: None,
            parsing_method: None,
        };

        if self.options.use_journal {
            match self.query_journal(hours_back).await {
                Ok(Some(document)) => {
                    let source = bundle.source_mut("journal");
                    source.error_patterns = extract_error_patterns(&document);
                    source.content = document.content;
                }
                Ok(None) => debug!("journal returned no error entries"),
                Err(e) => debug!("journal unavailable: {}", e),
            }
        }

        let mut seen = HashSet::new();
        for (name, patterns) in &self.options.log_paths {
            for file in patterns.iter().flat_map(|p| expand_pattern(p)) {
                if !seen.insert(file.clone()) {
                    continue;
                }
                let document = match self.read_log_file(&file).await {
                    Some(document) => document,
                    None => continue,
                };
                if !contains_recent_errors(&document.content) {
                    debug!("{} has no error keywords, skipping", file.display());
                    continue;
                }

                let source = bundle.source_mut(name);
                source.error_patterns.extend(extract_error_patterns(&document));
                source.content.push_str(&format!(
                    "\n--- {} ---\n{}",
                    file.display(),
                    document.content
                ));
                source.parsed_files.push(ParsedFile {
                    path: file,
                    metadata: Some(document.metadata),
                    parsing_method: document.method,
                });
            }
        }

        info!("system scan collected sources: {:?}", bundle.source_names());
        bundle
    }

    async fn query_journal(&self, hours_back: u32) -> Result<Option<ParsedDocument>, ProbeError> {
        let since = (Local::now() - ChronoDuration::hours(i64::from(hours_back)))
            .format("%Y-%m-%d %H:%M:%S")
            .to_string();
        let output = probe::run_command(
            "journalctl",
            &["--since", &since, "--priority=err", "--no-pager"],
            self.options.journal_timeout,
        )
        .await?;

        if output.stdout.trim().is_empty() {
            return Ok(None);
        }
        let capped = probe::tail_lines(&output.stdout, self.options.max_lines_per_file);
        let document = self
            .parser
            .parse_stream(capped.as_bytes(), "journalctl_errors")
            .unwrap_or_else(|_| ParsedDocument::raw("journalctl_errors", capped));
        Ok(Some(document))
    }

    async fn read_log_file(&self, path: &Path) -> Option<ParsedDocument> {
        let mut document = match self.parse_with_timeout(path).await {
            Ok(document) => document,
            Err(reason) => {
                debug!("parser skipped {}: {}", path.display(), reason);
                let tail = probe::read_tail(
                    path,
                    self.options.max_lines_per_file,
                    self.options.max_tail_bytes,
                    self.options.file_timeout,
                );
                match tail.await {
                    Ok(content) => ParsedDocument::raw(path.to_string_lossy(), content),
                    Err(e) => {
                        debug!("skipping {}: {}", path.display(), e);
                        return None;
                    }
                }
            }
        };

        let max = self.options.max_lines_per_file;
        if document.content.lines().count() > max {
            let tail = probe::tail_lines(&document.content, max);
            let method = document.method;
            document = ParsedDocument::raw(path.to_string_lossy(), tail);
            document.method = method;
        }
        Some(document)
    }

    async fn parse_with_timeout(&self, path: &Path) -> Result<ParsedDocument, String> {
        let parser = Arc::clone(&self.parser);
        let owned = path.to_path_buf();
        let task = tokio::task::spawn_blocking(move || parser.parse_file(&owned));

        match tokio::time::timeout(self.options.file_timeout, task).await {
            Ok(Ok(Ok(document))) => Ok(document),
            Ok(Ok(Err(e))) => Err(e.to_string()),
            Ok(Err(join)) => Err(join.to_string()),
            Err(_) => Err(format!(
                "timed out after {}s",
                self.options.file_timeout.as_secs()
            )),
        }
    }
}

fn expand_home(pattern: &str) -> String {
    match pattern.strip_prefix("~/") {
        Some(rest) => match directories::BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(rest).to_string_lossy().into_owned(),
            None => pattern.to_string(),
        },
        None => pattern.to_string(),
    }
}

fn expand_pattern(pattern: &str) -> Vec<PathBuf> {
    let pattern = expand_home(pattern);
    let candidates: Vec<PathBuf> = if pattern.contains('*') {
        match glob::glob(&pattern) {
            Ok(paths) => paths.filter_map(Result::ok).collect(),
            Err(e) => {
                debug!("bad log glob {}: {}", pattern, e);
                Vec::new()
            }
        }
    } else {
        vec![PathBuf::from(pattern)]
    };

    candidates
        .into_iter()
        .filter(|path| path.is_file() && std::fs::File::open(path).is_ok())
        .collect()
}

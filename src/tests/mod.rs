use crate::ai::{AIError, Completion, ModelClient};
use crate::analysis::ErrorPattern;
use crate::parser::{LogDocumentParser, ParserOptions};
use crate::scanner::{ScanOptions, SystemLogScanner};
use crate::taxonomy::PatternKind;
use crate::tools::{
    ContainerHealth, ContainerHealthSource, CpuInfo, ResourceSource, ResourceUsage, SystemContext,
    SystemInspector,
};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

mod error_handling;

// Test utilities and helpers
pub(crate) struct TestUtils;

impl TestUtils {
    pub fn system_context() -> SystemContext {
        SystemContext {
            os_info: "Linux testhost 6.1.0 x86_64 GNU/Linux".to_string(),
            selinux_status: "Enforcing".to_string(),
            memory_info: "MemTotal: 16384000 kB".to_string(),
            disk_space: "/dev/sda1 100G 42G 58G 42% /".to_string(),
            system_load: "0.42 0.30 0.25 1/512 4242".to_string(),
        }
    }

    pub fn patterns(count: usize) -> Vec<ErrorPattern> {
        (0..count)
            .map(|i| ErrorPattern {
                category: PatternKind::Error,
                pattern: "error|failed".to_string(),
                matched: format!("error {}", i),
                context: format!("line {} had an error", i),
                position: Some(i * 10),
                chunk_index: None,
            })
            .collect()
    }

    pub fn isolated_scanner() -> SystemLogScanner {
        let parser = LogDocumentParser::new(ParserOptions {
            show_hints: false,
            ..ParserOptions::default()
        });
        SystemLogScanner::new(
            Arc::new(parser),
            ScanOptions {
                use_journal: false,
                log_paths: Vec::new(),
                ..ScanOptions::default()
            },
        )
    }
}

#[derive(Default)]
pub(crate) struct FakeSystem {
    calls: AtomicUsize,
}

impl FakeSystem {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SystemInspector for FakeSystem {
    async fn system_context(&self) -> SystemContext {
        self.calls.fetch_add(1, Ordering::SeqCst);
        TestUtils::system_context()
    }
}

#[derive(Default)]
pub(crate) struct FakeContainers {
    calls: AtomicUsize,
}

impl FakeContainers {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContainerHealthSource for FakeContainers {
    async fn container_health(&self) -> ContainerHealth {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ContainerHealth::failed(None, "No container runtime detected")
    }
}

#[derive(Default)]
pub(crate) struct FakeResources {
    calls: AtomicUsize,
}

impl FakeResources {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ResourceSource for FakeResources {
    async fn cpu_info(&self) -> CpuInfo {
        self.calls.fetch_add(1, Ordering::SeqCst);
        CpuInfo {
            timestamp: Utc::now(),
            processors: Vec::new(),
            error: Some("cpuinfo unavailable in tests".to_string()),
        }
    }

    async fn resource_usage(&self) -> ResourceUsage {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ResourceUsage {
            timestamp: Utc::now(),
            summary: vec!["Tasks: 1 total".to_string()],
            processes: Vec::new(),
            error: None,
        }
    }
}

pub(crate) struct FakeModel {
    reply: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl FakeModel {
    pub fn answering(text: &str) -> Self {
        Self {
            reply: Some(text.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ModelClient for FakeModel {
    async fn complete(&self, prompt: &str) -> Result<Completion, AIError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        match &self.reply {
            Some(text) => Ok(Completion::new(text.clone())),
            None => Err(AIError::Unreachable {
                endpoint: "http://localhost:11434/api/chat".to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }

    fn describe(&self) -> String {
        "fake:model".to_string()
    }
}

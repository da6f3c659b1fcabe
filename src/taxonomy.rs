use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Kernel,
    Selinux,
    Java,
    Systemd,
    Network,
    Application,
    Boot,
    Hardware,
    Security,
    Container,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 10] = [
        ErrorCategory::Kernel,
        ErrorCategory::Selinux,
        ErrorCategory::Java,
        ErrorCategory::Systemd,
        ErrorCategory::Network,
        ErrorCategory::Application,
        ErrorCategory::Boot,
        ErrorCategory::Hardware,
        ErrorCategory::Security,
        ErrorCategory::Container,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Kernel => "kernel",
            ErrorCategory::Selinux => "selinux",
            ErrorCategory::Java => "java",
            ErrorCategory::Systemd => "systemd",
            ErrorCategory::Network => "network",
            ErrorCategory::Application => "application",
            ErrorCategory::Boot => "boot",
            ErrorCategory::Hardware => "hardware",
            ErrorCategory::Security => "security",
            ErrorCategory::Container => "container",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Declared least to most severe for the derived Ord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

impl ImpactLevel {
    pub const TIERS: [ImpactLevel; 4] = [
        ImpactLevel::Critical,
        ImpactLevel::High,
        ImpactLevel::Medium,
        ImpactLevel::Low,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImpactLevel::Critical => "critical",
            ImpactLevel::High => "high",
            ImpactLevel::Medium => "medium",
            ImpactLevel::Low => "low",
            ImpactLevel::Info => "info",
        }
    }

    pub fn is_severe(&self) -> bool {
        *self >= ImpactLevel::High
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct PatternRule<T> {
    pub target: T,
    pub source: &'static str,
    pub regex: Regex,
}

#[derive(Debug)]
pub struct RuleSet<T> {
    pub target: T,
    pub rules: Vec<PatternRule<T>>,
}

fn rule_set<T: Copy>(target: T, patterns: &[&'static str]) -> RuleSet<T> {
    let rules = patterns
        .iter()
        .map(|source| PatternRule {
            target,
            source,
            regex: Regex::new(&format!("(?i){}", source))
                .unwrap_or_else(|e| panic!("invalid built-in pattern {source:?}: {e}")),
        })
        .collect();
    RuleSet { target, rules }
}

static CATEGORY_RULES: Lazy<Vec<RuleSet<ErrorCategory>>> = Lazy::new(|| {
    vec![
        rule_set(
            ErrorCategory::Kernel,
            &[
                r"kernel:.*(error|panic|oops|bug|fault)",
                r"call trace:",
                r"segfault",
                r"unable to handle kernel paging request",
                r"kernel null pointer dereference",
            ],
        ),
        rule_set(
            ErrorCategory::Selinux,
            &[
                r"avc:.*denied",
                r"selinux.*denied",
                r"type=avc.*denied",
                r"scontext=.*tcontext=.*denied",
            ],
        ),
        rule_set(
            ErrorCategory::Java,
            &[
                r"java\..*exception",
                r"exception in thread",
                r"outofmemoryerror",
                r"stackoverflowerror",
                r"classnotfoundexception",
                r"noclassdeffounderror",
            ],
        ),
        rule_set(
            ErrorCategory::Systemd,
            &[
                r"systemd.*failed",
                r"failed to start",
                r"unit.*failed",
                r"service.*failed",
            ],
        ),
        rule_set(
            ErrorCategory::Network,
            &[
                r"connection.*(refused|timeout|reset)",
                r"network.*unreachable",
                r"dns.*failed",
                r"socket.*error",
            ],
        ),
        rule_set(
            ErrorCategory::Boot,
            &[
                r"failed to mount",
                r"boot.*(error|failed)",
                r"initramfs.*error",
                r"grub.*error",
            ],
        ),
        rule_set(
            ErrorCategory::Hardware,
            &[
                r"machine check",
                r"mce:.*hardware error",
                r"edac.*(error|ce|ue)\b",
                r"smart.*(fail|error)",
                r"thermal.*(throttl|critical)",
            ],
        ),
        rule_set(
            ErrorCategory::Security,
            &[
                r"authentication failure",
                r"failed password for",
                r"invalid user",
                r"possible break-in attempt",
            ],
        ),
        rule_set(
            ErrorCategory::Container,
            &[
                r"container.*(failed|error|crash)",
                r"pod.*(failed|error|crash)",
                r"docker.*(error|failed)",
                r"podman.*(error|failed)",
            ],
        ),
    ]
});

static IMPACT_RULES: Lazy<Vec<RuleSet<ImpactLevel>>> = Lazy::new(|| {
    vec![
        rule_set(
            ImpactLevel::Critical,
            &[
                r"panic|fatal|crash|segfault",
                r"data.*(loss|corrupt)",
                r"system.*(halt|shutdown)",
                r"kernel.*panic",
                r"out of memory",
                r"disk.*full",
            ],
        ),
        rule_set(
            ImpactLevel::High,
            &[
                r"failed to start",
                r"service.*down",
                r"connection.*refused",
                r"authentication.*failed",
                r"permission.*denied",
            ],
        ),
        rule_set(
            ImpactLevel::Medium,
            &[r"warning", r"degraded", r"slow", r"timeout", r"retry"],
        ),
        rule_set(ImpactLevel::Low, &[r"notice", r"info", r"debug"]),
    ]
});

// Order is the classifier tie-break.
pub fn category_rules() -> &'static [RuleSet<ErrorCategory>] {
    &CATEGORY_RULES
}

pub fn impact_rules() -> &'static [RuleSet<ImpactLevel>] {
    &IMPACT_RULES
}

pub fn impact_rules_for(level: ImpactLevel) -> Option<&'static RuleSet<ImpactLevel>> {
    IMPACT_RULES.iter().find(|set| set.target == level)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternKind {
    Error,
    Warning,
    Critical,
    Security,
    Network,
    Memory,
    Storage,
}

impl PatternKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PatternKind::Error => "error",
            PatternKind::Warning => "warning",
            PatternKind::Critical => "critical",
            PatternKind::Security => "security",
            PatternKind::Network => "network",
            PatternKind::Memory => "memory",
            PatternKind::Storage => "storage",
        }
    }
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub static DETECTORS: Lazy<Vec<PatternRule<PatternKind>>> = Lazy::new(|| {
    [
        (r"error|failed|exception|panic|fault|crash", PatternKind::Error),
        (r"warning|warn", PatternKind::Warning),
        (r"critical|fatal|severe", PatternKind::Critical),
        (r"denied|refused|unauthorized", PatternKind::Security),
        (r"timeout|unreachable|connection.*refused", PatternKind::Network),
        (r"out of memory|memory.*error", PatternKind::Memory),
        (r"disk.*full|no space", PatternKind::Storage),
    ]
    .into_iter()
    .flat_map(|(source, kind)| rule_set(kind, &[source]).rules)
    .collect()
});

// Presence check on content, not a timestamp filter.
pub const RECENT_ERROR_KEYWORDS: [&str; 7] = [
    "error",
    "failed",
    "exception",
    "panic",
    "fault",
    "denied",
    "timeout",
];

pub fn contains_recent_errors(content: &str) -> bool {
    let lower = content.to_lowercase();
    RECENT_ERROR_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
}

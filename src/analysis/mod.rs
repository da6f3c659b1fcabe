mod classifier;
mod impact;
mod patterns;

pub use classifier::{category_scores, classify};
pub use impact::assess;
pub use patterns::{extract_error_patterns, ErrorPattern, MAX_PATTERNS};

use crate::taxonomy::{ErrorCategory, ImpactLevel};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub category: ErrorCategory,
    pub impact: ImpactLevel,
}

impl Verdict {
    pub fn of(description: &str, log_text: &str) -> Self {
        Self {
            category: classify(description, log_text),
            impact: assess(description, log_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_for_service_failure() {
        let verdict = Verdict::of("Failed to start apache2.service", "");
        assert_eq!(verdict.category, ErrorCategory::Systemd);
        assert_eq!(verdict.impact, ImpactLevel::High);
    }

    #[test]
    fn test_verdict_for_selinux_denial() {
        let verdict = Verdict::of("SELinux denied access to httpd, authentication failed", "");
        assert_eq!(verdict.category, ErrorCategory::Selinux);
        assert_eq!(verdict.impact, ImpactLevel::High);
    }

    #[test]
    fn test_verdict_for_container_crash() {
        let verdict = Verdict::of("app won't start", "podman error: container crashed");
        assert_eq!(verdict.category, ErrorCategory::Container);
        assert_eq!(verdict.impact, ImpactLevel::Critical);
    }
}

use crate::analysis::Verdict;
use crate::context::AdditionalContext;
use crate::taxonomy::{ErrorCategory, ImpactLevel};
use crate::tools::SystemContext;
use std::fmt::Write;

const ROLE: &str = "You are an expert system administrator and diagnostic specialist with deep knowledge of Linux systems, security policies, application frameworks, and hardware troubleshooting.";

const GENERIC_GUIDANCE: &str = "Focus on application-level debugging strategies.";
const GENERIC_IMPACT: &str = "Assess impact based on service criticality.";
const SHOWN_PATTERNS: usize = 5;

pub const REPORT_SECTIONS: [(&str, &str); 8] = [
    (
        "Root Cause Analysis",
        "Identify the primary cause and any contributing factors.",
    ),
    (
        "Technical Evidence",
        "Point to specific log entries, error codes, or system indicators that support your analysis.",
    ),
    (
        "Impact Assessment",
        "Describe what systems/services are affected and the severity level.",
    ),
    (
        "Immediate Fix",
        "Provide step-by-step instructions for immediate resolution.",
    ),
    (
        "Long-term Prevention",
        "Suggest monitoring, configuration changes, or best practices to prevent recurrence.",
    ),
    (
        "Advanced Diagnostics",
        "If the issue persists, provide additional diagnostic commands and investigation steps.",
    ),
    (
        "Security Considerations",
        "Highlight any security implications and recommended security measures.",
    ),
    (
        "Lessons Learned",
        "Suggest improvements to prevent similar issues in the future.",
    ),
];

fn category_guidance(category: ErrorCategory) -> Option<&'static str> {
    let text = match category {
        ErrorCategory::Kernel => {
            "Focus on kernel-level issues:
- Memory management problems
- Hardware compatibility issues
- Driver conflicts
- Kernel module problems
- System resource exhaustion"
        }
        ErrorCategory::Selinux => {
            "Focus on SELinux security policy issues:
- Permission denials and context mismatches
- Policy rule violations
- File context labeling problems
- Service access restrictions
- Boolean policy settings"
        }
        ErrorCategory::Java => {
            "Focus on JVM and Java application issues:
- ClassPath and dependency problems
- Memory heap and garbage collection issues
- Thread deadlocks and concurrency problems
- Library version conflicts
- JVM configuration issues"
        }
        ErrorCategory::Systemd => {
            "Focus on systemd service management issues:
- Unit file syntax and ExecStart paths
- Service dependencies and ordering
- Restart limits and failure states
- Environment and working directory settings
- Journal output of the failing unit"
        }
        ErrorCategory::Network => {
            "Focus on network connectivity issues:
- Listening ports and firewall rules
- DNS resolution
- Routing and interface state
- TLS and proxy configuration
- Timeouts between dependent services"
        }
        ErrorCategory::Boot => {
            "Focus on system boot and initialization issues:
- Bootloader configuration problems
- Initramfs and kernel loading issues
- File system mount failures
- Service startup dependencies
- Hardware initialization problems"
        }
        ErrorCategory::Hardware => {
            "Focus on hardware health issues:
- Machine check and EDAC reports
- Disk SMART status and I/O errors
- Thermal throttling and power events
- Firmware and driver versions"
        }
        ErrorCategory::Security => {
            "Focus on authentication and access issues:
- Failed logins and their source addresses
- PAM and sshd configuration
- Account lockouts and expired credentials
- Signs of brute-force or intrusion attempts"
        }
        ErrorCategory::Container => {
            "Focus on container-related issues:
- Container runtime problems
- Resource constraints and limits
- Network connectivity issues
- Volume mount problems
- Container orchestration issues"
        }
        ErrorCategory::Application => return None,
    };
    Some(text)
}

fn impact_guidance(impact: ImpactLevel) -> Option<&'static str> {
    let text = match impact {
        ImpactLevel::Critical => {
            "CRITICAL IMPACT - System-wide outage or data loss risk:
- Focus on immediate service restoration
- Prioritize data integrity and recovery
- Consider system-wide implications
- Plan for failover if available"
        }
        ImpactLevel::High => {
            "HIGH IMPACT - Major service disruption:
- Focus on core service functionality
- Check dependent services
- Monitor resource usage
- Consider service dependencies"
        }
        ImpactLevel::Medium => {
            "MEDIUM IMPACT - Partial service degradation:
- Focus on performance optimization
- Check resource utilization
- Monitor error rates
- Consider scaling options"
        }
        ImpactLevel::Low => {
            "LOW IMPACT - Minor issues:
- Focus on service improvements
- Check configuration settings
- Monitor for escalation
- Consider preventive measures"
        }
        ImpactLevel::Info => return None,
    };
    Some(text)
}

const TRIAGE_GUIDANCE: &str = "TRIAGE MODE - Live outage in progress:
- Focus on immediate service restoration
- Prioritize critical systems
- Gather essential diagnostics
- Document actions taken
- Plan for post-incident review";

#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub description: &'a str,
    pub verdict: Verdict,
    pub system_context: &'a SystemContext,
    pub log_text: &'a str,
    pub context: &'a AdditionalContext,
    pub triage: bool,
}

pub fn compose(input: &PromptInput<'_>) -> String {
    let mut prompt = String::with_capacity(4096 + input.log_text.len());
    let category = input.verdict.category.as_str().to_uppercase();
    let impact = input.verdict.impact.as_str().to_uppercase();

    // Writing into a String cannot fail.
    let _ = write!(
        prompt,
        "{ROLE}\n\nERROR CLASSIFICATION: {category}\nIMPACT LEVEL: {impact}\n\n\
         The user is reporting the following error:\n\"{}\"\n\n\
         SYSTEM CONTEXT:\n{}\n\nLOG ANALYSIS DATA:\n{}\n",
        input.description,
        input.system_context.render(),
        input.log_text,
    );

    prompt.push('\n');
    prompt.push_str(&document_block(input.context));

    if let Some(health) = &input.context.container_health {
        let _ = write!(prompt, "\nCONTAINER HEALTH INFORMATION:\n{}", health.render());
    }

    if input.context.resource_usage.is_some() || input.context.cpu_info.is_some() {
        prompt.push_str("\nRESOURCE USAGE INFORMATION:\n");
        if let Some(usage) = &input.context.resource_usage {
            prompt.push_str(&usage.render());
        }
        if let Some(cpu) = &input.context.cpu_info {
            let _ = write!(prompt, "\nCPU INFORMATION:\n{}", cpu.render());
        }
    }

    let _ = write!(
        prompt,
        "\nSPECIALIZED GUIDANCE:\n{}\n\nIMPACT ASSESSMENT:\n{}\n",
        category_guidance(input.verdict.category).unwrap_or(GENERIC_GUIDANCE),
        impact_guidance(input.verdict.impact).unwrap_or(GENERIC_IMPACT),
    );

    if input.triage {
        let _ = write!(prompt, "\n{TRIAGE_GUIDANCE}\n");
    }

    prompt.push_str("\nProvide a comprehensive diagnostic analysis with the following structure:\n");
    for (title, instruction) in REPORT_SECTIONS {
        let _ = write!(prompt, "\n## {title}\n{instruction}\n");
    }
    prompt.push_str(
        "\nBe specific with command examples, file paths, and configuration snippets where applicable.\n",
    );
    prompt
}

// Rendered for every run; without file metadata the fields fall back to unknown and 0.
fn document_block(context: &AdditionalContext) -> String {
    let metadata = context.document_metadata.as_ref();
    let engine = if context.structured_parsing_available {
        "Structured document parser"
    } else {
        "Basic text parser"
    };
    let mut block = format!(
        "DOCUMENT PARSING INFORMATION:\n- Parsing engine: {}\n- Document type: {}\n- Structure elements: {}\n- Error patterns detected: {}\n",
        engine,
        metadata.map_or("unknown", |m| m.document_type.as_str()),
        metadata.and_then(|m| m.structure_elements).unwrap_or(0),
        context.error_patterns.len(),
    );

    if !context.error_patterns.is_empty() {
        block.push_str("\nKEY ERROR PATTERNS DETECTED:\n");
        for (i, pattern) in context.error_patterns.iter().take(SHOWN_PATTERNS).enumerate() {
            let _ = writeln!(
                block,
                "{}. {}: {}",
                i + 1,
                pattern.category.as_str().to_uppercase(),
                pattern.matched
            );
        }
    }
    block
}

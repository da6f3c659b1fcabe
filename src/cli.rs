use crate::config::{AIProvider, Config};
use crate::scanner::ScanRequest;
use chrono::Local;
use clap::Parser;
use colored::*;
use std::path::PathBuf;

pub const LICENSE_TEXT: &str = "
RCA Agent, Copyright (C) 2025-present the rca-agent contributors.

This program comes with ABSOLUTELY NO WARRANTY.
This is free software, and you are welcome to redistribute it under certain conditions;
as described in the Apache Public License Version 2.0.

A copy of this license should have been provided with this software, if not - visit:
https://www.apache.org/licenses/LICENSE-2.0
";

const USAGE_MODES: &str = "USAGE MODES:
  Basic:        rca-agent --error \"Error description\" --logfile path/to/logfile
  System scan:  rca-agent --error \"Error description\" --scan-system [--hours 24]
  Quick:        rca-agent --error \"Error description\"
  Triage:       rca-agent --error \"Error description\" --triage [--scan-system]

Supported error types: kernel, SELinux, Java/JVM, systemd, network, boot,
hardware, security, container and application errors.";

#[derive(Parser, Debug, Clone, PartialEq)]
#[command(
    name = "rca-agent",
    version,
    about = "Root cause analysis for system errors, backed by a language model",
    after_help = USAGE_MODES
)]
pub struct Args {
    /// Description of the error
    #[arg(long, value_name = "TEXT", required_unless_present_any = ["license", "init_config"])]
    pub error: Option<String>,

    /// Path to a specific log file to analyze
    #[arg(long, value_name = "PATH")]
    pub logfile: Option<PathBuf>,

    /// Scan well-known system logs for recent errors
    #[arg(long)]
    pub scan_system: bool,

    /// Hours back to scan for errors (defaults to [scan] hours_back)
    #[arg(long, value_name = "N")]
    pub hours: Option<u32>,

    /// Live outage in progress: widen context and guidance
    #[arg(long)]
    pub triage: bool,

    /// Model provider (ollama, anthropic, openai)
    #[arg(long, value_name = "NAME")]
    pub provider: Option<AIProvider>,

    /// Model name
    #[arg(long, value_name = "NAME")]
    pub model: Option<String>,

    /// Model timeout in seconds
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Config file (defaults to the platform config directory)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable coloured output
    #[arg(long)]
    pub no_color: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Show license information
    #[arg(short = 'l', long)]
    pub license: bool,

    /// Write a default config file (to --config or the platform path) and exit
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    pub fn scan_request(&self, config: &Config) -> ScanRequest {
        let hours_back = self.hours.unwrap_or(config.scan.hours_back);
        ScanRequest::from_flags(self.logfile.clone(), self.scan_system, hours_back)
    }

    pub fn mode_label(&self) -> &'static str {
        if self.triage {
            "TRIAGE"
        } else if self.logfile.is_some() {
            "BASIC"
        } else if self.scan_system {
            "SYSTEM_SCAN"
        } else {
            "QUICK"
        }
    }

    pub fn apply_overrides(&self, config: &mut Config) {
        if let Some(provider) = self.provider {
            config.ai.provider = provider;
        }
        if let Some(model) = &self.model {
            config.ai.model = model.clone();
        }
        if let Some(timeout) = self.timeout {
            config.ai.timeout_secs = timeout;
        }
        if self.no_color {
            config.display.color_output = false;
        }
    }

    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}

pub fn print_banner(args: &Args, config: &Config) {
    println!("{}", "=== System Diagnostic RCA Report ===".bold());
    println!("Mode: {}", args.mode_label());
    println!("Model: {}:{}", config.ai.provider.as_str(), config.ai.model);
    if args.triage {
        println!("{}", "TRIAGE MODE ENABLED - Live outage in progress".red().bold());
    }
    println!("Timestamp: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!("{}", "=".repeat(50));
}

pub fn print_follow_up() {
    println!("\n{}", "=".repeat(50));
    println!("Analysis complete. For persistent issues, consider:");
    for tip in [
        "Running with --scan-system to check broader system logs",
        "Increasing --hours value to scan further back in time",
        "Using --triage mode for live outage situations",
        "Checking specific service logs in /var/log/",
        "Reviewing security logs if SELinux or permission issues persist",
        "Monitoring container health if analyzing container issues",
    ] {
        println!("- {}", tip);
    }
}

pub fn troubleshooting(config: &Config) -> Vec<String> {
    let backend = match config.ai.provider {
        AIProvider::Ollama => format!(
            "Check that Ollama is running and the model is pulled (ollama pull {})",
            config.ai.model
        ),
        AIProvider::Anthropic => "Check ANTHROPIC_API_KEY or [ai].anthropic_api_key".to_string(),
        AIProvider::OpenAI => "Check OPENAI_API_KEY or [ai].openai_api_key".to_string(),
    };
    vec![
        "Verify log file permissions and paths".to_string(),
        backend,
        format!(
            "Raise --timeout if the model needs longer than {}s",
            config.ai.timeout_secs
        ),
        "Check container runtime status if analyzing container issues".to_string(),
        format!(
            "For offline structured parsing, point {} at an existing directory",
            crate::config::ARTIFACTS_PATH_ENV
        ),
    ]
}

pub fn print_troubleshooting(error: &dyn std::fmt::Display, config: &Config) {
    eprintln!("{} {}", "An error occurred during analysis:".red().bold(), error);
    eprintln!("\nFor troubleshooting:");
    for (i, step) in troubleshooting(config).iter().enumerate() {
        eprintln!("{}. {}", i + 1, step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("rca-agent").chain(args.iter().copied()))
    }

    #[test]
    fn test_error_is_required() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--scan-system"]).is_err());
        assert!(parse(&["--license"]).is_ok());
        assert!(parse(&["--init-config"]).is_ok());
    }

    #[test]
    fn test_unknown_argument_is_rejected() {
        assert!(parse(&["--error", "x", "--llm-framework", "beeai"]).is_err());
    }

    #[test]
    fn test_defaults_and_modes() {
        let config = Config::default();
        let args = parse(&["--error", "disk full"]).unwrap();
        assert_eq!(args.hours, None);
        assert_eq!(args.scan_request(&config), ScanRequest::Quick);
        assert_eq!(args.mode_label(), "QUICK");

        let args = parse(&["--error", "x", "--scan-system", "--hours", "6"]).unwrap();
        assert_eq!(args.scan_request(&config), ScanRequest::System { hours_back: 6 });
        assert_eq!(args.mode_label(), "SYSTEM_SCAN");

        let args = parse(&["--error", "x", "--logfile", "/tmp/a.log", "--triage", "-vv"]).unwrap();
        assert_eq!(args.mode_label(), "TRIAGE");
        assert_eq!(args.log_filter(), "debug");
    }

    #[test]
    fn test_overrides_apply_to_config() {
        let args = parse(&[
            "--error", "x", "--provider", "anthropic", "--model", "claude", "--timeout", "60",
            "--no-color",
        ])
        .unwrap();
        let mut config = Config::default();
        args.apply_overrides(&mut config);
        assert_eq!(config.ai.provider, AIProvider::Anthropic);
        assert_eq!(config.ai.model, "claude");
        assert_eq!(config.ai.timeout_secs, 60);
        assert!(!config.display.color_output);
    }

    #[test]
    fn test_hours_fall_back_to_config() {
        let mut config = Config::default();
        config.scan.hours_back = 6;

        let args = parse(&["--error", "x", "--scan-system"]).unwrap();
        assert_eq!(args.scan_request(&config), ScanRequest::System { hours_back: 6 });

        let args = parse(&["--error", "x", "--scan-system", "--hours", "48"]).unwrap();
        assert_eq!(args.scan_request(&config), ScanRequest::System { hours_back: 48 });
    }
}

use super::SystemInspector;
use crate::probe::{self, ProbeError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use sysinfo::{LoadAvg, System, IS_SUPPORTED_SYSTEM};
use tracing::debug;

const KIB: u64 = 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemContext {
    pub os_info: String,
    pub selinux_status: String,
    pub memory_info: String,
    pub disk_space: String,
    pub system_load: String,
}

impl SystemContext {
    pub fn render(&self) -> String {
        [
            ("os_info", &self.os_info),
            ("selinux_status", &self.selinux_status),
            ("memory_info", &self.memory_info),
            ("disk_space", &self.disk_space),
            ("system_load", &self.system_load),
        ]
        .iter()
        .map(|(key, value)| format!("{}: {}", key, value))
        .collect::<Vec<_>>()
        .join("\n")
    }
}

fn or_placeholder(result: Result<String, ProbeError>, probe: &str, placeholder: &str) -> String {
    match result {
        Ok(value) => value,
        Err(e) => {
            debug!("{} probe failed: {}", probe, e);
            placeholder.to_string()
        }
    }
}

pub struct HostInspector {
    timeout: Duration,
}

impl HostInspector {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn command(&self, program: &str, args: &[&str]) -> Result<String, ProbeError> {
        probe::run_command(program, args, self.timeout)
            .await
            .map(|out| out.stdout)
    }
}

#[async_trait]
impl SystemInspector for HostInspector {
    async fn system_context(&self) -> SystemContext {
        let os_info = self.command("uname", &["-a"]).await.map(|s| s.trim().to_string());
        let selinux = self.command("getenforce", &[]).await.map(|s| s.trim().to_string());
        let disk = self.command("df", &["-h", "/"]).await;
        let (memory, load) = if IS_SUPPORTED_SYSTEM {
            let mut sys = System::new();
            sys.refresh_memory();
            (Ok(memory_summary(&sys)), Ok(load_summary(&System::load_average())))
        } else {
            let unsupported = || ProbeError::Unavailable("sysinfo does not support this OS".to_string());
            (Err(unsupported()), Err(unsupported()))
        };

        SystemContext {
            os_info: or_placeholder(os_info, "uname", "Unable to determine OS info"),
            selinux_status: or_placeholder(selinux, "getenforce", "SELinux status unknown"),
            memory_info: or_placeholder(memory, "memory", "Memory info unavailable"),
            disk_space: or_placeholder(disk, "df", "Disk space info unavailable"),
            system_load: or_placeholder(load, "load", "System load unavailable"),
        }
    }
}

fn memory_summary(sys: &System) -> String {
    [
        ("MemTotal", sys.total_memory()),
        ("MemFree", sys.free_memory()),
        ("MemAvailable", sys.available_memory()),
        ("SwapTotal", sys.total_swap()),
        ("SwapFree", sys.free_swap()),
    ]
    .iter()
    .map(|(label, bytes)| format!("{}: {} kB\n", label, bytes / KIB))
    .collect()
}

fn load_summary(load: &LoadAvg) -> String {
    format!("{:.2} {:.2} {:.2}", load.one, load.five, load.fifteen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_keeps_field_order() {
        let ctx = SystemContext {
            os_info: "Linux box 6.1".to_string(),
            selinux_status: "Enforcing".to_string(),
            memory_info: "MemTotal: 1 kB".to_string(),
            disk_space: "/dev/sda1 10G".to_string(),
            system_load: "0.00 0.01 0.05".to_string(),
        };
        let rendered = ctx.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines[0], "os_info: Linux box 6.1");
        assert_eq!(lines[1], "selinux_status: Enforcing");
        assert_eq!(lines[4], "system_load: 0.00 0.01 0.05");
    }

    #[test]
    fn test_failed_probe_uses_placeholder() {
        let value = or_placeholder(
            Err(ProbeError::Unavailable("nope".to_string())),
            "getenforce",
            "SELinux status unknown",
        );
        assert_eq!(value, "SELinux status unknown");
    }

    #[test]
    fn test_load_summary_format() {
        let load = LoadAvg {
            one: 0.5,
            five: 0.25,
            fifteen: 1.0,
        };
        assert_eq!(load_summary(&load), "0.50 0.25 1.00");
    }

    #[test]
    fn test_memory_summary_lists_meminfo_style_lines() {
        let mut sys = System::new();
        sys.refresh_memory();
        let summary = memory_summary(&sys);
        let labels: Vec<&str> = summary
            .lines()
            .filter_map(|line| line.split(':').next())
            .collect();
        assert_eq!(
            labels,
            vec!["MemTotal", "MemFree", "MemAvailable", "SwapTotal", "SwapFree"]
        );
        assert!(summary.lines().all(|line| line.ends_with(" kB")));
    }

    #[tokio::test]
    async fn test_host_context_never_fails() {
        let ctx = HostInspector::new(Duration::from_secs(2)).system_context().await;
        assert!(!ctx.os_info.is_empty());
        assert!(!ctx.system_load.is_empty());
    }
}

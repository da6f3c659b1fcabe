use super::ContainerHealthSource;
use crate::probe::{self, ProbeError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, warn};

const CONTAINER_LOG_LINES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerRuntime {
    Podman,
    Docker,
}

impl ContainerRuntime {
    pub fn binary(&self) -> &'static str {
        match self {
            ContainerRuntime::Podman => "podman",
            ContainerRuntime::Docker => "docker",
        }
    }

    pub async fn detect(timeout: Duration) -> Option<Self> {
        for runtime in [ContainerRuntime::Podman, ContainerRuntime::Docker] {
            if which::which(runtime.binary()).is_err() {
                continue;
            }
            match probe::run_command(runtime.binary(), &["--version"], timeout).await {
                Ok(out) => {
                    debug!("container runtime: {}", out.stdout.trim());
                    return Some(runtime);
                }
                Err(e) => debug!("{} is installed but unusable: {}", runtime.binary(), e),
            }
        }
        None
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub id: String,
    pub name: String,
    pub status: String,
    pub state: String,
    pub stats: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs_error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerHealth {
    pub timestamp: DateTime<Utc>,
    pub runtime: Option<String>,
    pub containers: Vec<ContainerStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ContainerHealth {
    pub fn failed(runtime: Option<ContainerRuntime>, error: impl Into<String>) -> Self {
        Self {
            timestamp: Utc::now(),
            runtime: runtime.map(|r| r.binary().to_string()),
            containers: Vec::new(),
            error: Some(error.into()),
        }
    }

    pub fn render(&self) -> String {
        let mut out = format!(
            "Runtime: {}\n",
            self.runtime.as_deref().unwrap_or("none detected")
        );
        if let Some(error) = &self.error {
            out.push_str(&format!("Error: {}\n", error));
        }
        for c in &self.containers {
            out.push_str(&format!(
                "- {} ({}): status={}, state={}\n",
                c.name, c.id, c.status, c.state
            ));
            if !c.stats.is_null() {
                out.push_str(&format!("  stats: {}\n", c.stats));
            }
            match (&c.logs, &c.logs_error) {
                (Some(logs), _) if !logs.trim().is_empty() => {
                    out.push_str("  recent logs:\n");
                    for line in logs.lines() {
                        out.push_str(&format!("    {}\n", line));
                    }
                }
                (_, Some(error)) => out.push_str(&format!("  logs unavailable: {}\n", error)),
                _ => {}
            }
        }
        out
    }
}

pub struct ContainerMonitor {
    runtime: OnceCell<Option<ContainerRuntime>>,
    timeout: Duration,
}

impl ContainerMonitor {
    // The runtime is probed on first use only.
    pub fn new(timeout: Duration) -> Self {
        Self {
            runtime: OnceCell::new(),
            timeout,
        }
    }

    pub fn with_runtime(runtime: Option<ContainerRuntime>, timeout: Duration) -> Self {
        Self {
            runtime: OnceCell::new_with(Some(runtime)),
            timeout,
        }
    }

    async fn runtime(&self) -> Option<ContainerRuntime> {
        *self
            .runtime
            .get_or_init(|| ContainerRuntime::detect(self.timeout))
            .await
    }

    async fn runtime_json(&self, runtime: ContainerRuntime, args: &[&str]) -> Result<Vec<Value>, ProbeError> {
        let out = probe::run_command(runtime.binary(), args, self.timeout).await?;
        parse_json_records(&out.stdout).map_err(|e| {
            ProbeError::Unavailable(format!("unreadable `{} {}` output: {}", runtime.binary(), args.join(" "), e))
        })
    }

    async fn container_logs(&self, runtime: ContainerRuntime, id: &str) -> Result<String, ProbeError> {
        let lines = CONTAINER_LOG_LINES.to_string();
        let out = probe::run_command(runtime.binary(), &["logs", "--tail", &lines, id], self.timeout).await?;
        // container output is split across both streams
        Ok(format!("{}{}", out.stdout, out.stderr))
    }
}

#[async_trait]
impl ContainerHealthSource for ContainerMonitor {
    async fn container_health(&self) -> ContainerHealth {
        let runtime = match self.runtime().await {
            Some(runtime) => runtime,
            None => return ContainerHealth::failed(None, "No container runtime detected"),
        };

        let stats = self
            .runtime_json(runtime, &["stats", "--no-stream", "--format", "json"])
            .await;
        let info = self.runtime_json(runtime, &["ps", "-a", "--format", "json"]).await;

        let (stats, info) = match (stats, info) {
            (Ok(stats), Ok(info)) => (stats, info),
            (Err(e), _) | (_, Err(e)) => {
                warn!("container health probe failed: {}", e);
                return ContainerHealth::failed(
                    Some(runtime),
                    format!("Failed to gather container health information: {}", e),
                );
            }
        };

        let mut containers = container_statuses(&info, &stats);
        for container in &mut containers {
            match self.container_logs(runtime, &container.id).await {
                Ok(logs) => container.logs = Some(logs),
                Err(e) => {
                    container.logs_error = Some(format!("Failed to get container logs: {}", e))
                }
            }
        }

        ContainerHealth {
            timestamp: Utc::now(),
            runtime: Some(runtime.binary().to_string()),
            containers,
            error: None,
        }
    }
}

// Records without an id cannot be matched to stats or asked for logs.
fn container_statuses(info: &[Value], stats: &[Value]) -> Vec<ContainerStatus> {
    info.iter()
        .filter_map(|record| {
            let id = field(record, &["Id", "ID", "id"]).filter(|id| !id.is_empty())?;
            let stats = stats
                .iter()
                .find(|s| {
                    field(s, &["ID", "Id", "id"])
                        .map(|sid| !sid.is_empty() && (id.starts_with(&sid) || sid.starts_with(&id)))
                        .unwrap_or(false)
                })
                .cloned()
                .unwrap_or(Value::Null);
            Some(ContainerStatus {
                name: container_name(record),
                status: field(record, &["Status"]).unwrap_or_else(|| "unknown".to_string()),
                state: field(record, &["State"]).unwrap_or_else(|| "unknown".to_string()),
                id,
                stats,
                logs: None,
                logs_error: None,
            })
        })
        .collect()
}

fn parse_json_records(stdout: &str) -> Result<Vec<Value>, serde_json::Error> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed);
    }
    trimmed
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(serde_json::from_str::<Value>)
        .collect()
}

fn field(record: &Value, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match record.get(*key)? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    })
}

fn container_name(record: &Value) -> String {
    match record.get("Names") {
        Some(Value::Array(names)) => names
            .first()
            .and_then(Value::as_str)
            .map(str::to_string),
        Some(Value::String(names)) => names.split(',').next().map(str::to_string),
        _ => None,
    }
    .filter(|name| !name.is_empty())
    .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_podman_array() {
        let records = parse_json_records(r#"[{"Id":"abc123","Names":["web"],"State":"running"}]"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(container_name(&records[0]), "web");
        assert_eq!(field(&records[0], &["Id", "ID"]).as_deref(), Some("abc123"));
    }

    #[test]
    fn test_parse_docker_json_lines() {
        let out = "{\"ID\":\"1\",\"Names\":\"db,alias\",\"Status\":\"Exited (1)\"}\n{\"ID\":\"2\",\"Names\":\"cache\"}\n";
        let records = parse_json_records(out).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(container_name(&records[0]), "db");
        assert_eq!(field(&records[0], &["Status"]).as_deref(), Some("Exited (1)"));
    }

    #[test]
    fn test_empty_output_means_no_containers() {
        assert!(parse_json_records("").unwrap().is_empty());
        assert!(parse_json_records("null").unwrap().is_empty());
        assert!(parse_json_records("not json").is_err());
    }

    #[tokio::test]
    async fn test_no_runtime_is_an_embedded_error() {
        let health = ContainerMonitor::with_runtime(None, Duration::from_secs(1))
            .container_health()
            .await;
        assert_eq!(health.error.as_deref(), Some("No container runtime detected"));
        assert!(health.containers.is_empty());
        assert!(health.render().contains("none detected"));
    }

    #[tokio::test]
    async fn test_runtime_is_detected_on_first_request() {
        let monitor = ContainerMonitor::new(Duration::from_secs(5));
        assert!(!monitor.runtime.initialized());
        let _ = monitor.container_health().await;
        assert!(monitor.runtime.initialized());
    }

    #[test]
    fn test_records_without_id_are_skipped() {
        let info = vec![
            json!({"Names": ["ghost"], "State": "created"}),
            json!({"Id": "", "Names": ["blank"]}),
            json!({"Id": "abc123def", "Names": ["web"], "State": "running"}),
        ];
        let stats = vec![
            json!({"ID": "ffff", "cpu_percent": "99%"}),
            json!({"ID": "abc123", "cpu_percent": "1%"}),
        ];

        let statuses = container_statuses(&info, &stats);
        assert_eq!(statuses.len(), 1);
        assert_eq!(statuses[0].name, "web");
        assert_eq!(statuses[0].stats["cpu_percent"], "1%");
    }

    #[test]
    fn test_render_lists_containers() {
        let health = ContainerHealth {
            timestamp: Utc::now(),
            runtime: Some("podman".to_string()),
            containers: vec![ContainerStatus {
                id: "abc".to_string(),
                name: "web".to_string(),
                status: "Exited (137)".to_string(),
                state: "exited".to_string(),
                stats: json!({"cpu_percent": "0.00%"}),
                logs: Some("OOMKilled\n".to_string()),
                logs_error: None,
            }],
            error: None,
        };
        let text = health.render();
        assert!(text.contains("- web (abc): status=Exited (137), state=exited"));
        assert!(text.contains("    OOMKilled"));
    }
}

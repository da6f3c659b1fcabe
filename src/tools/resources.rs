use super::ResourceSource;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use sysinfo::{Cpu, Process, System, MINIMUM_CPU_UPDATE_INTERVAL};

const MAX_PROCESS_ROWS: usize = 25;
const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuInfo {
    pub timestamp: DateTime<Utc>,
    pub processors: Vec<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CpuInfo {
    pub fn render(&self) -> String {
        if let Some(error) = &self.error {
            return format!("Error: {}\n", error);
        }
        let mut out = format!("{} logical processors\n", self.processors.len());
        for cpu in &self.processors {
            let fields: Vec<String> = cpu.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
            out.push_str(&format!("- {}\n", fields.join(", ")));
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessRow {
    pub pid: u32,
    pub name: String,
    pub user: String,
    pub cpu_percent: f32,
    pub mem_percent: f32,
    pub memory_kb: u64,
    pub state: String,
    pub run_time_secs: u64,
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceUsage {
    pub timestamp: DateTime<Utc>,
    pub summary: Vec<String>,
    pub processes: Vec<ProcessRow>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResourceUsage {
    pub fn render(&self) -> String {
        let mut out = String::new();
        if let Some(error) = &self.error {
            out.push_str(&format!("Error: {}\n", error));
        }
        for line in &self.summary {
            out.push_str(line);
            out.push('\n');
        }
        if !self.processes.is_empty() {
            out.push_str("PID USER %CPU %MEM RSS(KB) STATE TIME(S) COMMAND\n");
            for p in &self.processes {
                out.push_str(&format!(
                    "{} {} {:.1} {:.1} {} {} {} {}\n",
                    p.pid,
                    p.user,
                    p.cpu_percent,
                    p.mem_percent,
                    p.memory_kb,
                    p.state,
                    p.run_time_secs,
                    p.command
                ));
            }
        }
        out
    }
}

pub struct ResourceMonitor {
    timeout: Duration,
}

impl ResourceMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    // sysinfo blocks for the CPU sampling interval, so it runs off the runtime.
    async fn sample<T, F>(&self, what: &str, collect: F) -> Result<T, String>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let task = tokio::task::spawn_blocking(collect);
        match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(join)) => Err(format!("{} sampler stopped: {}", what, join)),
            Err(_) => Err(format!(
                "{} sampling timed out after {}s",
                what,
                self.timeout.as_secs()
            )),
        }
    }
}

#[async_trait]
impl ResourceSource for ResourceMonitor {
    async fn cpu_info(&self) -> CpuInfo {
        let sampled = self
            .sample("cpu", || {
                let mut sys = System::new();
                sys.refresh_cpu();
                std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
                sys.refresh_cpu();
                sys.cpus()
                    .iter()
                    .enumerate()
                    .map(|(index, cpu)| cpu_fields(index, cpu))
                    .collect::<Vec<_>>()
            })
            .await;

        let (processors, error) = match sampled {
            Ok(processors) if processors.is_empty() => (
                processors,
                Some("Failed to read CPU info: no processors reported".to_string()),
            ),
            Ok(processors) => (processors, None),
            Err(e) => (Vec::new(), Some(format!("Failed to read CPU info: {}", e))),
        };
        CpuInfo {
            timestamp: Utc::now(),
            processors,
            error,
        }
    }

    async fn resource_usage(&self) -> ResourceUsage {
        let sampled = self
            .sample("process", || {
                let mut sys = System::new_all();
                std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
                sys.refresh_cpu();
                sys.refresh_processes();
                snapshot(&sys)
            })
            .await;

        match sampled {
            Ok((summary, processes)) => ResourceUsage {
                timestamp: Utc::now(),
                summary,
                processes,
                error: None,
            },
            Err(e) => ResourceUsage {
                timestamp: Utc::now(),
                summary: Vec::new(),
                processes: Vec::new(),
                error: Some(format!("Failed to get process snapshot: {}", e)),
            },
        }
    }
}

fn cpu_fields(index: usize, cpu: &Cpu) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    fields.insert("processor".to_string(), index.to_string());
    fields.insert("model name".to_string(), cpu.brand().trim().to_string());
    fields.insert("vendor_id".to_string(), cpu.vendor_id().to_string());
    fields.insert("cpu MHz".to_string(), cpu.frequency().to_string());
    fields.insert("usage %".to_string(), format!("{:.1}", cpu.cpu_usage()));
    fields
}

fn snapshot(sys: &System) -> (Vec<String>, Vec<ProcessRow>) {
    let load = System::load_average();
    let total = sys.total_memory();
    let summary = vec![
        format!(
            "load average: {:.2}, {:.2}, {:.2}",
            load.one, load.five, load.fifteen
        ),
        format!("Tasks: {} total", sys.processes().len()),
        format!(
            "%Cpu(s): {:.1} used across {} cpus",
            sys.global_cpu_info().cpu_usage(),
            sys.cpus().len()
        ),
        format!(
            "MiB Mem: {} total, {} used, {} available",
            total / MIB,
            sys.used_memory() / MIB,
            sys.available_memory() / MIB
        ),
        format!(
            "MiB Swap: {} total, {} used",
            sys.total_swap() / MIB,
            sys.used_swap() / MIB
        ),
    ];

    let rows = sys
        .processes()
        .values()
        .map(|process| process_row(process, total))
        .collect();
    (summary, busiest(rows, MAX_PROCESS_ROWS))
}

fn process_row(process: &Process, total_memory: u64) -> ProcessRow {
    let memory = process.memory();
    let command = if process.cmd().is_empty() {
        process.name().to_string()
    } else {
        process.cmd().join(" ")
    };
    ProcessRow {
        pid: process.pid().as_u32(),
        name: process.name().to_string(),
        user: process
            .user_id()
            .map(|uid| uid.to_string())
            .unwrap_or_else(|| "?".to_string()),
        cpu_percent: process.cpu_usage(),
        mem_percent: percent_of(memory, total_memory),
        memory_kb: memory / 1024,
        state: format!("{:?}", process.status()),
        run_time_secs: process.run_time(),
        command,
    }
}

fn percent_of(part: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64 * 100.0) as f32
    }
}

// Heaviest CPU users first, resident memory breaks ties.
fn busiest(mut rows: Vec<ProcessRow>, limit: usize) -> Vec<ProcessRow> {
    rows.sort_by(|a, b| {
        b.cpu_percent
            .total_cmp(&a.cpu_percent)
            .then(b.memory_kb.cmp(&a.memory_kb))
    });
    rows.truncate(limit);
    rows
}

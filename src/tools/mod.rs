mod container;
mod resources;
mod system;

pub use container::{ContainerHealth, ContainerMonitor, ContainerRuntime, ContainerStatus};
pub use resources::{CpuInfo, ProcessRow, ResourceMonitor, ResourceUsage};
pub use system::{HostInspector, SystemContext};

use async_trait::async_trait;

#[async_trait]
pub trait SystemInspector: Send + Sync {
    async fn system_context(&self) -> SystemContext;
}

#[async_trait]
pub trait ContainerHealthSource: Send + Sync {
    async fn container_health(&self) -> ContainerHealth;
}

#[async_trait]
pub trait ResourceSource: Send + Sync {
    async fn cpu_info(&self) -> CpuInfo;
    async fn resource_usage(&self) -> ResourceUsage;
}

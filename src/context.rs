use crate::analysis::{ErrorPattern, Verdict};
use crate::parser::DocumentMetadata;
use crate::taxonomy::ErrorCategory;
use crate::tools::{
    ContainerHealth, ContainerHealthSource, CpuInfo, ResourceSource, ResourceUsage,
};
use serde::{Deserialize, Serialize};
use tracing::info;

pub const MAX_CONTEXT_PATTERNS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdditionalContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_health: Option<ContainerHealth>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_usage: Option<ResourceUsage>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_info: Option<CpuInfo>,
    pub error_patterns: Vec<ErrorPattern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_metadata: Option<DocumentMetadata>,
    pub structured_parsing_available: bool,
}

#[derive(Debug, Clone)]
pub struct GatherRequest<'a> {
    pub verdict: Verdict,
    pub triage: bool,
    pub error_patterns: &'a [ErrorPattern],
    pub document_metadata: Option<&'a DocumentMetadata>,
    pub structured_parsing_available: bool,
}

pub fn wants_container_health(verdict: &Verdict) -> bool {
    verdict.category == ErrorCategory::Container
}

pub fn wants_resources(verdict: &Verdict, triage: bool) -> bool {
    verdict.impact.is_severe() || triage
}

pub struct ContextGatherer<'a> {
    containers: &'a dyn ContainerHealthSource,
    resources: &'a dyn ResourceSource,
}

impl<'a> ContextGatherer<'a> {
    pub fn new(
        containers: &'a dyn ContainerHealthSource,
        resources: &'a dyn ResourceSource,
    ) -> Self {
        Self {
            containers,
            resources,
        }
    }

    pub async fn gather(&self, request: GatherRequest<'_>) -> AdditionalContext {
        let mut context = AdditionalContext {
            error_patterns: request
                .error_patterns
                .iter()
                .take(MAX_CONTEXT_PATTERNS)
                .cloned()
                .collect(),
            document_metadata: request.document_metadata.cloned(),
            structured_parsing_available: request.structured_parsing_available,
            ..AdditionalContext::default()
        };

        if wants_container_health(&request.verdict) {
            info!("gathering container health");
            context.container_health = Some(self.containers.container_health().await);
        }

        if wants_resources(&request.verdict, request.triage) {
            info!("gathering resource snapshot");
            context.resource_usage = Some(self.resources.resource_usage().await);
            context.cpu_info = Some(self.resources.cpu_info().await);
        }

        context
    }
}

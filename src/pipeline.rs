use crate::ai::{Completion, ModelClient};
use crate::analysis::Verdict;
use crate::context::{ContextGatherer, GatherRequest};
use crate::error::RcaError;
use crate::progress::SpinnerGuard;
use crate::prompt::{self, PromptInput};
use crate::report::{AnalysisReport, DocumentParsingSummary, LessonsLearned, ReportStore};
use crate::scanner::{ScanRequest, SystemLogScanner};
use crate::tools::{ContainerHealthSource, ResourceSource, SystemInspector};
use chrono::Local;
use colored::*;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub description: String,
    pub scan: ScanRequest,
    pub triage: bool,
}

#[derive(Debug, Clone)]
pub struct RcaOutcome {
    pub analysis: String,
    pub verdict: Verdict,
    pub report_path: PathBuf,
    pub report: AnalysisReport,
}

pub struct Collaborators<'a> {
    pub system: &'a dyn SystemInspector,
    pub containers: &'a dyn ContainerHealthSource,
    pub resources: &'a dyn ResourceSource,
    pub model: &'a dyn ModelClient,
}

pub struct Pipeline<'a> {
    scanner: SystemLogScanner,
    collaborators: Collaborators<'a>,
    store: ReportStore,
    show_progress: bool,
    announce: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(scanner: SystemLogScanner, collaborators: Collaborators<'a>, store: ReportStore) -> Self {
        Self {
            scanner,
            collaborators,
            store,
            show_progress: false,
            announce: false,
        }
    }

    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_announcements(mut self, announce: bool) -> Self {
        self.announce = announce;
        self
    }

    fn stage(&self, label: &str, value: &str) {
        if self.announce {
            eprintln!("{} {}", label.cyan(), value.bold());
        }
    }

    pub async fn run(&self, request: &RunRequest) -> Result<RcaOutcome, RcaError> {
        let system_context = self.collaborators.system.system_context().await;

        let bundle = self.scanner.scan(&request.scan).await?;
        let log_text = bundle.text();
        let error_patterns = bundle.error_patterns();
        if !bundle.sources.is_empty() {
            self.stage("Log sources:", &bundle.source_names().join(", "));
        }
        if !error_patterns.is_empty() {
            self.stage("Error patterns found:", &error_patterns.len().to_string());
        }

        let verdict = Verdict::of(&request.description, &log_text);
        info!("classified as {} with {} impact", verdict.category, verdict.impact);
        self.stage("Error classified as:", &verdict.category.as_str().to_uppercase());
        self.stage("Impact level:", &verdict.impact.as_str().to_uppercase());

        let structured = self.scanner.structured_available();
        let context = ContextGatherer::new(self.collaborators.containers, self.collaborators.resources)
            .gather(GatherRequest {
                verdict,
                triage: request.triage,
                error_patterns: &error_patterns,
                document_metadata: bundle.metadata.as_ref(),
                structured_parsing_available: structured,
            })
            .await;

        let prompt = prompt::compose(&PromptInput {
            description: &request.description,
            verdict,
            system_context: &system_context,
            log_text: &log_text,
            context: &context,
            triage: request.triage,
        });

        let completion = self.ask_model(&prompt).await?;

        let report = AnalysisReport {
            timestamp: Local::now(),
            error_description: request.description.clone(),
            error_type: verdict.category,
            impact_level: verdict.impact,
            analysis: completion.text,
            model: Some(self.collaborators.model.describe()),
            scan_mode: bundle.mode,
            triage_mode: request.triage,
            system_context,
            document_parsing: DocumentParsingSummary {
                available: structured,
                metadata: bundle.metadata.clone(),
                error_patterns_found: error_patterns.len(),
            },
            additional_context: context,
            lessons_learned: LessonsLearned::default(),
        };

        let report_path = self.store.save(&report)?;
        info!("report saved to {}", report_path.display());

        Ok(RcaOutcome {
            analysis: report.analysis.clone(),
            verdict,
            report_path,
            report,
        })
    }

    async fn ask_model(&self, prompt: &str) -> Result<Completion, RcaError> {
        let label = format!("Analyzing with {}...", self.collaborators.model.describe());
        let spinner = SpinnerGuard::start(&label, self.show_progress);
        let result = self.collaborators.model.complete(prompt).await;
        let elapsed = spinner.elapsed();
        drop(spinner);

        match result {
            Ok(completion) => {
                info!("model answered in {:.1}s", elapsed.as_secs_f64());
                Ok(completion)
            }
            Err(e) => {
                warn!("model call failed after {:.1}s: {}", elapsed.as_secs_f64(), e);
                Err(RcaError::AnalysisFailed(e))
            }
        }
    }
}

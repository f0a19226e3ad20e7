use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use scout_core::{AnalysisError, CollectionPipeline, RunStage, StatusReporter, TargetHandle};
use scout_report::{report_file_name, ReportBuilder};
use tracing::{info, warn};

use crate::chat::{ChatApi, ChatStatusChannel, ChatTarget};
use crate::commands::{AnalysisLauncher, CommandRouteError};

/// Executes `/analyze` runs: pipeline, report, delivery.
#[derive(Clone)]
pub struct AnalysisRunner {
    pipeline: Arc<CollectionPipeline>,
    chat: Arc<dyn ChatApi>,
    report: ReportBuilder,
    active_runs: Arc<AtomicUsize>,
}

struct ActiveRun(Arc<AtomicUsize>);

impl ActiveRun {
    fn enter(counter: &Arc<AtomicUsize>) -> Self {
        counter.fetch_add(1, Ordering::SeqCst);
        Self(Arc::clone(counter))
    }
}

impl Drop for ActiveRun {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl AnalysisRunner {
    pub fn new(pipeline: Arc<CollectionPipeline>, chat: Arc<dyn ChatApi>) -> Self {
        Self {
            pipeline,
            chat,
            report: ReportBuilder::new(),
            active_runs: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn active_runs(&self) -> usize {
        self.active_runs.load(Ordering::SeqCst)
    }

    /// Runs one analysis to completion. Failures are shown to the user through
    /// the run's status message before being returned.
    pub async fn run(
        &self,
        chat: ChatTarget,
        handle: TargetHandle,
        correlation_id: String,
    ) -> Result<usize, AnalysisError> {
        let _active = ActiveRun::enter(&self.active_runs);
        let channel = ChatStatusChannel::new(Arc::clone(&self.chat), chat);
        let mut reporter = StatusReporter::new(channel, correlation_id.clone());

        info!(
            event_name = "run.started",
            correlation_id = %correlation_id,
            handle = %handle,
            chat = chat.0,
            "analysis run started"
        );

        let result = self.execute(chat, &handle, &mut reporter, &correlation_id).await;
        match &result {
            Ok(matches) => info!(
                event_name = "run.completed",
                correlation_id = %correlation_id,
                handle = %handle,
                matches,
                "analysis run completed"
            ),
            Err(error) => {
                warn!(
                    event_name = "run.failed",
                    correlation_id = %correlation_id,
                    handle = %handle,
                    error_class = error.error_class(),
                    error = %error,
                    "analysis run stopped"
                );
                reporter.report(&error.user_message()).await;
            }
        }

        result
    }

    async fn execute(
        &self,
        chat: ChatTarget,
        handle: &TargetHandle,
        reporter: &mut StatusReporter<ChatStatusChannel>,
        correlation_id: &str,
    ) -> Result<usize, AnalysisError> {
        let report = self.pipeline.run(handle, reporter, correlation_id).await?;

        reporter.report(&RunStage::BuildingReport.to_string()).await;
        let bytes = self
            .report
            .build(&report.rows)
            .map_err(|error| AnalysisError::ReportBuild(error.to_string()))?;

        let matches = report.rows.len();
        reporter.report(&RunStage::Completed { matches }.to_string()).await;

        let file_name = report_file_name(handle.as_str(), Utc::now());
        self.chat
            .send_document(chat, &file_name, bytes)
            .await
            .map_err(|error| AnalysisError::Delivery(error.to_string()))?;

        info!(
            event_name = "run.report.delivered",
            correlation_id,
            file_name = %file_name,
            followers_scanned = report.followers_scanned,
            matches,
            "report delivered"
        );
        Ok(matches)
    }
}

#[async_trait]
impl AnalysisLauncher for AnalysisRunner {
    async fn launch(
        &self,
        chat: ChatTarget,
        handle: TargetHandle,
        correlation_id: String,
    ) -> Result<(), CommandRouteError> {
        let runner = self.clone();
        tokio::spawn(async move {
            let _ = runner.run(chat, handle, correlation_id).await;
        });
        Ok(())
    }
}

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;
use chrono::Utc;
use scout_core::config::{AppConfig, LoadOptions};
use scout_core::{
    AnalysisError, CollectionPipeline, FilterStore, MessageHandle, RunStage, StatusChannel,
    StatusChannelError, StatusReporter, TargetHandle,
};
use scout_report::{report_file_name, ReportBuilder};
use scout_vendor::VendorClient;
use tracing::{info, warn};
use uuid::Uuid;

use super::CommandResult;

const COMMAND: &str = "analyze";

/// Prints each status update as its own line. An edit is a new line too,
/// since a terminal has no message to rewrite.
#[derive(Default)]
pub struct ConsoleStatus {
    echo: bool,
    next_id: AtomicI64,
    lines: Mutex<Vec<String>>,
}

impl ConsoleStatus {
    pub fn stdout() -> Self {
        Self { echo: true, ..Self::default() }
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn emit(&self, text: &str) {
        if self.echo {
            println!("{text}");
        }
        self.lines.lock().unwrap_or_else(PoisonError::into_inner).push(text.to_owned());
    }
}

#[async_trait]
impl StatusChannel for ConsoleStatus {
    async fn send(&self, text: &str) -> Result<MessageHandle, StatusChannelError> {
        self.emit(text);
        Ok(MessageHandle(self.next_id.fetch_add(1, Ordering::SeqCst)))
    }

    async fn edit(&self, _handle: MessageHandle, text: &str) -> Result<(), StatusChannelError> {
        self.emit(text);
        Ok(())
    }
}

#[derive(Debug)]
pub struct AnalyzeOutput {
    pub path: PathBuf,
    pub followers_scanned: usize,
    pub matches: usize,
}

#[derive(Debug)]
pub enum AnalyzeFailure {
    Analysis(AnalysisError),
    Write { path: PathBuf, source: std::io::Error },
}

impl AnalyzeFailure {
    fn into_result(self, handle: &TargetHandle) -> CommandResult {
        match self {
            Self::Analysis(error) => CommandResult::failure(
                COMMAND,
                error.error_class(),
                format!("analysis of `{handle}` stopped: {}", error.user_message()),
                4,
            ),
            Self::Write { path, source } => CommandResult::failure(
                COMMAND,
                "report_write",
                format!("could not write `{}`: {source}", path.display()),
                5,
            ),
        }
    }
}

/// Exit codes: 2 bad input or config, 3 vendor setup, 4 analysis stopped,
/// 5 report could not be written.
pub fn run(raw_handle: &str, output_dir: &Path) -> CommandResult {
    let Some(handle) = TargetHandle::parse(raw_handle) else {
        return CommandResult::failure(
            COMMAND,
            "invalid_handle",
            "a username is required, e.g. `scout analyze @some.creator`",
            2,
        );
    };

    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(COMMAND, "config_validation", error.to_string(), 2)
        }
    };
    crate::init_logging(&config.logging);

    let vendor = match VendorClient::new(&config.vendor) {
        Ok(vendor) => vendor,
        Err(error) => {
            return CommandResult::failure(COMMAND, "vendor_setup", error.to_string(), 3)
        }
    };

    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "runtime",
                format!("failed to initialize async runtime: {error}"),
                3,
            )
        }
    };

    let pipeline = CollectionPipeline::new(
        Arc::new(vendor),
        FilterStore::new(config.filters),
        config.pipeline.settings(),
    );
    let correlation_id = Uuid::new_v4().to_string();

    let outcome = runtime.block_on(analyze_to_dir(
        &pipeline,
        &handle,
        output_dir,
        ConsoleStatus::stdout(),
        &correlation_id,
    ));

    match outcome {
        Ok(output) => CommandResult::success(
            COMMAND,
            format!(
                "{} of {} followers matched; report written to {}",
                output.matches,
                output.followers_scanned,
                output.path.display()
            ),
        ),
        Err(failure) => failure.into_result(&handle),
    }
}

/// Same steps as a chat run, with the spreadsheet landing in `output_dir`.
pub async fn analyze_to_dir<C>(
    pipeline: &CollectionPipeline,
    handle: &TargetHandle,
    output_dir: &Path,
    channel: C,
    correlation_id: &str,
) -> Result<AnalyzeOutput, AnalyzeFailure>
where
    C: StatusChannel,
{
    let mut reporter = StatusReporter::new(channel, correlation_id);
    info!(
        event_name = "run.started",
        correlation_id,
        handle = %handle,
        output_dir = %output_dir.display(),
        "offline analysis started"
    );

    let report = match pipeline.run(handle, &mut reporter, correlation_id).await {
        Ok(report) => report,
        Err(error) => {
            warn!(
                event_name = "run.failed",
                correlation_id,
                handle = %handle,
                error_class = error.error_class(),
                error = %error,
                "offline analysis stopped"
            );
            reporter.report(&error.user_message()).await;
            return Err(AnalyzeFailure::Analysis(error));
        }
    };

    reporter.report(&RunStage::BuildingReport.to_string()).await;
    let bytes = ReportBuilder::new().build(&report.rows).map_err(|error| {
        AnalyzeFailure::Analysis(AnalysisError::ReportBuild(error.to_string()))
    })?;

    let matches = report.rows.len();
    reporter.report(&RunStage::Completed { matches }.to_string()).await;

    let path = output_dir.join(report_file_name(handle.as_str(), Utc::now()));
    tokio::fs::create_dir_all(output_dir)
        .await
        .map_err(|source| AnalyzeFailure::Write { path: output_dir.to_path_buf(), source })?;
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|source| AnalyzeFailure::Write { path: path.clone(), source })?;

    info!(
        event_name = "run.report.written",
        correlation_id,
        path = %path.display(),
        followers_scanned = report.followers_scanned,
        matches,
        "report written"
    );

    Ok(AnalyzeOutput { path, followers_scanned: report.followers_scanned, matches })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use scout_core::{
        AccountId, AnalysisError, CollectionPipeline, FetchOutcome, FilterConfig, FilterStore,
        FollowerRecord, PipelineSettings, PostSummary, SocialDataApi, TargetHandle,
    };

    use super::{analyze_to_dir, AnalyzeFailure, ConsoleStatus};

    struct FixtureApi {
        resolves: bool,
        followers: Vec<FollowerRecord>,
        views: HashMap<String, Vec<u64>>,
    }

    #[async_trait]
    impl SocialDataApi for FixtureApi {
        async fn resolve_account(&self, _handle: &TargetHandle) -> FetchOutcome<AccountId> {
            if self.resolves {
                FetchOutcome::Data(AccountId("SEC-TARGET".to_owned()))
            } else {
                FetchOutcome::Empty
            }
        }

        async fn list_followers_page(
            &self,
            _account: &AccountId,
            offset: u32,
            _page_size: u32,
        ) -> FetchOutcome<Vec<FollowerRecord>> {
            if offset == 0 {
                FetchOutcome::Data(self.followers.clone())
            } else {
                FetchOutcome::Empty
            }
        }

        async fn list_posts(&self, account: &AccountId) -> FetchOutcome<Vec<PostSummary>> {
            match self.views.get(account.as_str()) {
                Some(views) => FetchOutcome::Data(
                    views.iter().map(|views| PostSummary { views: *views }).collect(),
                ),
                None => FetchOutcome::Empty,
            }
        }
    }

    fn follower(handle: &str, follower_count: u64) -> FollowerRecord {
        FollowerRecord {
            handle: handle.to_owned(),
            account_id: Some(AccountId(handle.to_owned())),
            display_name: handle.to_owned(),
            follower_count,
            biography: String::new(),
        }
    }

    fn pipeline(api: FixtureApi) -> CollectionPipeline {
        CollectionPipeline::new(
            Arc::new(api),
            FilterStore::new(FilterConfig::default()),
            PipelineSettings { page_delay: Duration::ZERO, ..PipelineSettings::default() },
        )
    }

    fn handle() -> TargetHandle {
        TargetHandle::parse("@Target").unwrap_or_else(|| panic!("valid handle"))
    }

    #[tokio::test]
    async fn matching_run_writes_xlsx_into_output_dir() {
        let dir = tempfile::tempdir().unwrap_or_else(|error| panic!("tempdir: {error}"));
        let output_dir = dir.path().join("reports");
        let api = FixtureApi {
            resolves: true,
            followers: vec![follower("small", 10), follower("quiet", 20)],
            views: HashMap::from([("small".to_owned(), vec![7_000, 12_000])]),
        };
        let status = ConsoleStatus::default();

        let output = analyze_to_dir(&pipeline(api), &handle(), &output_dir, &status, "cli-ok")
            .await
            .unwrap_or_else(|error| panic!("analysis should succeed: {error:?}"));

        assert_eq!(output.matches, 1);
        assert_eq!(output.followers_scanned, 2);
        assert!(output.path.starts_with(&output_dir));
        let bytes = std::fs::read(&output.path).unwrap_or_else(|error| panic!("{error}"));
        assert_eq!(&bytes[..2], b"PK");
        assert_eq!(
            status.lines().last().map(String::as_str),
            Some("✅ Found 1 matching accounts!")
        );
    }

    #[tokio::test]
    async fn unresolved_account_prints_user_message_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap_or_else(|error| panic!("tempdir: {error}"));
        let api = FixtureApi { resolves: false, followers: Vec::new(), views: HashMap::new() };
        let status = ConsoleStatus::default();

        let result =
            analyze_to_dir(&pipeline(api), &handle(), dir.path(), &status, "cli-missing").await;

        assert!(matches!(result, Err(AnalyzeFailure::Analysis(AnalysisError::NotFound))));
        assert_eq!(status.lines().last().cloned(), Some(AnalysisError::NotFound.user_message()));
        let entries = std::fs::read_dir(dir.path()).map(Iterator::count).unwrap_or_default();
        assert_eq!(entries, 0);
    }
}

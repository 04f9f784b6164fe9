//! Per-run and per-scenario hooks
//!
//! `run_starting` once, then `before_scenario`/`after_scenario` around each
//! scenario, then `run_finished`. Scenarios never overlap.

use super::capture::{capture_screenshot, extract_causal_error, ScenarioOutcome};
use super::context::RunContext;
use crate::driver::traits::BrowserSession;
use crate::report::{junit, LogEntry, NodeHandle, Status};
use crate::utils::config::HarnessConfig;
use crate::utils::interrupt::Interrupt;
use anyhow::{Context, Result};
use colored::Colorize;
use regex::Regex;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;

/// Message of the fail entry added to a failed scenario's node
pub const FAILURE_MESSAGE: &str = "The test has failed.";

/// Scenario identity as seen by the lifecycle hooks
#[derive(Debug, Clone, Default)]
pub struct ScenarioInfo {
    pub name: String,
    /// Stable id, `<feature>;<scenario>`
    pub id: String,
    pub tags: Vec<String>,
    /// Feature file the scenario came from
    pub uri: Option<PathBuf>,
    pub line: usize,
}

impl ScenarioInfo {
    /// `path:line` entry for the rerun file
    pub fn location(&self) -> Option<String> {
        self.uri
            .as_ref()
            .map(|uri| format!("{}:{}", uri.display(), self.line))
    }

    /// Report category derived from the id: everything before the first `;`
    pub fn feature_category(&self) -> String {
        static SUFFIX: OnceLock<Option<Regex>> = OnceLock::new();
        let stripped = SUFFIX
            .get_or_init(|| Regex::new(";.*").ok())
            .as_ref()
            .map(|re| re.replace(&self.id, "").into_owned())
            .unwrap_or_else(|| self.id.clone());
        format!("feature:{}", stripped)
    }
}

#[derive(Default)]
struct LifecycleState {
    current: Option<(ScenarioInfo, NodeHandle)>,
    scenarios: usize,
    failed: Vec<String>,
    failed_count: usize,
}

/// Scenario lifecycle manager
pub struct Lifecycle {
    ctx: Arc<RunContext>,
    state: Mutex<LifecycleState>,
}

impl Lifecycle {
    /// Prepare directories and the report for a new run
    pub fn run_starting(config: HarnessConfig, interrupt: Interrupt) -> Result<Self> {
        let ctx = RunContext::new(config, interrupt).context("Failed to initialize the run")?;
        println!(
            "{} Report: {}",
            "📊".blue(),
            ctx.config.report_path().display().to_string().cyan()
        );
        Ok(Self {
            ctx: Arc::new(ctx),
            state: Mutex::new(LifecycleState::default()),
        })
    }

    pub fn context(&self) -> &Arc<RunContext> {
        &self.ctx
    }

    /// Open the report node of a scenario about to run
    pub async fn before_scenario(&self, info: ScenarioInfo) -> NodeHandle {
        let id = {
            let mut report = self.ctx.report.lock().await;
            let id = report.create_node(&format!("Scenario: {}", info.name), &info.name, None);
            report.assign_category(id, &info.feature_category());
            for tag in &info.tags {
                let tag = if tag.starts_with('@') {
                    tag.clone()
                } else {
                    format!("@{}", tag)
                };
                report.assign_category(id, &tag);
            }
            id
        };
        let node = NodeHandle::new(self.ctx.report.clone(), id);

        println!("\n{} Scenario: {}", "▶".cyan(), info.name.bold());
        log::debug!("Scenario id {} tags {:?}", info.id, info.tags);

        let mut state = self.state.lock().await;
        state.scenarios += 1;
        if let Some((stale, _)) = state.current.replace((info, node.clone())) {
            log::warn!("Scenario '{}' never reached teardown", stale.name);
        }
        node
    }

    /// Record the outcome, flush the report and release the browser.
    ///
    /// The report is flushed and the session quit even when the screenshot
    /// fails; the first error is returned afterwards.
    pub async fn after_scenario(
        &self,
        session: Option<Arc<dyn BrowserSession>>,
        outcome: &dyn ScenarioOutcome,
    ) -> Result<()> {
        let current = self.state.lock().await.current.take();
        let Some((info, node)) = current else {
            anyhow::bail!("Scenario teardown without a matching setup");
        };

        let failed = outcome.is_failed();
        let mut capture_result = Ok(());

        if failed {
            let error = extract_causal_error(outcome);
            let media = match &session {
                Some(session) => {
                    match capture_screenshot(session.as_ref(), &self.ctx.images_dir).await {
                        Ok(media) => Some(media),
                        Err(e) => {
                            capture_result = Err(e);
                            None
                        }
                    }
                }
                None => None,
            };

            node.log(
                LogEntry::new(Status::Fail, FAILURE_MESSAGE)
                    .with_details(error.clone())
                    .with_media(media),
            )
            .await;

            let mut state = self.state.lock().await;
            state.failed_count += 1;
            if let Some(location) = info.location() {
                state.failed.push(location);
            }

            println!(
                "{} Scenario failed: {}{}",
                "✗".red(),
                info.name.red(),
                error.map(|e| format!("\n    {}", e)).unwrap_or_default()
            );
        } else {
            println!("{} Scenario passed: {}", "✓".green(), info.name);
        }

        node.close().await;
        let flush_result = self.flush().await;

        let quit_result = match &session {
            Some(session) => session.quit().await.context("Failed to close the browser"),
            None => Ok(()),
        };

        flush_result?;
        capture_result?;
        quit_result
    }

    /// Flush the report to disk. Errors here are fatal for the run.
    pub async fn flush(&self) -> Result<()> {
        let mut report = self.ctx.report.lock().await;
        report.flush().context("Failed to flush the report")
    }

    /// Final flush plus JUnit and rerun files. Returns the failed scenario count.
    pub async fn run_finished(&self) -> Result<usize> {
        self.flush().await?;

        {
            let report = self.ctx.report.lock().await;
            junit::write_report(&report, &self.ctx.report_dir)
                .context("Failed to write the JUnit report")?;
        }

        let state = self.state.lock().await;
        let rerun = &self.ctx.config.rerun_file;
        if let Some(parent) = rerun.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        std::fs::write(rerun, state.failed.join("\n"))
            .with_context(|| format!("Failed to write {}", rerun.display()))?;

        let passed = state.scenarios - state.failed_count;
        println!(
            "\n{} {} scenarios: {} passed, {} failed",
            "🏁".blue(),
            state.scenarios,
            passed.to_string().green(),
            state.failed_count.to_string().red()
        );
        println!(
            "{} HTML report saved to: {}",
            "📊".blue(),
            self.ctx.config.report_path().display().to_string().cyan()
        );

        Ok(state.failed_count)
    }
}

use crate::driver::traits::BrowserSession;
use crate::report::encoding::Charset;
use crate::report::{ReportRun, SharedReport};
use crate::utils::config::HarnessConfig;
use crate::utils::interrupt::Interrupt;
use crate::wait::WaitEngine;
use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Everything shared across the scenarios of one run
pub struct RunContext {
    pub config: HarnessConfig,

    /// Report of the whole run
    pub report: SharedReport,

    pub interrupt: Interrupt,

    pub report_dir: PathBuf,

    /// Screenshots, referenced from the report as `img/<file>`
    pub images_dir: PathBuf,

    /// Browser download directory (absolute)
    pub download_dir: PathBuf,
}

impl RunContext {
    /// Create the output directories and an empty report bound to them
    pub fn new(config: HarnessConfig, interrupt: Interrupt) -> Result<Self> {
        let report_dir = config.report_dir.clone();
        let images_dir = config.images_dir();

        std::fs::create_dir_all(&images_dir)
            .with_context(|| format!("Failed to create {}", images_dir.display()))?;
        std::fs::create_dir_all(&config.download_dir)
            .with_context(|| format!("Failed to create {}", config.download_dir.display()))?;

        // Browsers want an absolute download path
        let download_dir = std::fs::canonicalize(&config.download_dir)
            .unwrap_or_else(|_| config.download_dir.clone());

        let mut run = ReportRun::new(config.report_path(), &config.run_name, config.encoding);
        run.add_system_info("os.name", std::env::consts::OS);
        run.add_system_info("os.arch", std::env::consts::ARCH);
        if config.encoding != Charset::Latin1 {
            run.add_system_info("report.encoding", config.encoding.as_str());
        }

        Ok(Self {
            report: Arc::new(Mutex::new(run)),
            interrupt,
            report_dir,
            images_dir,
            download_dir,
            config,
        })
    }

    pub fn wait_engine(&self, session: Arc<dyn BrowserSession>) -> WaitEngine {
        WaitEngine::new(session, self.interrupt.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_new_creates_directories_and_report() {
        let tmp = tempfile::tempdir().unwrap();
        let config = HarnessConfig {
            report_dir: tmp.path().join("report/html"),
            download_dir: tmp.path().join("temp"),
            ..HarnessConfig::default()
        };

        let ctx = RunContext::new(config, Interrupt::new()).unwrap();

        assert!(ctx.images_dir.is_dir());
        assert!(ctx.download_dir.is_absolute());
        assert!(ctx.download_dir.is_dir());
        let report = ctx.report.lock().await;
        assert_eq!(
            report.report_path,
            tmp.path().join("report/html/RunnerTest.html")
        );
        assert_eq!(
            report.system_info.get("os.name").map(String::as_str),
            Some(std::env::consts::OS)
        );
    }
}

use crate::report::encoding::Charset;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Run configuration of the storefront harness
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    /// Directory (or single file) of `.feature` files
    pub features: PathBuf,

    /// Scenarios run only when they, their rule or their feature carry this tag
    pub tag: String,

    /// Where the HTML report, its JSON sidecar and `img/` go
    pub report_dir: PathBuf,

    /// Report file stem
    pub run_name: String,

    /// Charset of the HTML report
    pub encoding: Charset,

    /// Browser download directory
    pub download_dir: PathBuf,

    /// `feature:line` list of failed scenarios
    pub rerun_file: PathBuf,

    pub browser: BrowserConfig,

    pub download_timeout_secs: u64,

    /// CSS selector of the page's loading indicator
    pub loading_selector: String,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            features: PathBuf::from("features"),
            tag: "test".to_string(),
            report_dir: PathBuf::from("target/report/html"),
            run_name: "RunnerTest".to_string(),
            encoding: Charset::Latin1,
            download_dir: PathBuf::from("target/temp"),
            rerun_file: PathBuf::from("target/rerun.txt"),
            browser: BrowserConfig::default(),
            download_timeout_secs: 10,
            loading_selector: "#loading".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    pub headless: bool,

    /// Emulate `device` instead of a desktop window
    pub mobile_emulation: bool,

    pub device: String,

    pub viewport: Viewport,

    /// Chromium binary to launch instead of the bundled one
    pub executable: Option<PathBuf>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: false,
            mobile_emulation: false,
            device: "iPhone X".to_string(),
            viewport: Viewport::default(),
            executable: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1366,
            height: 768,
        }
    }
}

impl HarnessConfig {
    /// Load from a YAML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    /// Apply `LUMI_HEADLESS`, `LUMI_MOBILE` and
    /// `PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH` from the process environment
    pub fn apply_env(&mut self) {
        self.apply_vars(|key| std::env::var(key).ok());
    }

    pub(crate) fn apply_vars(&mut self, var: impl Fn(&str) -> Option<String>) {
        if let Some(v) = var("LUMI_HEADLESS").and_then(|v| parse_flag(&v)) {
            self.browser.headless = v;
        }
        if let Some(v) = var("LUMI_MOBILE").and_then(|v| parse_flag(&v)) {
            self.browser.mobile_emulation = v;
        }
        if let Some(path) = var("PLAYWRIGHT_CHROMIUM_EXECUTABLE_PATH").filter(|p| !p.is_empty()) {
            self.browser.executable = Some(PathBuf::from(path));
        }
    }

    pub fn report_path(&self) -> PathBuf {
        self.report_dir.join(format!("{}.html", self.run_name))
    }

    pub fn images_dir(&self) -> PathBuf {
        self.report_dir.join("img")
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

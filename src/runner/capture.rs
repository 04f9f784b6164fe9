//! Failure capture on scenario teardown

use crate::driver::traits::BrowserSession;
use crate::utils::time;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::Path;

/// What the test runner reports about a finished scenario
pub trait ScenarioOutcome {
    fn is_failed(&self) -> bool;

    /// Message of the error that failed the scenario.
    ///
    /// `Ok(None)` when the outcome carries no error; `Err` when the runner's
    /// payload could not be read.
    fn causal_error(&self) -> Result<Option<String>>;
}

/// Causal error of a failed scenario. Introspection failures are logged and
/// yield `None` so teardown can continue.
pub fn extract_causal_error(outcome: &dyn ScenarioOutcome) -> Option<String> {
    match outcome.causal_error() {
        Ok(error) => error,
        Err(e) => {
            log::error!("Could not read the scenario failure: {:#}", e);
            None
        }
    }
}

/// Save a PNG of the viewport under `images_dir` and return its reference
/// relative to the report directory (`img/<stamp>.png`).
pub async fn capture_screenshot(session: &dyn BrowserSession, images_dir: &Path) -> Result<String> {
    let bytes = session
        .screenshot_png()
        .await
        .context("Failed to capture screenshot")?;

    std::fs::create_dir_all(images_dir)
        .with_context(|| format!("Failed to create {}", images_dir.display()))?;

    let file_name = write_unique(images_dir, &time::screenshot_stamp(), &bytes)?;
    log::debug!("Screenshot saved to {}", images_dir.join(&file_name).display());
    Ok(format!("img/{}", file_name))
}

/// Write `<stamp>.png`, or `<stamp>_<n>.png` when earlier captures already
/// took the name. Returns the file name used.
fn write_unique(images_dir: &Path, stamp: &str, bytes: &[u8]) -> Result<String> {
    for attempt in 0u32.. {
        let file_name = match attempt {
            0 => format!("{}.png", stamp),
            n => format!("{}_{}.png", stamp, n),
        };
        let path = images_dir.join(&file_name);

        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(bytes)
                    .with_context(|| format!("Failed to write screenshot {}", path.display()))?;
                return Ok(file_name);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to write screenshot {}", path.display()))
            }
        }
    }
    anyhow::bail!("No free screenshot name for {} in {}", stamp, images_dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::fake::FakeSession;

    struct Outcome(Result<Option<String>>);

    impl ScenarioOutcome for Outcome {
        fn is_failed(&self) -> bool {
            true
        }

        fn causal_error(&self) -> Result<Option<String>> {
            match &self.0 {
                Ok(e) => Ok(e.clone()),
                Err(e) => Err(anyhow::anyhow!("{}", e)),
            }
        }
    }

    #[test]
    fn test_introspection_failure_degrades_to_none() {
        let broken = Outcome(Err(anyhow::anyhow!("payload is not a string")));
        assert_eq!(extract_causal_error(&broken), None);

        let ok = Outcome(Ok(Some("assertion failed".into())));
        assert_eq!(extract_causal_error(&ok).as_deref(), Some("assertion failed"));
    }

    #[tokio::test]
    async fn test_screenshot_lands_in_images_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let images = tmp.path().join("img");

        let reference = capture_screenshot(&FakeSession::new(), &images).await.unwrap();

        assert!(reference.starts_with("img/"));
        assert!(reference.ends_with(".png"));
        let file = tmp.path().join(&reference);
        assert!(std::fs::read(file).unwrap().starts_with(b"\x89PNG"));
    }

    #[tokio::test]
    async fn test_screenshot_failure_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let session = FakeSession::new().failing_screenshots();

        let err = capture_screenshot(&session, tmp.path()).await.unwrap_err();
        assert!(format!("{:#}", err).contains("page crashed"));
    }

    #[test]
    fn test_same_stamp_does_not_overwrite() {
        let tmp = tempfile::tempdir().unwrap();
        let stamp = "19102026_101500123";

        let first = write_unique(tmp.path(), stamp, b"first").unwrap();
        let second = write_unique(tmp.path(), stamp, b"second").unwrap();

        assert_eq!(first, "19102026_101500123.png");
        assert_eq!(second, "19102026_101500123_1.png");
        assert_eq!(std::fs::read(tmp.path().join(&first)).unwrap(), b"first");
        assert_eq!(std::fs::read(tmp.path().join(&second)).unwrap(), b"second");
    }
}

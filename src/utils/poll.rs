//! Filesystem polling helpers
//!
//! Unlike the element waits these never fail on timeout: the caller gets
//! `Ok(false)` and a warning goes to the log.

use crate::utils::interrupt::Interrupt;
use crate::wait::WaitError;
use std::path::Path;
use std::time::Duration;
use tokio::time::Instant;
use walkdir::WalkDir;

/// Poll interval of [`wait_for_file_in_dir`]
pub const FILE_POLL: Duration = Duration::from_millis(200);

/// Evaluate `predicate` until it holds or `timeout` elapses.
///
/// Returns `Ok(true)` as soon as the predicate holds and `Ok(false)` once the
/// budget is spent. `resource` names what was awaited in the timeout warning.
pub async fn wait_for_condition<F>(
    mut predicate: F,
    timeout: Duration,
    poll_interval: Duration,
    resource: &str,
    interrupt: &Interrupt,
) -> Result<bool, WaitError>
where
    F: FnMut() -> bool,
{
    let start = Instant::now();

    loop {
        if interrupt.is_set() {
            return Err(WaitError::Interrupted {
                what: resource.to_string(),
            });
        }

        if predicate() {
            return Ok(true);
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            log::warn!(
                "Timed out waiting for {} after {:.1}s",
                resource,
                elapsed.as_secs_f64()
            );
            return Ok(false);
        }

        tokio::time::sleep(poll_interval.min(timeout - elapsed)).await;
    }
}

/// Whether `dir` holds at least one regular file. A missing directory is empty.
pub fn dir_has_file(dir: &Path) -> bool {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .any(|e| e.file_type().is_file())
}

/// Wait until a file lands in `dir`, e.g. a browser download
pub async fn wait_for_file_in_dir(
    dir: &Path,
    timeout: Duration,
    interrupt: &Interrupt,
) -> Result<bool, WaitError> {
    let resource = format!("a file in {}", dir.display());
    wait_for_condition(|| dir_has_file(dir), timeout, FILE_POLL, &resource, interrupt).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test(start_paused = true)]
    async fn test_file_arriving_mid_wait_is_seen_within_one_poll() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();
        let target = dir.join("report.pdf");

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(3)).await;
            fs::write(target, b"%PDF").unwrap();
        });

        let start = Instant::now();
        let found = wait_for_file_in_dir(&dir, Duration::from_secs(10), &Interrupt::new())
            .await
            .unwrap();

        assert!(found);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert!(start.elapsed() <= Duration::from_millis(3_200));
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_dir_times_out_as_false() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = tmp.path().join("not-created");

        let start = Instant::now();
        let found = wait_for_file_in_dir(&missing, Duration::from_secs(2), &Interrupt::new())
            .await
            .unwrap();

        assert!(!found);
        assert!(start.elapsed() >= Duration::from_secs(2));
        assert!(start.elapsed() <= Duration::from_secs(2) + FILE_POLL);
    }

    #[test]
    fn test_subdirectories_do_not_count_as_files() {
        let tmp = tempfile::tempdir().unwrap();
        fs::create_dir(tmp.path().join("partial")).unwrap();
        assert!(!dir_has_file(tmp.path()));

        fs::write(tmp.path().join("partial").join("nested.bin"), b"x").unwrap();
        assert!(!dir_has_file(tmp.path()));

        fs::write(tmp.path().join("done.csv"), b"a,b").unwrap();
        assert!(dir_has_file(tmp.path()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_ends_poll_with_error() {
        let interrupt = Interrupt::new();
        interrupt.trigger();

        let err = wait_for_condition(
            || false,
            Duration::from_secs(30),
            Duration::from_millis(200),
            "nothing",
            &interrupt,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, WaitError::Interrupted { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_holding_condition_returns_immediately() {
        let mut calls = 0;
        let start = Instant::now();
        let ok = wait_for_condition(
            || {
                calls += 1;
                true
            },
            Duration::from_secs(5),
            Duration::from_millis(200),
            "anything",
            &Interrupt::new(),
        )
        .await
        .unwrap();

        assert!(ok);
        assert_eq!(calls, 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}

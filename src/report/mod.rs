pub mod encoding;
pub mod html;
pub mod json;
pub mod junit;
pub mod node;
pub mod types;

pub use node::{NodeHandle, SharedReport};
pub use types::{LogEntry, NodeId, ReportError, ReportRun, Status};

use anyhow::Result;
use std::path::Path;

/// Generate report from a saved run
pub async fn generate_report(
    results_path: &Path,
    format: &str,
    output: Option<&Path>,
) -> Result<()> {
    let run = json::load(results_path)?;

    match format {
        "json" => json::generate(&run, output).await,
        "html" => html::generate(&run, output).await,
        "junit" => {
            let xml = junit::generate_junit_xml(&run)?;
            if let Some(path) = output {
                std::fs::write(path, xml)?;
                println!("JUnit report saved to: {}", path.display());
            } else {
                println!("{}", xml);
            }
            Ok(())
        }
        _ => anyhow::bail!("Unknown format: {}", format),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::encoding::Charset;

    #[tokio::test]
    async fn test_regenerate_from_flushed_json() {
        let tmp = tempfile::tempdir().unwrap();
        let mut run = ReportRun::new(tmp.path().join("RunnerTest.html"), "RunnerTest", Charset::Utf8);
        let id = run.create_node("Scenario: Compra", "Compra", None);
        run.log(id, LogEntry::new(Status::Pass, "ok"));
        run.flush().unwrap();

        let out = tmp.path().join("again.xml");
        generate_report(&run.json_path(), "junit", Some(&out))
            .await
            .unwrap();
        let xml = std::fs::read_to_string(&out).unwrap();
        assert!(xml.contains(r#"<testcase name="Scenario: Compra""#));

        let err = generate_report(&run.json_path(), "pdf", None).await;
        assert!(err.is_err());
    }
}

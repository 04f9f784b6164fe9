use super::types::ReportRun;
use anyhow::Result;
use std::path::Path;

/// Generate JSON report
pub async fn generate(run: &ReportRun, output: Option<&Path>) -> Result<()> {
    let json = serde_json::to_string_pretty(run)?;

    if let Some(path) = output {
        std::fs::write(path, json)?;
        println!("JSON report saved to: {}", path.display());
    } else {
        println!("{}", json);
    }

    Ok(())
}

/// Load a run saved by a flush
pub fn load(path: &Path) -> Result<ReportRun> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

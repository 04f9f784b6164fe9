use super::types::{ReportNode, ReportRun, Status};
use anyhow::Result;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;
use std::path::Path;

/// Generate JUnit XML with one testcase per scenario node
pub fn generate_junit_xml(run: &ReportRun) -> Result<String> {
    let mut writer = Writer::new(Cursor::new(Vec::new()));

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let total_tests = run.roots().count();
    let failures = run.failed_count();
    let skipped = run
        .roots()
        .filter(|n| run.status(n.id) == Status::Skip)
        .count();
    let total_ms: u64 = run.roots().filter_map(|n| n.duration_ms).sum();
    let time = seconds(total_ms);

    let mut suites_start = BytesStart::new("testsuites");
    suites_start.push_attribute(("name", run.run_name.as_str()));
    suites_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suites_start.push_attribute(("failures", failures.to_string().as_str()));
    suites_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suites_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(suites_start))?;

    let mut suite_start = BytesStart::new("testsuite");
    suite_start.push_attribute(("name", run.run_name.as_str()));
    suite_start.push_attribute(("tests", total_tests.to_string().as_str()));
    suite_start.push_attribute(("failures", failures.to_string().as_str()));
    suite_start.push_attribute(("skipped", skipped.to_string().as_str()));
    suite_start.push_attribute(("id", run.session_id.as_str()));
    suite_start.push_attribute(("time", time.as_str()));
    suite_start.push_attribute(("timestamp", run.started_at.as_str()));
    writer.write_event(Event::Start(suite_start))?;

    for node in run.roots() {
        write_test_case(&mut writer, run, node)?;
    }

    writer.write_event(Event::End(BytesEnd::new("testsuite")))?;
    writer.write_event(Event::End(BytesEnd::new("testsuites")))?;

    let xml = String::from_utf8(writer.into_inner().into_inner())?;
    Ok(xml)
}

fn write_test_case<W: std::io::Write>(
    writer: &mut Writer<W>,
    run: &ReportRun,
    node: &ReportNode,
) -> Result<()> {
    let classname = node
        .categories
        .iter()
        .find_map(|c| c.strip_prefix("feature:"))
        .unwrap_or("scenario");
    let time = seconds(node.duration_ms.unwrap_or(0));

    let mut case_start = BytesStart::new("testcase");
    case_start.push_attribute(("name", node.name.as_str()));
    case_start.push_attribute(("classname", classname));
    case_start.push_attribute(("time", time.as_str()));
    writer.write_event(Event::Start(case_start))?;

    match run.status(node.id) {
        status if status.is_failure() => {
            let entry = first_failure(run, node);
            let message = entry.map(|e| e.message.as_str()).unwrap_or("Unknown error");
            let details = entry.and_then(|e| e.details.as_deref());

            let mut fail_start = BytesStart::new("failure");
            fail_start.push_attribute(("message", message));
            fail_start.push_attribute(("type", status.as_str()));
            writer.write_event(Event::Start(fail_start))?;
            if let Some(details) = details {
                writer.write_event(Event::Text(BytesText::new(details)))?;
            }
            writer.write_event(Event::End(BytesEnd::new("failure")))?;
        }
        Status::Skip => {
            writer.write_event(Event::Empty(BytesStart::new("skipped")))?;
        }
        _ => {}
    }

    writer.write_event(Event::End(BytesEnd::new("testcase")))?;
    Ok(())
}

/// First fail/error entry of the node or, failing that, of its children
fn first_failure<'a>(
    run: &'a ReportRun,
    node: &'a ReportNode,
) -> Option<&'a super::types::LogEntry> {
    node.entries
        .iter()
        .find(|e| e.status.is_failure())
        .or_else(|| run.children(node).find_map(|c| first_failure(run, c)))
}

fn seconds(ms: u64) -> String {
    (ms as f64 / 1000.0).to_string()
}

/// Write report to file
pub fn write_report(run: &ReportRun, output_dir: &Path) -> Result<()> {
    let xml = generate_junit_xml(run)?;
    let path = output_dir.join("junit.xml");
    std::fs::write(&path, xml)?;
    println!("    Generated JUnit report: {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::encoding::Charset;
    use crate::report::types::LogEntry;

    #[test]
    fn test_generate_junit_xml() {
        let mut run = ReportRun::new("out/RunnerTest.html", "RunnerTest", Charset::Latin1);

        let ok = run.create_node("Scenario: Buscar produto", "Buscar produto", None);
        run.assign_category(ok, "feature:compra");
        run.log(ok, LogEntry::new(Status::Pass, "Pesquisa realizada"));

        let bad = run.create_node("Scenario: Carrinho", "Carrinho", None);
        run.log(
            bad,
            LogEntry::new(Status::Fail, "The test has failed.")
                .with_details(Some("Element not found".into())),
        );

        let xml = generate_junit_xml(&run).expect("Failed to generate XML");

        assert!(xml.contains(r#"<testsuites name="RunnerTest""#));
        assert!(xml.contains(r#"tests="2""#));
        assert!(xml.contains(r#"failures="1""#));
        assert!(xml.contains(r#"<testcase name="Scenario: Buscar produto" classname="compra""#));
        assert!(xml.contains(r#"message="The test has failed.""#));
        assert!(xml.contains("Element not found"));
    }

    #[test]
    fn test_failure_in_child_node_is_reported() {
        let mut run = ReportRun::new("out/r.html", "r", Charset::Utf8);
        let parent = run.create_node("Scenario: Pai", "Pai", None);
        let child = run.create_node("Download", "", Some(parent));
        run.log(child, LogEntry::new(Status::Error, "download never arrived"));

        let xml = generate_junit_xml(&run).unwrap();
        assert!(xml.contains(r#"message="download never arrived""#));
        assert!(xml.contains(r#"type="error""#));
        assert!(!xml.contains(r#"name="Download""#));
    }
}

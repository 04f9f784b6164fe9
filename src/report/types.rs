use super::encoding::Charset;
use crate::utils::time;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("failed to write report file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Outcome class of a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Pass,
    Fail,
    Info,
    Skip,
    Error,
}

impl Status {
    fn severity(self) -> u8 {
        match self {
            Status::Info => 0,
            Status::Pass => 1,
            Status::Skip => 2,
            Status::Error => 3,
            Status::Fail => 4,
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Status::Fail | Status::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Pass => "pass",
            Status::Fail => "fail",
            Status::Info => "info",
            Status::Skip => "skip",
            Status::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub status: Status,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    /// Image path relative to the report directory
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media: Option<String>,
    pub timestamp: String,
}

impl LogEntry {
    pub fn new(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
            media: None,
            timestamp: time::date_time(TIMESTAMP_FORMAT),
        }
    }

    pub fn with_details(mut self, details: Option<String>) -> Self {
        self.details = details;
        self
    }

    pub fn with_media(mut self, media: Option<String>) -> Self {
        self.media = media;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub usize);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportNode {
    pub id: NodeId,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub entries: Vec<LogEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    #[serde(default)]
    pub children: Vec<NodeId>,
    pub started_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub closed: bool,
    #[serde(skip)]
    started: Option<std::time::Instant>,
}

/// One report session: every node of the run plus environment metadata.
///
/// Nodes live in a flat arena; parents refer to children by [`NodeId`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportRun {
    pub session_id: String,
    pub run_name: String,
    pub report_path: PathBuf,
    #[serde(default)]
    pub charset: Charset,
    #[serde(default)]
    pub system_info: BTreeMap<String, String>,
    #[serde(default)]
    pub nodes: Vec<ReportNode>,
    pub started_at: String,
    #[serde(default)]
    pub generated_at: String,
    #[serde(skip)]
    dirty: bool,
}

impl ReportRun {
    pub fn new(report_path: impl Into<PathBuf>, run_name: &str, charset: Charset) -> Self {
        Self {
            session_id: uuid::Uuid::new_v4().to_string(),
            run_name: run_name.to_string(),
            report_path: report_path.into(),
            charset,
            system_info: BTreeMap::new(),
            nodes: Vec::new(),
            started_at: time::date_time(TIMESTAMP_FORMAT),
            generated_at: String::new(),
            dirty: false,
        }
    }

    pub fn add_system_info(&mut self, key: &str, value: &str) {
        self.system_info.insert(key.to_string(), value.to_string());
        self.dirty = true;
    }

    /// Add a node, as a child of `parent` when given
    pub fn create_node(&mut self, name: &str, description: &str, parent: Option<NodeId>) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(ReportNode {
            id,
            name: name.to_string(),
            description: description.to_string(),
            categories: Vec::new(),
            entries: Vec::new(),
            parent,
            children: Vec::new(),
            started_at: time::date_time(TIMESTAMP_FORMAT),
            ended_at: None,
            duration_ms: None,
            closed: false,
            started: Some(std::time::Instant::now()),
        });
        if let Some(parent) = parent.and_then(|p| self.nodes.get_mut(p.0)) {
            parent.children.push(id);
        }
        self.dirty = true;
        id
    }

    pub fn assign_category(&mut self, id: NodeId, category: &str) {
        if let Some(node) = self.nodes.get_mut(id.0) {
            if !node.categories.iter().any(|c| c == category) {
                node.categories.push(category.to_string());
                self.dirty = true;
            }
        }
    }

    /// Append an entry. Returns false when the node is unknown or closed.
    pub fn log(&mut self, id: NodeId, entry: LogEntry) -> bool {
        match self.nodes.get_mut(id.0) {
            Some(node) if !node.closed => {
                node.entries.push(entry);
                self.dirty = true;
                true
            }
            Some(node) => {
                log::warn!(
                    "Ignoring {} entry on closed report node '{}': {}",
                    entry.status.as_str(),
                    node.name,
                    entry.message
                );
                false
            }
            None => {
                log::warn!("Ignoring entry on unknown report node {:?}", id);
                false
            }
        }
    }

    /// Close a node and all of its children
    pub fn close(&mut self, id: NodeId) {
        let children = match self.nodes.get_mut(id.0) {
            Some(node) if !node.closed => {
                node.closed = true;
                node.ended_at = Some(time::date_time(TIMESTAMP_FORMAT));
                node.duration_ms = node.started.map(|s| s.elapsed().as_millis() as u64);
                node.children.clone()
            }
            _ => return,
        };
        self.dirty = true;
        for child in children {
            self.close(child);
        }
    }

    pub fn node(&self, id: NodeId) -> Option<&ReportNode> {
        self.nodes.get(id.0)
    }

    pub fn roots(&self) -> impl Iterator<Item = &ReportNode> {
        self.nodes.iter().filter(|n| n.parent.is_none())
    }

    pub fn children<'a>(
        &'a self,
        node: &'a ReportNode,
    ) -> impl Iterator<Item = &'a ReportNode> + 'a {
        node.children.iter().filter_map(|id| self.nodes.get(id.0))
    }

    /// Worst status of a node's entries and children. A node with nothing
    /// but info entries counts as passed.
    pub fn status(&self, id: NodeId) -> Status {
        let Some(node) = self.node(id) else {
            return Status::Info;
        };
        let worst = node
            .entries
            .iter()
            .map(|e| e.status)
            .chain(node.children.iter().map(|c| self.status(*c)))
            .max_by_key(|s| s.severity())
            .unwrap_or(Status::Pass);
        if worst == Status::Info {
            Status::Pass
        } else {
            worst
        }
    }

    pub fn failed_count(&self) -> usize {
        self.roots()
            .filter(|n| self.status(n.id).is_failure())
            .count()
    }

    /// Whether anything changed since the last flush
    pub fn is_stale(&self) -> bool {
        self.dirty
    }

    pub fn json_path(&self) -> PathBuf {
        self.report_path.with_extension("json")
    }

    pub fn report_dir(&self) -> &Path {
        self.report_path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Write the HTML report in the run's charset plus the JSON sidecar
    pub fn flush(&mut self) -> Result<(), ReportError> {
        self.generated_at = time::date_time(TIMESTAMP_FORMAT);

        let dir = self.report_dir().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| ReportError::Io {
            path: dir.clone(),
            source,
        })?;

        let html = super::html::render(self);
        write_file(&self.report_path, &self.charset.encode(&html))?;

        let json = serde_json::to_vec_pretty(self)?;
        write_file(&self.json_path(), &json)?;

        self.dirty = false;
        log::debug!("Report flushed to {}", self.report_path.display());
        Ok(())
    }
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), ReportError> {
    std::fs::write(path, bytes).map_err(|source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_in(dir: &Path) -> ReportRun {
        ReportRun::new(dir.join("RunnerTest.html"), "RunnerTest", Charset::Latin1)
    }

    #[test]
    fn test_closed_node_ignores_entries() {
        let tmp = tempfile::tempdir().unwrap();
        let mut run = run_in(tmp.path());
        let id = run.create_node("Scenario: Compra", "Compra", None);

        assert!(run.log(id, LogEntry::new(Status::Pass, "ok")));
        run.close(id);
        assert!(!run.log(id, LogEntry::new(Status::Fail, "late")));

        let node = run.node(id).unwrap();
        assert_eq!(node.entries.len(), 1);
        assert!(node.ended_at.is_some());
    }

    #[test]
    fn test_status_rolls_up_children() {
        let tmp = tempfile::tempdir().unwrap();
        let mut run = run_in(tmp.path());
        let parent = run.create_node("Scenario: A", "A", None);
        let child = run.create_node("Passo", "", Some(parent));
        run.log(parent, LogEntry::new(Status::Info, "start"));
        assert_eq!(run.status(parent), Status::Pass);

        run.log(child, LogEntry::new(Status::Fail, "broken"));
        assert_eq!(run.status(parent), Status::Fail);
        assert_eq!(run.failed_count(), 1);
        assert_eq!(run.roots().count(), 1);

        run.close(parent);
        assert!(run.node(child).unwrap().closed);
    }

    #[test]
    fn test_children_follow_creation_order() {
        let tmp = tempfile::tempdir().unwrap();
        let mut run = run_in(tmp.path());
        let parent = run.create_node("Scenario: D", "D", None);
        run.create_node("Pesquisa", "", Some(parent));
        run.create_node("Carrinho", "", Some(parent));

        let node = run.node(parent).unwrap();
        let names: Vec<&str> = run.children(node).map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Pesquisa", "Carrinho"]);
    }

    #[test]
    fn test_stale_until_flushed() {
        let tmp = tempfile::tempdir().unwrap();
        let mut run = run_in(&tmp.path().join("html"));
        assert!(!run.is_stale());

        let id = run.create_node("Scenario: B", "B", None);
        assert!(run.is_stale());

        run.flush().unwrap();
        assert!(!run.is_stale());
        assert!(tmp.path().join("html/RunnerTest.html").exists());
        assert!(tmp.path().join("html/RunnerTest.json").exists());

        run.assign_category(id, "feature:compra");
        assert!(run.is_stale());
    }

    #[test]
    fn test_duplicate_categories_collapse() {
        let tmp = tempfile::tempdir().unwrap();
        let mut run = run_in(tmp.path());
        let id = run.create_node("Scenario: C", "C", None);
        run.assign_category(id, "@test");
        run.assign_category(id, "@test");
        assert_eq!(run.node(id).unwrap().categories, vec!["@test"]);
    }

    #[test]
    fn test_flush_into_unwritable_path_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let blocker = tmp.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let mut run = run_in(&blocker);
        let err = run.flush().unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}

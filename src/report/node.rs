use super::types::{LogEntry, NodeId, ReportRun, Status};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Report run shared between the lifecycle hooks and the page objects
pub type SharedReport = Arc<Mutex<ReportRun>>;

/// Handle to one node of a shared report
#[derive(Clone)]
pub struct NodeHandle {
    report: SharedReport,
    id: NodeId,
}

impl std::fmt::Debug for NodeHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeHandle").field("id", &self.id).finish()
    }
}

impl NodeHandle {
    pub fn new(report: SharedReport, id: NodeId) -> Self {
        Self { report, id }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn report(&self) -> &SharedReport {
        &self.report
    }

    pub async fn log(&self, entry: LogEntry) -> bool {
        self.report.lock().await.log(self.id, entry)
    }

    pub async fn pass(&self, message: &str) {
        self.log(LogEntry::new(Status::Pass, message)).await;
    }

    pub async fn fail(&self, message: &str) {
        self.log(LogEntry::new(Status::Fail, message)).await;
    }

    pub async fn info(&self, message: &str) {
        self.log(LogEntry::new(Status::Info, message)).await;
    }

    pub async fn skip(&self, message: &str) {
        self.log(LogEntry::new(Status::Skip, message)).await;
    }

    pub async fn error(&self, message: &str) {
        self.log(LogEntry::new(Status::Error, message)).await;
    }

    /// Entry with a screenshot reference relative to the report directory
    pub async fn log_with_media(&self, status: Status, message: &str, media: &str) {
        self.log(LogEntry::new(status, message).with_media(Some(media.to_string())))
            .await;
    }

    pub async fn assign_category(&self, category: &str) {
        self.report.lock().await.assign_category(self.id, category);
    }

    pub async fn create_child(&self, name: &str, description: &str) -> NodeHandle {
        let id = self
            .report
            .lock()
            .await
            .create_node(name, description, Some(self.id));
        NodeHandle::new(self.report.clone(), id)
    }

    pub async fn close(&self) {
        self.report.lock().await.close(self.id);
    }

    pub async fn status(&self) -> Status {
        self.report.lock().await.status(self.id)
    }
}

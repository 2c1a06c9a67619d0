use crate::events::{AuditEvent, EventSink};
use crate::types::ToolStatus;
use audit_claw_tools::ToolId;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Per-tool lifecycle status for one session.
///
/// Every mutation emits its event while the map lock is held, so the event
/// stream always replays the mutations in the order they happened.
pub struct ToolStateTracker {
    statuses: Mutex<BTreeMap<ToolId, ToolStatus>>,
    sink: Arc<dyn EventSink>,
}

impl ToolStateTracker {
    pub fn new(tools: impl IntoIterator<Item = ToolId>, sink: Arc<dyn EventSink>) -> Self {
        let statuses = tools
            .into_iter()
            .map(|id| (id, ToolStatus::NotFound))
            .collect();
        Self {
            statuses: Mutex::new(statuses),
            sink,
        }
    }

    pub fn set_status(&self, tool: ToolId, status: ToolStatus) {
        let mut statuses = self.statuses.lock();
        statuses.insert(tool, status);
        self.sink.emit(AuditEvent::ToolStatusUpdate {
            tool_id: tool,
            status,
        });
    }

    /// Unknown tools read as `NotFound`.
    pub fn get_status(&self, tool: ToolId) -> ToolStatus {
        self.statuses
            .lock()
            .get(&tool)
            .copied()
            .unwrap_or(ToolStatus::NotFound)
    }

    pub fn snapshot(&self) -> BTreeMap<ToolId, ToolStatus> {
        self.statuses.lock().clone()
    }

    /// Replaces every status at once and announces the result as a single
    /// `initial-status` event.
    pub fn load_snapshot(&self, snapshot: BTreeMap<ToolId, ToolStatus>) {
        let mut statuses = self.statuses.lock();
        *statuses = snapshot;
        self.sink.emit(AuditEvent::InitialStatus(statuses.clone()));
    }

    /// Re-announces the current statuses without changing them.
    pub fn announce(&self) {
        let statuses = self.statuses.lock();
        self.sink.emit(AuditEvent::InitialStatus(statuses.clone()));
    }
}

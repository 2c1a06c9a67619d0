use crate::types::{AuditLogEntry, AuditState, AuditSummary, ToolStatus};
use audit_claw_tools::ToolId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tokio::sync::mpsc;

/// Everything a session tells its observer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum AuditEvent {
    #[serde(rename = "agent:initial-status")]
    InitialStatus(BTreeMap<ToolId, ToolStatus>),
    #[serde(rename = "agent:log")]
    Log(AuditLogEntry),
    #[serde(rename = "agent:tool-status-update")]
    ToolStatusUpdate {
        #[serde(rename = "toolId")]
        tool_id: ToolId,
        status: ToolStatus,
    },
    #[serde(rename = "agent:state-change")]
    StateChange(AuditState),
    #[serde(rename = "agent:summary-update")]
    SummaryUpdate(Option<AuditSummary>),
    #[serde(rename = "agent:request-confirmation")]
    RequestConfirmation {
        #[serde(rename = "toolId")]
        tool_id: ToolId,
    },
}

/// Destination for session events.
///
/// `emit` is synchronous so that callers can pair a state mutation with its
/// event inside one critical section.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: AuditEvent);
}

impl EventSink for mpsc::UnboundedSender<AuditEvent> {
    fn emit(&self, event: AuditEvent) {
        if self.send(event).is_err() {
            tracing::debug!("Event dropped: observer is gone");
        }
    }
}

/// Discards everything. Useful for headless sessions.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: AuditEvent) {}
}

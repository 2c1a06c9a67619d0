//! JSON wire format shared by both directions: `{"event": name, "data": payload}`.

use audit_claw_core::AuditEvent;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("Failed to encode event: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Commands an observer may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ClientCommand {
    #[serde(rename = "agent:get-initial-status")]
    GetInitialStatus,
    #[serde(rename = "agent:start-audit")]
    StartAudit { target: String },
    #[serde(rename = "agent:user-confirmation")]
    UserConfirmation { confirmed: bool },
}

pub fn encode_event(event: &AuditEvent) -> Result<String, ProtocolError> {
    serde_json::to_string(event).map_err(ProtocolError::Encode)
}

pub fn decode_command(frame: &str) -> Result<ClientCommand, ProtocolError> {
    serde_json::from_str(frame).map_err(ProtocolError::Malformed)
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a single tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ToolStatus {
    NotFound,
    Downloading,
    Ready,
    Running,
    AwaitingConfirmation,
    Completed,
    Error,
}

impl fmt::Display for ToolStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ToolStatus::NotFound => "not found",
            ToolStatus::Downloading => "downloading",
            ToolStatus::Ready => "ready",
            ToolStatus::Running => "running",
            ToolStatus::AwaitingConfirmation => "awaiting confirmation",
            ToolStatus::Completed => "completed",
            ToolStatus::Error => "error",
        };
        f.write_str(label)
    }
}

/// State of the audit pipeline as a whole.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditState {
    Idle,
    Running,
    AwaitingConfirmation,
    Completed,
    Error,
}

impl AuditState {
    /// States from which a new audit may be started.
    pub fn accepts_start(&self) -> bool {
        matches!(self, AuditState::Idle | AuditState::Completed | AuditState::Error)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogSource {
    System,
    Agent,
    User,
    Tool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditLogEntry {
    pub source: LogSource,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl AuditLogEntry {
    pub fn new(source: LogSource, message: impl Into<String>, data: Option<serde_json::Value>) -> Self {
        Self {
            source,
            message: message.into(),
            timestamp: Utc::now(),
            data,
        }
    }
}

/// Ordinal risk scale, also used for recommendation severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub severity: RiskLevel,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditSummary {
    pub risk_level: RiskLevel,
    pub summary: String,
    pub recommendations: Vec<Recommendation>,
}

use crate::analysis::{AnalysisError, Analyzer};
use crate::events::EventSink;
use crate::metrics::AuditMetrics;
use crate::session::AuditSession;
use crate::types::{AuditState, ToolStatus};
use audit_claw_executor::CommandRunner;
use audit_claw_tools::{ToolId, ToolRegistry};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Preparation of {tool} failed: {reason}")]
    Preparation { tool: ToolId, reason: String },
    #[error("{tool} is not ready (status: {status})")]
    NotReady { tool: ToolId, status: ToolStatus },
    #[error("Execution of {tool} failed: {reason}")]
    Execution { tool: ToolId, reason: String },
    #[error("No confirmation for {tool} within {after:?}")]
    ConfirmationTimedOut { tool: ToolId, after: Duration },
    #[error("Execution of {tool} was declined")]
    Declined { tool: ToolId },
    #[error("An audit is already running")]
    AlreadyRunning,
    #[error("A tool status refresh is in progress")]
    RefreshInProgress,
    #[error("Session is closed")]
    SessionClosed,
    #[error(transparent)]
    Analysis(#[from] AnalysisError),
}

impl AuditError {
    /// Audit state this error leaves the session in. `None` when the error
    /// did not touch the session at all.
    pub fn terminal_state(&self) -> Option<AuditState> {
        match self {
            AuditError::Declined { .. } => Some(AuditState::Idle),
            AuditError::AlreadyRunning
            | AuditError::RefreshInProgress
            | AuditError::SessionClosed => None,
            _ => Some(AuditState::Error),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct OrchestratorSettings {
    /// How long a confirmation gate may stay open. `None` waits forever.
    pub confirmation_timeout: Option<Duration>,
}

/// Shared collaborators for every session: the tool catalog, the process
/// runner, the analysis step and the metrics.
#[derive(Clone)]
pub struct Orchestrator {
    pub(crate) registry: Arc<ToolRegistry>,
    pub(crate) runner: Arc<dyn CommandRunner>,
    pub(crate) analyzer: Arc<dyn Analyzer>,
    pub(crate) metrics: Arc<AuditMetrics>,
    pub(crate) settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(
        registry: Arc<ToolRegistry>,
        runner: Arc<dyn CommandRunner>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Self {
        Self {
            registry,
            runner,
            analyzer,
            metrics: AuditMetrics::new(),
            settings: OrchestratorSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: OrchestratorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<AuditMetrics> {
        &self.metrics
    }

    pub fn settings(&self) -> &OrchestratorSettings {
        &self.settings
    }

    /// Creates an independent session whose events go to `sink`.
    pub fn open_session(&self, sink: Arc<dyn EventSink>) -> Arc<AuditSession> {
        let session = AuditSession::new(self.clone(), sink);
        tracing::info!("Opened session {}", session.id());
        Arc::new(session)
    }
}

//! Audit orchestration: tool state tracking, the audit pipeline and the
//! events it reports to an observer.

pub mod analysis;
pub mod confirmation;
pub mod events;
pub mod metrics;
pub mod orchestrator;
pub mod session;
pub mod tracker;
pub mod types;

pub use analysis::{AnalysisError, Analyzer, AuditReport, HeuristicAnalyzer, ToolReport};
pub use confirmation::ConfirmationGate;
pub use events::{AuditEvent, EventSink, NullSink};
pub use metrics::{AuditMetrics, MetricsSnapshot};
pub use orchestrator::{AuditError, Orchestrator, OrchestratorSettings};
pub use session::{AuditRun, AuditSession};
pub use tracker::ToolStateTracker;
pub use types::*;

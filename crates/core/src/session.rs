//! One observer's audit session and the pipeline it drives.

use crate::analysis::{AuditReport, ToolReport};
use crate::confirmation::ConfirmationGate;
use crate::events::{AuditEvent, EventSink};
use crate::orchestrator::{AuditError, Orchestrator};
use crate::tracker::ToolStateTracker;
use crate::types::{AuditLogEntry, AuditState, AuditSummary, LogSource, ToolStatus};
use audit_claw_executor::{CommandLine, CommandOutput, ExecutorError};
use audit_claw_tools::{ToolDescriptor, ToolId, EXECUTION_SEQUENCE};
use parking_lot::Mutex;
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

const IDLE: u8 = 0;
const AUDIT: u8 = 1;
const REFRESH: u8 = 2;

/// Exclusive hold on a session's tool statuses, taken by an audit or by a
/// status refresh. Released on drop however the holder exits.
struct ActivityGuard {
    slot: Arc<AtomicU8>,
}

impl ActivityGuard {
    /// On contention returns the activity already holding the slot.
    fn acquire(slot: &Arc<AtomicU8>, activity: u8) -> Result<Self, u8> {
        slot.compare_exchange(IDLE, activity, Ordering::SeqCst, Ordering::SeqCst)
            .map(|_| Self {
                slot: Arc::clone(slot),
            })
    }
}

impl Drop for ActivityGuard {
    fn drop(&mut self) {
        self.slot.store(IDLE, Ordering::SeqCst);
    }
}

/// An audit that already owns its session but has not started running.
///
/// Obtained from [`AuditSession::begin_audit`]. Dropping it before it ran
/// (or cancelling `run` midway) releases the session and settles its state.
pub struct AuditRun {
    session: Arc<AuditSession>,
    target: String,
    guard: Option<ActivityGuard>,
    started: bool,
}

impl AuditRun {
    pub fn target(&self) -> &str {
        &self.target
    }

    pub async fn run(mut self) -> Result<AuditSummary, AuditError> {
        self.started = true;
        let result = self.session.finish_audit(&self.target).await;
        self.guard.take();
        result
    }
}

impl Drop for AuditRun {
    fn drop(&mut self) {
        if self.guard.is_none() {
            return;
        }
        let (state, message) = if self.started {
            (AuditState::Error, "Audit cancelled before it finished.")
        } else {
            (AuditState::Idle, "Audit abandoned before it started.")
        };
        warn!("Session {}: {} ({})", self.session.id, message, self.target);
        self.session.log(LogSource::System, message, None);
        self.session.set_state(state);
    }
}

pub struct AuditSession {
    id: String,
    orchestrator: Orchestrator,
    sink: Arc<dyn EventSink>,
    tracker: ToolStateTracker,
    gate: ConfirmationGate,
    activity: Arc<AtomicU8>,
    closed: AtomicBool,
    state: Mutex<AuditState>,
    trail: Mutex<Vec<AuditLogEntry>>,
    summary: Mutex<Option<AuditSummary>>,
    target: Mutex<Option<String>>,
}

impl AuditSession {
    pub(crate) fn new(orchestrator: Orchestrator, sink: Arc<dyn EventSink>) -> Self {
        let tracker = ToolStateTracker::new(orchestrator.registry.ids(), Arc::clone(&sink));
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            orchestrator,
            sink,
            tracker,
            gate: ConfirmationGate::new(),
            activity: Arc::new(AtomicU8::new(IDLE)),
            closed: AtomicBool::new(false),
            state: Mutex::new(AuditState::Idle),
            trail: Mutex::new(Vec::new()),
            summary: Mutex::new(None),
            target: Mutex::new(None),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> AuditState {
        *self.state.lock()
    }

    pub fn is_running(&self) -> bool {
        self.activity.load(Ordering::SeqCst) == AUDIT
    }

    pub fn is_awaiting_confirmation(&self) -> bool {
        self.gate.is_pending()
    }

    pub fn tool_status(&self, tool: ToolId) -> ToolStatus {
        self.tracker.get_status(tool)
    }

    pub fn tool_statuses(&self) -> BTreeMap<ToolId, ToolStatus> {
        self.tracker.snapshot()
    }

    /// Audit trail of the current or most recent audit.
    pub fn log_entries(&self) -> Vec<AuditLogEntry> {
        self.trail.lock().clone()
    }

    pub fn summary(&self) -> Option<AuditSummary> {
        self.summary.lock().clone()
    }

    pub fn target(&self) -> Option<String> {
        self.target.lock().clone()
    }

    /// Probes every registered tool and announces the result as one
    /// `initial-status` event.
    ///
    /// The probes run under the same exclusion as an audit. While an audit or
    /// another refresh holds the session, the current statuses are announced
    /// unchanged instead.
    pub async fn refresh_tool_status(&self) -> BTreeMap<ToolId, ToolStatus> {
        let _guard = match ActivityGuard::acquire(&self.activity, REFRESH) {
            Ok(guard) => guard,
            Err(holder) => {
                let notice = if holder == AUDIT {
                    "Tool status refresh ignored while an audit is running."
                } else {
                    "Tool status refresh already in progress."
                };
                self.log(LogSource::System, notice, None);
                self.tracker.announce();
                return self.tracker.snapshot();
            }
        };

        let mut statuses = BTreeMap::new();
        for tool in self.orchestrator.registry.iter() {
            statuses.insert(tool.id, self.probe(tool).await);
        }
        self.tracker.load_snapshot(statuses.clone());
        statuses
    }

    /// Delivers the observer's decision to a paused pipeline. Returns `false`
    /// (and changes nothing) when no confirmation is pending.
    pub fn confirm(&self, confirmed: bool) -> bool {
        let delivered = self.gate.resolve(confirmed);
        if !delivered {
            debug!("Session {}: confirmation ignored, nothing pending", self.id);
        }
        delivered
    }

    /// Marks the session as gone. A pipeline paused at a confirmation gate
    /// treats this as a decline.
    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if self.gate.cancel() {
            info!("Session {} closed while awaiting confirmation", self.id);
        }
    }

    /// Runs one full audit against `target`.
    ///
    /// Rejected without side effects (apart from a notice in the log) while
    /// another audit or a status refresh of this session is in flight.
    pub async fn start_audit(self: &Arc<Self>, target: &str) -> Result<AuditSummary, AuditError> {
        self.begin_audit(target)?.run().await
    }

    /// Claims the session for an audit of `target` without awaiting anything.
    ///
    /// Once this returns `Ok` the session counts as running, so callers that
    /// hand the audit to a background task keep later commands consistent.
    pub fn begin_audit(self: &Arc<Self>, target: &str) -> Result<AuditRun, AuditError> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(AuditError::SessionClosed);
        }

        let guard = match ActivityGuard::acquire(&self.activity, AUDIT) {
            Ok(guard) => guard,
            Err(holder) => {
                self.orchestrator.metrics.inc_starts_rejected();
                if holder == AUDIT {
                    self.log(LogSource::System, "An audit is already running.", None);
                    return Err(AuditError::AlreadyRunning);
                }
                self.log(
                    LogSource::System,
                    "Tool status refresh in progress. Audit not started.",
                    None,
                );
                return Err(AuditError::RefreshInProgress);
            }
        };

        debug_assert!(self.state().accepts_start());
        info!("Session {}: starting audit of {}", self.id, target);
        self.trail.lock().clear();
        *self.summary.lock() = None;
        *self.target.lock() = Some(target.to_string());
        self.orchestrator.metrics.inc_audits_started();
        self.set_state(AuditState::Running);

        Ok(AuditRun {
            session: Arc::clone(self),
            target: target.to_string(),
            guard: Some(guard),
            started: false,
        })
    }

    async fn finish_audit(self: &Arc<Self>, target: &str) -> Result<AuditSummary, AuditError> {
        let result = self.run_pipeline(target).await;

        match &result {
            Ok(summary) => {
                *self.summary.lock() = Some(summary.clone());
                self.sink.emit(AuditEvent::SummaryUpdate(Some(summary.clone())));
                self.log(LogSource::Agent, "Audit complete.", None);
                self.set_state(AuditState::Completed);
                self.orchestrator.metrics.inc_audits_completed();
                info!("Session {}: audit of {} completed", self.id, target);
            }
            Err(err) => {
                warn!("Session {}: audit of {} stopped: {}", self.id, target, err);
                if let Some(state) = err.terminal_state() {
                    self.set_state(state);
                }
                match err {
                    AuditError::Declined { .. } => self.orchestrator.metrics.inc_audits_declined(),
                    _ => self.orchestrator.metrics.inc_audits_failed(),
                }
            }
        }

        result
    }

    async fn run_pipeline(self: &Arc<Self>, target: &str) -> Result<AuditSummary, AuditError> {
        self.settle_statuses().await;
        self.prepare_missing_tools().await?;
        let reports = self.execute_sequence(target).await?;

        self.log(LogSource::Agent, "Analyzing results to build the report...", None);
        let report = AuditReport {
            target: target.to_string(),
            tools: reports,
        };
        match self.orchestrator.analyzer.summarize(&report).await {
            Ok(summary) => Ok(summary),
            Err(e) => {
                self.log(LogSource::System, format!("Report generation failed: {}", e), None);
                Err(e.into())
            }
        }
    }

    /// Makes leftovers of a previous audit usable again: completed tools are
    /// ready, failed tools are probed afresh.
    async fn settle_statuses(&self) {
        for tool in self.orchestrator.registry.iter() {
            match self.tracker.get_status(tool.id) {
                ToolStatus::Completed => self.tracker.set_status(tool.id, ToolStatus::Ready),
                ToolStatus::Error => {
                    let status = self.probe(tool).await;
                    self.tracker.set_status(tool.id, status);
                }
                _ => {}
            }
        }
    }

    async fn prepare_missing_tools(self: &Arc<Self>) -> Result<(), AuditError> {
        let missing: Vec<(ToolId, String, CommandLine)> = self
            .orchestrator
            .registry
            .iter()
            .filter(|tool| self.tracker.get_status(tool.id) == ToolStatus::NotFound)
            .filter_map(|tool| {
                tool.acquisition()
                    .map(|command| (tool.id, tool.name.clone(), command))
            })
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        self.log(
            LogSource::Agent,
            format!("Downloading {} tool(s) in parallel...", missing.len()),
            None,
        );

        let preparing: Vec<ToolId> = missing.iter().map(|(id, _, _)| *id).collect();
        let mut tasks = JoinSet::new();
        for (id, name, command) in missing {
            self.tracker.set_status(id, ToolStatus::Downloading);
            self.orchestrator.metrics.inc_preparations();
            let session = Arc::clone(self);
            tasks.spawn(async move { session.prepare_tool(id, &name, &command).await });
        }

        let mut first_failure = None;
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    first_failure.get_or_insert(err);
                }
                Err(join_err) => error!("Preparation task aborted: {}", join_err),
            }
        }

        // A task that died before reporting leaves its tool mid-download.
        for id in preparing {
            if self.tracker.get_status(id) == ToolStatus::Downloading {
                self.tracker.set_status(id, ToolStatus::Error);
                self.orchestrator.metrics.inc_preparation_failures();
                self.log(LogSource::System, format!("Preparation of {} aborted.", id), None);
                first_failure.get_or_insert(AuditError::Preparation {
                    tool: id,
                    reason: "preparation task aborted".to_string(),
                });
            }
        }

        match first_failure {
            Some(err) => {
                self.log(
                    LogSource::System,
                    "One or more downloads failed. Audit stopped.",
                    None,
                );
                Err(err)
            }
            None => Ok(()),
        }
    }

    async fn prepare_tool(&self, id: ToolId, name: &str, command: &CommandLine) -> Result<(), AuditError> {
        match self.run_logged(command).await {
            Ok(_) => {
                self.tracker.set_status(id, ToolStatus::Ready);
                self.log(LogSource::Agent, format!("Tool {} downloaded.", name), None);
                Ok(())
            }
            Err(e) => {
                self.tracker.set_status(id, ToolStatus::Error);
                self.orchestrator.metrics.inc_preparation_failures();
                self.log(LogSource::System, format!("Failed to download {}.", name), None);
                Err(AuditError::Preparation {
                    tool: id,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn execute_sequence(&self, target: &str) -> Result<Vec<ToolReport>, AuditError> {
        let mut reports = Vec::with_capacity(EXECUTION_SEQUENCE.len());

        for id in EXECUTION_SEQUENCE {
            let status = self.tracker.get_status(id);
            let tool = match self.orchestrator.registry.get(id) {
                Some(tool) if status == ToolStatus::Ready => tool,
                Some(tool) => {
                    self.log(
                        LogSource::System,
                        format!("Tool {} is not ready ({}). Audit interrupted.", tool.name, status),
                        None,
                    );
                    return Err(AuditError::NotReady { tool: id, status });
                }
                None => {
                    self.log(
                        LogSource::System,
                        format!("Tool {} is not registered. Audit interrupted.", id),
                        None,
                    );
                    return Err(AuditError::NotReady { tool: id, status });
                }
            };

            if tool.requires_confirmation {
                self.await_confirmation(tool).await?;
            }

            reports.push(self.run_tool(tool, target).await?);
        }

        Ok(reports)
    }

    async fn await_confirmation(&self, tool: &ToolDescriptor) -> Result<(), AuditError> {
        self.tracker.set_status(tool.id, ToolStatus::AwaitingConfirmation);
        self.set_state(AuditState::AwaitingConfirmation);

        let decision = self.gate.open();
        if self.closed.load(Ordering::SeqCst) {
            self.gate.cancel();
        }
        self.sink.emit(AuditEvent::RequestConfirmation { tool_id: tool.id });
        info!("Session {}: waiting for confirmation to run {}", self.id, tool.name);

        let decision = match self.orchestrator.settings.confirmation_timeout {
            Some(limit) => match tokio::time::timeout(limit, decision).await {
                Ok(decision) => decision,
                Err(_) => {
                    self.gate.cancel();
                    self.log(
                        LogSource::System,
                        format!("No confirmation for {} within {:?}.", tool.name, limit),
                        None,
                    );
                    self.tracker.set_status(tool.id, ToolStatus::Error);
                    return Err(AuditError::ConfirmationTimedOut {
                        tool: tool.id,
                        after: limit,
                    });
                }
            },
            None => decision.await,
        };

        // A dropped gate means the observer left: same as saying no.
        if !decision.unwrap_or(false) {
            self.log(
                LogSource::User,
                format!("Execution of {} was cancelled.", tool.name),
                None,
            );
            self.tracker.set_status(tool.id, ToolStatus::Ready);
            return Err(AuditError::Declined { tool: tool.id });
        }

        self.log(
            LogSource::User,
            format!("Execution of {} authorized.", tool.name),
            None,
        );
        self.set_state(AuditState::Running);
        Ok(())
    }

    async fn run_tool(&self, tool: &ToolDescriptor, target: &str) -> Result<ToolReport, AuditError> {
        self.log(
            LogSource::Agent,
            format!("Running {} against {}...", tool.name, target),
            None,
        );
        self.tracker.set_status(tool.id, ToolStatus::Running);
        self.orchestrator.metrics.inc_tool_runs();

        let command = tool.run_command(target);
        match self.run_logged(&command).await {
            Ok(output) => {
                self.log(
                    LogSource::Tool,
                    format!("Results from {}:", tool.name),
                    Some(json!({ "output": output.stdout })),
                );
                self.tracker.set_status(tool.id, ToolStatus::Completed);
                Ok(ToolReport {
                    tool: tool.id,
                    command: command.to_string(),
                    output: output.stdout,
                })
            }
            Err(e) => {
                self.orchestrator.metrics.inc_tool_failures();
                self.log(
                    LogSource::System,
                    format!("Error while running {}.", tool.name),
                    Some(json!({ "error": e.to_string() })),
                );
                self.tracker.set_status(tool.id, ToolStatus::Error);
                Err(AuditError::Execution {
                    tool: tool.id,
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn probe(&self, tool: &ToolDescriptor) -> ToolStatus {
        match self.run_logged(&tool.probe_command()).await {
            Ok(_) => ToolStatus::Ready,
            Err(_) => ToolStatus::NotFound,
        }
    }

    /// Every command is announced before it runs, and failures are logged
    /// before the error is handed back.
    async fn run_logged(&self, command: &CommandLine) -> Result<CommandOutput, ExecutorError> {
        self.log(LogSource::System, format!("Executing command: {}", command), None);
        let result = self.orchestrator.runner.run(command).await;
        if let Err(e) = &result {
            self.log(
                LogSource::System,
                format!("Command error for: {}", command),
                Some(json!({ "error": e.to_string(), "stderr": e.stderr() })),
            );
        }
        result
    }

    fn log(&self, source: LogSource, message: impl Into<String>, data: Option<serde_json::Value>) {
        let entry = AuditLogEntry::new(source, message, data);
        debug!("Session {} [{:?}] {}", self.id, entry.source, entry.message);
        let mut trail = self.trail.lock();
        trail.push(entry.clone());
        self.sink.emit(AuditEvent::Log(entry));
    }

    fn set_state(&self, state: AuditState) {
        let mut current = self.state.lock();
        *current = state;
        self.sink.emit(AuditEvent::StateChange(state));
    }
}

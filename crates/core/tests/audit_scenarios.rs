//! End-to-end audit pipeline scenarios against a scripted process runner.

#![allow(clippy::panic, clippy::unwrap_used, clippy::expect_used)]

use async_trait::async_trait;
use audit_claw_core::*;
use audit_claw_executor::{CommandLine, CommandOutput, CommandRunner, ExecutorError};
use audit_claw_tools::{ToolId, ToolRegistry};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::sync::{Barrier, Notify};
use tokio::time::timeout;

const TARGET: &str = "scanme.nmap.org";

const NMAP_OUTPUT: &str = "PORT   STATE SERVICE\n22/tcp open  ssh\n80/tcp open  http\n";

/// Parks each command matching `pattern` until released.
#[derive(Clone)]
struct Hold {
    pattern: String,
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl Hold {
    fn on(pattern: &str) -> Self {
        Self {
            pattern: pattern.to_string(),
            entered: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
        }
    }

    async fn reached(&self) {
        timeout(Duration::from_secs(5), self.entered.notified())
            .await
            .expect("held command never started");
    }
}

struct ScriptedRunner {
    hold: Option<Hold>,
    failing: Mutex<Vec<String>>,
    panicking: Vec<String>,
    outputs: Vec<(String, String)>,
    clone_barrier: Option<Arc<Barrier>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    fn new() -> Self {
        Self {
            hold: None,
            failing: Mutex::new(Vec::new()),
            panicking: Vec::new(),
            outputs: vec![("nmap -sV".to_string(), NMAP_OUTPUT.to_string())],
            clone_barrier: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn fail_on(self, pattern: &str) -> Self {
        self.failing.lock().unwrap().push(pattern.to_string());
        self
    }

    fn panic_on(mut self, pattern: &str) -> Self {
        self.panicking.push(pattern.to_string());
        self
    }

    fn with_clone_barrier(mut self, parties: usize) -> Self {
        self.clone_barrier = Some(Arc::new(Barrier::new(parties)));
        self
    }

    fn hold(mut self, hold: &Hold) -> Self {
        self.hold = Some(hold.clone());
        self
    }

    fn clear_failures(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Tool runs (not probes, not clones) in invocation order.
    fn runs(&self) -> Vec<ToolId> {
        self.calls()
            .iter()
            .filter_map(|call| {
                if call.contains("theHarvester.py -d") {
                    Some(ToolId::TheHarvester)
                } else if call.contains("nmap -sV") {
                    Some(ToolId::Nmap)
                } else if call.contains("nikto.pl -h") {
                    Some(ToolId::Nikto)
                } else if call.contains("sqlmap.py -u") {
                    Some(ToolId::Sqlmap)
                } else {
                    None
                }
            })
            .collect()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &CommandLine) -> Result<CommandOutput, ExecutorError> {
        let line = command.to_string();
        self.calls.lock().unwrap().push(line.clone());

        if let Some(hold) = self.hold.as_ref().filter(|h| line.contains(&h.pattern)) {
            hold.entered.notify_one();
            hold.release.notified().await;
        }

        if command.program == "git" {
            if let Some(barrier) = &self.clone_barrier {
                barrier.wait().await;
            }
        }

        if self.panicking.iter().any(|p| line.contains(p)) {
            panic!("scripted panic for: {}", line);
        }

        let fails = self.failing.lock().unwrap().iter().any(|p| line.contains(p));
        if fails {
            return Err(ExecutorError::NonZeroExit {
                code: Some(1),
                stderr: "scripted failure".to_string(),
            });
        }

        let stdout = self
            .outputs
            .iter()
            .find(|(pattern, _)| line.contains(pattern))
            .map(|(_, out)| out.clone())
            .unwrap_or_default();
        Ok(CommandOutput {
            stdout,
            stderr: String::new(),
            exit_code: Some(0),
        })
    }
}

struct Harness {
    runner: Arc<ScriptedRunner>,
    orchestrator: Orchestrator,
    session: Arc<AuditSession>,
    events: UnboundedReceiver<AuditEvent>,
}

fn harness_with(runner: ScriptedRunner, settings: OrchestratorSettings) -> Harness {
    let runner = Arc::new(runner);
    let orchestrator = Orchestrator::new(
        Arc::new(ToolRegistry::builtin(&PathBuf::from("/opt/tools"))),
        runner.clone(),
        Arc::new(HeuristicAnalyzer::new()),
    )
    .with_settings(settings);
    let (tx, events) = mpsc::unbounded_channel();
    let session = orchestrator.open_session(Arc::new(tx));
    Harness {
        runner,
        orchestrator,
        session,
        events,
    }
}

fn harness(runner: ScriptedRunner) -> Harness {
    harness_with(runner, OrchestratorSettings::default())
}

fn drain(rx: &mut UnboundedReceiver<AuditEvent>) -> Vec<AuditEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

async fn wait_for_confirmation_request(rx: &mut UnboundedReceiver<AuditEvent>) -> Vec<AuditEvent> {
    let mut seen = Vec::new();
    timeout(Duration::from_secs(5), async {
        while let Some(event) = rx.recv().await {
            let done = matches!(event, AuditEvent::RequestConfirmation { .. });
            seen.push(event);
            if done {
                break;
            }
        }
    })
    .await
    .expect("pipeline never asked for confirmation");
    seen
}

fn state_changes(events: &[AuditEvent]) -> Vec<AuditState> {
    events
        .iter()
        .filter_map(|e| match e {
            AuditEvent::StateChange(state) => Some(*state),
            _ => None,
        })
        .collect()
}

fn status_updates(events: &[AuditEvent], tool: ToolId) -> Vec<ToolStatus> {
    events
        .iter()
        .filter_map(|e| match e {
            AuditEvent::ToolStatusUpdate { tool_id, status } if *tool_id == tool => Some(*status),
            _ => None,
        })
        .collect()
}

fn spawn_audit(session: &Arc<AuditSession>) -> tokio::task::JoinHandle<Result<AuditSummary, AuditError>> {
    let session = session.clone();
    tokio::spawn(async move { session.start_audit(TARGET).await })
}

#[tokio::test]
async fn test_all_ready_confirmed_audit_completes_with_summary() {
    let mut h = harness(ScriptedRunner::new());
    h.session.refresh_tool_status().await;
    drain(&mut h.events);

    let audit = spawn_audit(&h.session);
    let mut events = wait_for_confirmation_request(&mut h.events).await;
    assert_eq!(h.session.state(), AuditState::AwaitingConfirmation);
    assert_eq!(h.session.tool_status(ToolId::Sqlmap), ToolStatus::AwaitingConfirmation);

    assert!(h.session.confirm(true));
    let summary = audit.await.unwrap().unwrap();
    events.extend(drain(&mut h.events));

    assert_eq!(
        state_changes(&events),
        vec![
            AuditState::Running,
            AuditState::AwaitingConfirmation,
            AuditState::Running,
            AuditState::Completed,
        ]
    );
    assert!(events
        .iter()
        .any(|e| matches!(e, AuditEvent::SummaryUpdate(Some(_)))));
    assert_eq!(summary.risk_level, RiskLevel::Medium);
    assert_eq!(h.session.summary(), Some(summary));
    assert!(h.session.tool_statuses().values().all(|s| *s == ToolStatus::Completed));
    assert!(!h.session.is_running());
    assert_eq!(h.session.target().as_deref(), Some(TARGET));
}

#[tokio::test]
async fn test_tools_run_in_fixed_order() {
    let mut h = harness(ScriptedRunner::new());
    h.session.refresh_tool_status().await;

    let audit = spawn_audit(&h.session);
    wait_for_confirmation_request(&mut h.events).await;
    h.session.confirm(true);
    audit.await.unwrap().unwrap();

    assert_eq!(
        h.runner.runs(),
        vec![ToolId::TheHarvester, ToolId::Nmap, ToolId::Nikto, ToolId::Sqlmap]
    );
}

#[tokio::test]
async fn test_start_while_running_is_rejected_without_side_effects() {
    let mut h = harness(ScriptedRunner::new());
    h.session.refresh_tool_status().await;

    let audit = spawn_audit(&h.session);
    wait_for_confirmation_request(&mut h.events).await;
    let before = h.session.tool_statuses();

    let second = h.session.start_audit("other.example").await;
    assert!(matches!(second, Err(AuditError::AlreadyRunning)));

    let between = drain(&mut h.events);
    assert!(between.iter().all(|e| matches!(e, AuditEvent::Log(_))));
    assert_eq!(between.len(), 1);
    assert_eq!(h.session.state(), AuditState::AwaitingConfirmation);
    assert_eq!(h.session.tool_statuses(), before);
    assert_eq!(h.session.target().as_deref(), Some(TARGET));

    h.session.confirm(true);
    audit.await.unwrap().unwrap();
    assert_eq!(h.orchestrator.metrics().snapshot().starts_rejected, 1);
}

#[tokio::test]
async fn test_start_during_tool_execution_is_rejected_without_side_effects() {
    let hold = Hold::on("nikto.pl -h");
    let mut h = harness(ScriptedRunner::new().hold(&hold));
    h.session.refresh_tool_status().await;

    let audit = spawn_audit(&h.session);
    hold.reached().await;
    drain(&mut h.events);
    assert_eq!(h.session.state(), AuditState::Running);
    assert_eq!(h.session.tool_status(ToolId::Nikto), ToolStatus::Running);
    let before = h.session.tool_statuses();

    let second = h.session.start_audit("other.example").await;
    assert!(matches!(second, Err(AuditError::AlreadyRunning)));

    let between = drain(&mut h.events);
    assert_eq!(between.len(), 1);
    assert!(matches!(&between[0], AuditEvent::Log(entry) if entry.message == "An audit is already running."));
    assert_eq!(h.session.state(), AuditState::Running);
    assert_eq!(h.session.tool_statuses(), before);
    assert_eq!(h.session.target().as_deref(), Some(TARGET));

    hold.release.notify_one();
    wait_for_confirmation_request(&mut h.events).await;
    h.session.confirm(true);
    audit.await.unwrap().unwrap();
    assert_eq!(h.runner.runs(), vec![ToolId::TheHarvester, ToolId::Nmap, ToolId::Nikto, ToolId::Sqlmap]);
}

#[tokio::test]
async fn test_refresh_during_tool_execution_keeps_pipeline_statuses() {
    let hold = Hold::on("nikto.pl -h");
    let mut h = harness(ScriptedRunner::new().hold(&hold));
    h.session.refresh_tool_status().await;

    let audit = spawn_audit(&h.session);
    hold.reached().await;
    drain(&mut h.events);
    let calls_before = h.runner.calls().len();

    let statuses = h.session.refresh_tool_status().await;
    assert_eq!(statuses[&ToolId::TheHarvester], ToolStatus::Completed);
    assert_eq!(statuses[&ToolId::Nikto], ToolStatus::Running);
    assert_eq!(h.runner.calls().len(), calls_before);
    let events = drain(&mut h.events);
    assert!(events.iter().all(|e| !matches!(e, AuditEvent::ToolStatusUpdate { .. })));

    hold.release.notify_one();
    wait_for_confirmation_request(&mut h.events).await;
    h.session.confirm(true);
    audit.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_start_during_refresh_is_rejected() {
    let hold = Hold::on("nmap --version");
    let mut h = harness(ScriptedRunner::new().hold(&hold));

    let refresh = {
        let session = h.session.clone();
        tokio::spawn(async move { session.refresh_tool_status().await })
    };
    hold.reached().await;
    drain(&mut h.events);

    let result = h.session.start_audit(TARGET).await;
    assert!(matches!(result, Err(AuditError::RefreshInProgress)));
    assert_eq!(h.session.state(), AuditState::Idle);
    assert!(!h.session.is_running());
    assert!(drain(&mut h.events)
        .iter()
        .all(|e| matches!(e, AuditEvent::Log(_))));

    hold.release.notify_one();
    let statuses = refresh.await.unwrap();
    assert!(statuses.values().all(|s| *s == ToolStatus::Ready));
    assert_eq!(h.orchestrator.metrics().snapshot().starts_rejected, 1);
}

#[tokio::test]
async fn test_preinstalled_tool_missing_halts_at_its_turn() {
    let mut h = harness(ScriptedRunner::new().fail_on("nmap --version"));
    let statuses = h.session.refresh_tool_status().await;
    assert_eq!(statuses[&ToolId::Nmap], ToolStatus::NotFound);
    drain(&mut h.events);

    let result = h.session.start_audit(TARGET).await;
    assert!(matches!(
        result,
        Err(AuditError::NotReady { tool: ToolId::Nmap, status: ToolStatus::NotFound })
    ));

    let events = drain(&mut h.events);
    assert_eq!(state_changes(&events), vec![AuditState::Running, AuditState::Error]);
    assert_eq!(h.session.state(), AuditState::Error);
    assert_eq!(h.session.tool_status(ToolId::TheHarvester), ToolStatus::Completed);
    assert_eq!(h.session.tool_status(ToolId::Nmap), ToolStatus::NotFound);
    assert!(status_updates(&events, ToolId::Nmap).is_empty());
    assert_eq!(h.runner.runs(), vec![ToolId::TheHarvester]);
    assert!(!h.runner.calls().iter().any(|c| c.starts_with("git")));
    assert!(!h.session.is_running());
}

#[tokio::test]
async fn test_execution_failure_stops_remaining_tools() {
    let mut h = harness(ScriptedRunner::new().fail_on("nikto.pl -h"));
    h.session.refresh_tool_status().await;
    drain(&mut h.events);

    let result = h.session.start_audit(TARGET).await;
    assert!(matches!(result, Err(AuditError::Execution { tool: ToolId::Nikto, .. })));

    let events = drain(&mut h.events);
    assert_eq!(h.session.state(), AuditState::Error);
    assert_eq!(h.session.tool_status(ToolId::Nikto), ToolStatus::Error);
    assert_eq!(h.session.tool_status(ToolId::Sqlmap), ToolStatus::Ready);
    assert_eq!(
        h.runner.runs(),
        vec![ToolId::TheHarvester, ToolId::Nmap, ToolId::Nikto]
    );
    assert!(!events
        .iter()
        .any(|e| matches!(e, AuditEvent::RequestConfirmation { .. })));
    assert!(!h.session.is_running());

    let failure_logs: Vec<_> = h
        .session
        .log_entries()
        .into_iter()
        .filter(|e| e.message.starts_with("Command error for:"))
        .collect();
    assert_eq!(failure_logs.len(), 1);
    assert_eq!(failure_logs[0].data.as_ref().unwrap()["stderr"], "scripted failure");
}

#[tokio::test]
async fn test_declined_confirmation_returns_to_idle() {
    let mut h = harness(ScriptedRunner::new());
    h.session.refresh_tool_status().await;
    drain(&mut h.events);

    let audit = spawn_audit(&h.session);
    let mut events = wait_for_confirmation_request(&mut h.events).await;
    assert!(h.session.confirm(false));
    let result = audit.await.unwrap();
    events.extend(drain(&mut h.events));

    assert!(matches!(result, Err(AuditError::Declined { tool: ToolId::Sqlmap })));
    assert_eq!(h.session.state(), AuditState::Idle);
    assert_eq!(state_changes(&events).last(), Some(&AuditState::Idle));
    assert_eq!(h.session.tool_status(ToolId::Sqlmap), ToolStatus::Ready);
    assert_eq!(
        status_updates(&events, ToolId::Sqlmap),
        vec![ToolStatus::AwaitingConfirmation, ToolStatus::Ready]
    );
    for tool in [ToolId::TheHarvester, ToolId::Nmap, ToolId::Nikto] {
        assert_eq!(h.session.tool_status(tool), ToolStatus::Completed);
    }
    assert!(!events.iter().any(|e| matches!(e, AuditEvent::SummaryUpdate(_))));
    assert!(h.session.summary().is_none());
    assert!(!h.runner.runs().contains(&ToolId::Sqlmap));
    assert!(h
        .session
        .log_entries()
        .iter()
        .any(|e| e.source == LogSource::User && e.message.contains("cancelled")));
    assert_eq!(h.orchestrator.metrics().snapshot().audits_declined, 1);
}

#[tokio::test]
async fn test_failed_preparation_aborts_before_any_tool_runs() {
    let runner = ScriptedRunner::new()
        .fail_on("test -f /opt/tools/nikto")
        .fail_on("test -f /opt/tools/sqlmap")
        .fail_on("git clone https://github.com/sullo/nikto.git")
        .with_clone_barrier(2);
    let mut h = harness(runner);
    h.session.refresh_tool_status().await;
    drain(&mut h.events);

    // Both clones must be in flight together to pass the barrier.
    let result = timeout(Duration::from_secs(5), h.session.start_audit(TARGET))
        .await
        .expect("preparations did not run concurrently");
    assert!(matches!(result, Err(AuditError::Preparation { tool: ToolId::Nikto, .. })));

    let events = drain(&mut h.events);
    assert_eq!(
        status_updates(&events, ToolId::Nikto),
        vec![ToolStatus::Downloading, ToolStatus::Error]
    );
    assert_eq!(
        status_updates(&events, ToolId::Sqlmap),
        vec![ToolStatus::Downloading, ToolStatus::Ready]
    );
    assert_eq!(h.session.state(), AuditState::Error);
    assert!(h.runner.runs().is_empty());
    assert!(!h.session.is_running());

    let metrics = h.orchestrator.metrics().snapshot();
    assert_eq!(metrics.preparations, 2);
    assert_eq!(metrics.preparation_failures, 1);
    assert_eq!(metrics.audits_failed, 1);
}

#[tokio::test]
async fn test_missing_tool_is_downloaded_then_run() {
    let runner = ScriptedRunner::new().fail_on("test -f /opt/tools/theHarvester");
    let mut h = harness(runner);
    h.session.refresh_tool_status().await;
    drain(&mut h.events);

    let audit = spawn_audit(&h.session);
    let mut events = wait_for_confirmation_request(&mut h.events).await;
    h.session.confirm(true);
    audit.await.unwrap().unwrap();
    events.extend(drain(&mut h.events));

    assert_eq!(
        status_updates(&events, ToolId::TheHarvester),
        vec![
            ToolStatus::Downloading,
            ToolStatus::Ready,
            ToolStatus::Running,
            ToolStatus::Completed,
        ]
    );
    assert!(h
        .runner
        .calls()
        .contains(&"git clone https://github.com/laramies/theHarvester.git /opt/tools/theHarvester".to_string()));
}

#[tokio::test]
async fn test_panicking_preparation_is_contained() {
    let runner = ScriptedRunner::new()
        .fail_on("test -f /opt/tools/nikto")
        .panic_on("git clone https://github.com/sullo/nikto.git");
    let mut h = harness(runner);
    h.session.refresh_tool_status().await;
    drain(&mut h.events);

    let result = h.session.start_audit(TARGET).await;
    assert!(matches!(result, Err(AuditError::Preparation { tool: ToolId::Nikto, .. })));
    assert_eq!(h.session.tool_status(ToolId::Nikto), ToolStatus::Error);
    assert_eq!(h.session.state(), AuditState::Error);
    assert!(!h.session.is_running());
}

#[tokio::test]
async fn test_retry_after_failure_probes_failed_tool_again() {
    let mut h = harness(ScriptedRunner::new().fail_on("nikto.pl -h"));
    h.session.refresh_tool_status().await;
    assert!(h.session.start_audit(TARGET).await.is_err());
    assert_eq!(h.session.tool_status(ToolId::Nikto), ToolStatus::Error);
    drain(&mut h.events);

    h.runner.clear_failures();
    let audit = spawn_audit(&h.session);
    let mut events = wait_for_confirmation_request(&mut h.events).await;
    h.session.confirm(true);
    audit.await.unwrap().unwrap();
    events.extend(drain(&mut h.events));

    assert_eq!(
        status_updates(&events, ToolId::Nikto),
        vec![
            ToolStatus::Ready,
            ToolStatus::Running,
            ToolStatus::Completed,
        ]
    );
    assert_eq!(h.session.state(), AuditState::Completed);
}

#[tokio::test]
async fn test_completed_audit_can_run_again() {
    let mut h = harness(ScriptedRunner::new());
    h.session.refresh_tool_status().await;

    for _ in 0..2 {
        let audit = spawn_audit(&h.session);
        wait_for_confirmation_request(&mut h.events).await;
        h.session.confirm(true);
        audit.await.unwrap().unwrap();
        assert_eq!(h.session.state(), AuditState::Completed);
        drain(&mut h.events);
    }

    assert_eq!(h.runner.runs().len(), 8);
    assert_eq!(h.orchestrator.metrics().snapshot().audits_completed, 2);
}

#[tokio::test]
async fn test_audit_start_resets_previous_trail_and_summary() {
    let mut h = harness(ScriptedRunner::new());
    h.session.refresh_tool_status().await;

    let audit = spawn_audit(&h.session);
    wait_for_confirmation_request(&mut h.events).await;
    h.session.confirm(true);
    audit.await.unwrap().unwrap();
    assert!(h.session.summary().is_some());
    drain(&mut h.events);

    let audit = spawn_audit(&h.session);
    wait_for_confirmation_request(&mut h.events).await;
    assert!(h.session.summary().is_none());
    assert!(!h
        .session
        .log_entries()
        .iter()
        .any(|e| e.message == "Audit complete."));
    h.session.confirm(false);
    audit.await.unwrap().unwrap_err();
}

#[tokio::test]
async fn test_confirmation_timeout_is_an_error() {
    let settings = OrchestratorSettings {
        confirmation_timeout: Some(Duration::from_millis(50)),
    };
    let mut h = harness_with(ScriptedRunner::new(), settings);
    h.session.refresh_tool_status().await;
    drain(&mut h.events);

    let result = h.session.start_audit(TARGET).await;
    assert!(matches!(
        result,
        Err(AuditError::ConfirmationTimedOut { tool: ToolId::Sqlmap, .. })
    ));
    assert_eq!(h.session.tool_status(ToolId::Sqlmap), ToolStatus::Error);
    assert_eq!(h.session.state(), AuditState::Error);
    assert!(!h.session.is_awaiting_confirmation());
}

#[tokio::test]
async fn test_closing_session_declines_pending_confirmation() {
    let mut h = harness(ScriptedRunner::new());
    h.session.refresh_tool_status().await;

    let audit = spawn_audit(&h.session);
    wait_for_confirmation_request(&mut h.events).await;
    h.session.close();

    let result = audit.await.unwrap();
    assert!(matches!(result, Err(AuditError::Declined { tool: ToolId::Sqlmap })));
    assert_eq!(h.session.state(), AuditState::Idle);
    assert_eq!(h.session.tool_status(ToolId::Sqlmap), ToolStatus::Ready);
}

#[tokio::test]
async fn test_confirmation_without_pending_gate_is_ignored() {
    let mut h = harness(ScriptedRunner::new());
    h.session.refresh_tool_status().await;
    drain(&mut h.events);

    assert!(!h.session.confirm(true));
    assert!(drain(&mut h.events).is_empty());
    assert_eq!(h.session.state(), AuditState::Idle);
}

#[tokio::test]
async fn test_refresh_during_audit_does_not_probe() {
    let mut h = harness(ScriptedRunner::new());
    h.session.refresh_tool_status().await;

    let audit = spawn_audit(&h.session);
    wait_for_confirmation_request(&mut h.events).await;
    let calls_before = h.runner.calls().len();

    let statuses = h.session.refresh_tool_status().await;
    assert_eq!(statuses[&ToolId::Sqlmap], ToolStatus::AwaitingConfirmation);
    assert_eq!(h.runner.calls().len(), calls_before);
    let events = drain(&mut h.events);
    assert!(events.iter().any(|e| matches!(e, AuditEvent::InitialStatus(_))));

    h.session.confirm(true);
    audit.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_log_events_match_trail_exactly() {
    let mut h = harness(ScriptedRunner::new().fail_on("nikto.pl -h"));
    h.session.refresh_tool_status().await;
    drain(&mut h.events);

    let _ = h.session.start_audit(TARGET).await;
    let streamed: Vec<AuditLogEntry> = drain(&mut h.events)
        .into_iter()
        .filter_map(|e| match e {
            AuditEvent::Log(entry) => Some(entry),
            _ => None,
        })
        .collect();

    assert_eq!(streamed, h.session.log_entries());
    let executing = streamed
        .iter()
        .position(|e| e.message.starts_with("Executing command: perl"))
        .unwrap();
    let failed = streamed
        .iter()
        .position(|e| e.message.starts_with("Command error for: perl"))
        .unwrap();
    assert!(executing < failed);
}

#[tokio::test]
async fn test_sessions_are_independent() {
    let h = harness(ScriptedRunner::new());
    let (tx, mut other_events) = mpsc::unbounded_channel();
    let other = h.orchestrator.open_session(Arc::new(tx));

    h.session.refresh_tool_status().await;

    assert_ne!(h.session.id(), other.id());
    assert_eq!(h.session.tool_status(ToolId::Nmap), ToolStatus::Ready);
    assert_eq!(other.tool_status(ToolId::Nmap), ToolStatus::NotFound);
    assert!(drain(&mut other_events).is_empty());
}

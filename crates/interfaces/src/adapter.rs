use crate::protocol::{decode_command, encode_event, ClientCommand};
use crate::traits::Transport;
use audit_claw_core::{AuditEvent, AuditSession, Orchestrator};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

/// Binds one observer connection to one audit session.
///
/// Events are forwarded in emission order. Inbound commands are handled in
/// arrival order; audits run in the background so confirmations sent while
/// one is paused still get through.
pub struct EventChannelAdapter<T: Transport> {
    orchestrator: Orchestrator,
    transport: Arc<T>,
}

impl<T: Transport + 'static> EventChannelAdapter<T> {
    pub fn new(orchestrator: Orchestrator, transport: Arc<T>) -> Self {
        Self {
            orchestrator,
            transport,
        }
    }

    /// Serves the connection until the observer disconnects. In-flight audits
    /// are allowed to finish and their events are flushed before returning.
    pub async fn run(&self) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = self.orchestrator.open_session(Arc::new(tx));
        let pump = tokio::spawn(pump_events(rx, Arc::clone(&self.transport)));

        let mut audits = JoinSet::new();
        while let Some(frame) = self.transport.receive().await {
            if frame.trim().is_empty() {
                continue;
            }
            match decode_command(&frame) {
                Ok(command) => self.dispatch(&session, command, &mut audits).await,
                Err(e) => warn!("Ignoring frame from observer: {}", e),
            }
        }

        info!("Observer of session {} disconnected", session.id());
        session.close();
        while let Some(joined) = audits.join_next().await {
            if let Err(e) = joined {
                error!("Audit task failed: {}", e);
            }
        }

        // Last sender goes with the session, which ends the pump.
        drop(session);
        if let Err(e) = pump.await {
            error!("Event pump failed: {}", e);
        }
    }

    async fn dispatch(
        &self,
        session: &Arc<AuditSession>,
        command: ClientCommand,
        audits: &mut JoinSet<()>,
    ) {
        debug!("Session {} received {:?}", session.id(), command);
        match command {
            ClientCommand::GetInitialStatus => {
                session.refresh_tool_status().await;
            }
            // Claimed before spawning so that commands read after this one
            // already see the session as running.
            ClientCommand::StartAudit { target } => match session.begin_audit(&target) {
                Ok(audit) => {
                    audits.spawn(async move {
                        if let Err(e) = audit.run().await {
                            debug!("Audit of {} ended early: {}", target, e);
                        }
                    });
                }
                Err(e) => debug!("Audit of {} not started: {}", target, e),
            },
            ClientCommand::UserConfirmation { confirmed } => {
                session.confirm(confirmed);
            }
        }
    }
}

async fn pump_events<T: Transport>(mut rx: mpsc::UnboundedReceiver<AuditEvent>, transport: Arc<T>) {
    while let Some(event) = rx.recv().await {
        match encode_event(&event) {
            Ok(frame) => transport.send(&frame).await,
            Err(e) => error!("Dropping event: {}", e),
        }
    }
}

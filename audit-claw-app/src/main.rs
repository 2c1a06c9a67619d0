use anyhow::Result;
use audit_claw_app::bootstrap::{build_orchestrator, init_logging};
use audit_claw_app::cli::{parse_args, Command, USAGE};
use audit_claw_app::config::AppConfig;
use audit_claw_core::{AuditEvent, AuditState, Orchestrator};
use audit_claw_interfaces::{EventChannelAdapter, StdioTransport, TerminalConsole};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}\n\n{}", e, USAGE);
            return Ok(ExitCode::from(2));
        }
    };
    if args.command == Command::Help {
        println!("{}", USAGE);
        return Ok(ExitCode::SUCCESS);
    }

    let config = AppConfig::resolve(args.config.as_deref())?;
    init_logging(&config.log_level);
    let orchestrator = build_orchestrator(&config)?;

    match args.command {
        Command::Scan { target } => run_scan(orchestrator, target).await,
        _ => {
            tracing::info!("Serving on stdin/stdout");
            EventChannelAdapter::new(orchestrator, Arc::new(StdioTransport::new()))
                .run()
                .await;
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn run_scan(orchestrator: Orchestrator, target: String) -> Result<ExitCode> {
    let (tx, mut events) = mpsc::unbounded_channel();
    let session = orchestrator.open_session(Arc::new(tx));
    let console = TerminalConsole::new();

    session.refresh_tool_status().await;

    let mut audit = {
        let session = Arc::clone(&session);
        let target = target.clone();
        tokio::spawn(async move { session.start_audit(&target).await })
    };

    let result = loop {
        tokio::select! {
            biased;
            Some(event) = events.recv() => {
                console.show(&event).await;
                if let AuditEvent::RequestConfirmation { tool_id } = event {
                    let approved = console
                        .request_approval(&format!("run {} against {}", tool_id, target))
                        .await;
                    session.confirm(approved);
                }
            }
            joined = &mut audit => break joined?,
        }
    };
    while let Ok(event) = events.try_recv() {
        console.show(&event).await;
    }

    let metrics = orchestrator.metrics().snapshot();
    tracing::info!(
        "Preparation success {:.0}%, tool success {:.0}%",
        metrics.preparation_success_rate() * 100.0,
        metrics.tool_success_rate() * 100.0
    );

    match result {
        Ok(_) => Ok(ExitCode::SUCCESS),
        Err(e) if e.terminal_state() == Some(AuditState::Error) => {
            eprintln!("Audit failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => {
            eprintln!("{}", e);
            Ok(ExitCode::SUCCESS)
        }
    }
}

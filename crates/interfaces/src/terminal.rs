use crate::traits::Transport;
use async_trait::async_trait;
use audit_claw_core::{AuditEvent, LogSource};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;

/// Newline-delimited JSON over the process's stdin and stdout.
pub struct StdioTransport {
    reader: Mutex<BufReader<Stdin>>,
    writer: Mutex<Stdout>,
}

impl StdioTransport {
    pub fn new() -> Self {
        Self {
            reader: Mutex::new(BufReader::new(tokio::io::stdin())),
            writer: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdioTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for StdioTransport {
    async fn receive(&self) -> Option<String> {
        let mut reader = self.reader.lock().await;
        let mut line = String::new();

        match reader.read_line(&mut line).await {
            Ok(0) => None, // EOF
            Ok(_) => Some(line.trim().to_string()),
            Err(e) => {
                tracing::warn!("Failed to read from stdin: {}", e);
                None
            }
        }
    }

    async fn send(&self, frame: &str) {
        let mut stdout = self.writer.lock().await;
        if let Err(e) = write_line(&mut *stdout, frame).await {
            tracing::warn!("Failed to write to stdout: {}", e);
        }
    }
}

async fn write_line<W: AsyncWriteExt + Unpin>(out: &mut W, line: &str) -> std::io::Result<()> {
    out.write_all(line.as_bytes()).await?;
    out.write_all(b"\n").await?;
    out.flush().await
}

/// Human-facing rendering of an audit for interactive runs.
pub struct TerminalConsole {
    input: Mutex<BufReader<Stdin>>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            input: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }

    /// Text shown for an event, if any. Confirmation requests are prompted
    /// for separately.
    pub fn render(event: &AuditEvent) -> Option<String> {
        match event {
            AuditEvent::InitialStatus(statuses) => Some(
                statuses
                    .iter()
                    .map(|(tool, status)| format!("  {:<14} {}", tool.to_string(), status))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            AuditEvent::Log(entry) => {
                let mut line = format!(
                    "[{}] {:?}: {}",
                    entry.timestamp.format("%H:%M:%S"),
                    entry.source,
                    entry.message
                );
                if entry.source == LogSource::Tool {
                    if let Some(output) = entry
                        .data
                        .as_ref()
                        .and_then(|d| d.get("output"))
                        .and_then(|o| o.as_str())
                    {
                        for out in output.lines() {
                            line.push_str("\n    ");
                            line.push_str(out);
                        }
                    }
                }
                Some(line)
            }
            AuditEvent::ToolStatusUpdate { tool_id, status } => {
                Some(format!("  {} -> {}", tool_id, status))
            }
            AuditEvent::StateChange(state) => Some(format!("== {:?}", state)),
            AuditEvent::SummaryUpdate(Some(summary)) => {
                let mut text = format!("Risk level: {:?}\n{}", summary.risk_level, summary.summary);
                for rec in &summary.recommendations {
                    text.push_str(&format!(
                        "\n  - {} ({:?}): {}",
                        rec.title, rec.severity, rec.description
                    ));
                }
                Some(text)
            }
            AuditEvent::SummaryUpdate(None) | AuditEvent::RequestConfirmation { .. } => None,
        }
    }

    pub async fn show(&self, event: &AuditEvent) {
        if let Some(text) = Self::render(event) {
            let mut stdout = tokio::io::stdout();
            let _ = write_line(&mut stdout, &text).await;
        }
    }

    /// Asks a yes/no question on stderr. Anything but an answer starting
    /// with `y` (including end of input) is a no.
    pub async fn request_approval(&self, action: &str) -> bool {
        let mut stderr = tokio::io::stderr();
        let _ = stderr
            .write_all(format!("Approval required: {}\nApprove? (y/n): ", action).as_bytes())
            .await;
        let _ = stderr.flush().await;

        let mut input = self.input.lock().await;
        let mut answer = String::new();
        match input.read_line(&mut answer).await {
            Ok(0) | Err(_) => false,
            Ok(_) => answer.trim().to_lowercase().starts_with('y'),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

use audit_claw_executor::CommandLine;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Placeholder substituted with the audit target inside a template argument.
pub const TARGET_PLACEHOLDER: &str = "{target}";

/// Identity of every tool the orchestrator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ToolId {
    #[serde(rename = "sqlmap")]
    Sqlmap,
    #[serde(rename = "Nmap")]
    Nmap,
    #[serde(rename = "Nikto")]
    Nikto,
    #[serde(rename = "theHarvester")]
    TheHarvester,
}

impl ToolId {
    pub const ALL: [ToolId; 4] = [
        ToolId::Sqlmap,
        ToolId::Nmap,
        ToolId::Nikto,
        ToolId::TheHarvester,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::Sqlmap => "sqlmap",
            ToolId::Nmap => "Nmap",
            ToolId::Nikto => "Nikto",
            ToolId::TheHarvester => "theHarvester",
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A program plus argument templates.
///
/// Each template argument becomes exactly one argv element after rendering;
/// `{target}` may appear anywhere inside it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandTemplate {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

impl CommandTemplate {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn render(&self, target: &str) -> CommandLine {
        CommandLine::new(self.program.clone())
            .args(self.args.iter().map(|arg| arg.replace(TARGET_PLACEHOLDER, target)))
    }

    pub fn uses_target(&self) -> bool {
        self.args.iter().any(|arg| arg.contains(TARGET_PLACEHOLDER))
    }
}

/// Static description of one orchestrated tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub id: ToolId,
    pub name: String,
    pub description: String,
    /// Git repository the tool is cloned from. `None` for tools expected to be
    /// installed system-wide.
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub install_path: Option<PathBuf>,
    pub probe: CommandTemplate,
    pub run: CommandTemplate,
    #[serde(default)]
    pub requires_confirmation: bool,
}

impl ToolDescriptor {
    pub fn is_acquirable(&self) -> bool {
        self.acquisition().is_some()
    }

    /// `git clone <source> <install_path>`, when both are known.
    pub fn acquisition(&self) -> Option<CommandLine> {
        let source = self.source.as_deref().filter(|s| !s.trim().is_empty())?;
        let path = self.install_path.as_ref()?;
        Some(
            CommandLine::new("git")
                .arg("clone")
                .arg(source)
                .arg(path.to_string_lossy()),
        )
    }

    pub fn probe_command(&self) -> CommandLine {
        self.probe.render("")
    }

    pub fn run_command(&self, target: &str) -> CommandLine {
        self.run.render(target)
    }
}

//! Turns raw tool output into an [`AuditSummary`].

use crate::types::{AuditSummary, Recommendation, RiskLevel};
use async_trait::async_trait;
use audit_claw_tools::ToolId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("Nothing to analyze")]
    EmptyReport,
    #[error("Analysis failed: {0}")]
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolReport {
    pub tool: ToolId,
    pub command: String,
    pub output: String,
}

/// Everything collected by one completed audit, in execution order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditReport {
    pub target: String,
    pub tools: Vec<ToolReport>,
}

impl AuditReport {
    pub fn output_of(&self, tool: ToolId) -> Option<&str> {
        self.tools
            .iter()
            .find(|r| r.tool == tool)
            .map(|r| r.output.as_str())
    }
}

#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn summarize(&self, report: &AuditReport) -> Result<AuditSummary, AnalysisError>;
}

/// Keyword-based analysis of the stock tools' text output.
#[derive(Debug, Default, Clone)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    pub fn new() -> Self {
        Self
    }
}

fn open_ports(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let port = fields.next()?;
            let state = fields.next()?;
            let is_port = port.contains("/tcp") || port.contains("/udp");
            (is_port && state == "open").then(|| port.to_string())
        })
        .collect()
}

const NIKTO_BANNER_PREFIXES: [&str; 7] = [
    "+ Target",
    "+ Start Time",
    "+ End Time",
    "+ Server:",
    "+ SSL Info",
    "+ 1 host(s) tested",
    "+ No web server found",
];

fn nikto_findings(output: &str) -> usize {
    output
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with("+ "))
        .filter(|line| !NIKTO_BANNER_PREFIXES.iter().any(|p| line.starts_with(p)))
        .count()
}

fn sql_injectable(output: &str) -> bool {
    let lower = output.to_lowercase();
    lower.contains("is vulnerable") || lower.contains("appears to be injectable")
}

fn harvested_emails(output: &str) -> usize {
    output
        .split_whitespace()
        .filter(|word| {
            let mut parts = word.split('@');
            matches!((parts.next(), parts.next(), parts.next()), (Some(user), Some(domain), None)
                if !user.is_empty() && domain.contains('.'))
        })
        .count()
}

#[async_trait]
impl Analyzer for HeuristicAnalyzer {
    async fn summarize(&self, report: &AuditReport) -> Result<AuditSummary, AnalysisError> {
        if report.tools.is_empty() {
            return Err(AnalysisError::EmptyReport);
        }

        let mut findings = Vec::new();
        let mut recommendations = Vec::new();

        if let Some(output) = report.output_of(ToolId::Nmap) {
            let ports = open_ports(output);
            if !ports.is_empty() {
                findings.push(format!("{} open port(s) ({})", ports.len(), ports.join(", ")));
                recommendations.push(Recommendation {
                    title: "Review firewall configuration".to_string(),
                    description: "Restrict access to non-essential ports.".to_string(),
                    severity: if ports.len() > 5 { RiskLevel::High } else { RiskLevel::Medium },
                });
            }
        }

        if let Some(output) = report.output_of(ToolId::Nikto) {
            let count = nikto_findings(output);
            if count > 0 {
                findings.push(format!("{} web server finding(s)", count));
                recommendations.push(Recommendation {
                    title: "Update the web server".to_string(),
                    description: "Apply the latest security patches and harden the server configuration.".to_string(),
                    severity: RiskLevel::High,
                });
            }
        }

        if let Some(output) = report.output_of(ToolId::Sqlmap) {
            if sql_injectable(output) {
                findings.push("injectable SQL parameter".to_string());
                recommendations.push(Recommendation {
                    title: "Fix SQL injection".to_string(),
                    description: "Use parameterized queries and validate all user input.".to_string(),
                    severity: RiskLevel::Critical,
                });
            }
        }

        if let Some(output) = report.output_of(ToolId::TheHarvester) {
            let count = harvested_emails(output);
            if count > 0 {
                findings.push(format!("{} exposed e-mail address(es)", count));
                recommendations.push(Recommendation {
                    title: "Limit public exposure of addresses".to_string(),
                    description: "Publicly harvestable addresses feed phishing campaigns.".to_string(),
                    severity: RiskLevel::Low,
                });
            }
        }

        recommendations.sort_by(|a, b| b.severity.cmp(&a.severity));
        let risk_level = recommendations
            .iter()
            .map(|r| r.severity)
            .max()
            .unwrap_or(RiskLevel::Low);

        let summary = if findings.is_empty() {
            format!("No notable findings for {}.", report.target)
        } else {
            format!(
                "Audit of {} found {}. Manual investigation is recommended.",
                report.target,
                findings.join("; ")
            )
        };

        Ok(AuditSummary {
            risk_level,
            summary,
            recommendations,
        })
    }
}

use crate::catalog;
use crate::descriptor::{ToolDescriptor, ToolId};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;

/// Order in which an audit runs its tools: reconnaissance, network scan, web
/// vulnerability scan, injection testing. Each step builds on the previous one.
pub const EXECUTION_SEQUENCE: [ToolId; 4] = [
    ToolId::TheHarvester,
    ToolId::Nmap,
    ToolId::Nikto,
    ToolId::Sqlmap,
];

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("No descriptor for tool: {0}")]
    Missing(ToolId),
    #[error("Duplicate descriptor for tool: {0}")]
    Duplicate(ToolId),
    #[error("Invalid descriptor for {tool}: {reason}")]
    Invalid { tool: ToolId, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Immutable catalog of tool descriptors, keyed by identity.
#[derive(Debug, Clone)]
pub struct ToolRegistry {
    tools: BTreeMap<ToolId, ToolDescriptor>,
}

impl ToolRegistry {
    pub fn from_descriptors(descriptors: Vec<ToolDescriptor>) -> Result<Self, RegistryError> {
        let mut tools = BTreeMap::new();
        for descriptor in descriptors {
            if descriptor.probe.program.trim().is_empty() || descriptor.run.program.trim().is_empty() {
                return Err(RegistryError::Invalid {
                    tool: descriptor.id,
                    reason: "probe and run commands need a program".to_string(),
                });
            }
            if !descriptor.run.uses_target() {
                tracing::warn!("Run command of {} never references the target", descriptor.id);
            }
            let id = descriptor.id;
            if tools.insert(id, descriptor).is_some() {
                return Err(RegistryError::Duplicate(id));
            }
        }

        if let Some(missing) = EXECUTION_SEQUENCE.iter().find(|id| !tools.contains_key(id)) {
            return Err(RegistryError::Missing(*missing));
        }

        Ok(Self { tools })
    }

    /// The stock catalog, with cloned tools living under `tools_dir`.
    pub fn builtin(tools_dir: &Path) -> Self {
        let tools = catalog::builtin_descriptors(tools_dir)
            .into_iter()
            .map(|d| (d.id, d))
            .collect();
        Self { tools }
    }

    pub fn from_yaml_str(content: &str) -> Result<Self, RegistryError> {
        let descriptors: Vec<ToolDescriptor> = serde_yaml::from_str(content)?;
        Self::from_descriptors(descriptors)
    }

    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let content = std::fs::read_to_string(path)?;
        let registry = Self::from_yaml_str(&content)?;
        tracing::info!("Loaded {} tool descriptors from {}", registry.len(), path.display());
        Ok(registry)
    }

    pub fn get(&self, id: ToolId) -> Option<&ToolDescriptor> {
        self.tools.get(&id)
    }

    /// Descriptors in declaration order, which is not the execution order.
    pub fn iter(&self) -> impl Iterator<Item = &ToolDescriptor> {
        self.tools.values()
    }

    pub fn ids(&self) -> Vec<ToolId> {
        self.tools.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

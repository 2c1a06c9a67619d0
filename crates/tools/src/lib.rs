pub mod catalog;
pub mod descriptor;
pub mod registry;

pub use descriptor::{CommandTemplate, ToolDescriptor, ToolId, TARGET_PLACEHOLDER};
pub use registry::{RegistryError, ToolRegistry, EXECUTION_SEQUENCE};

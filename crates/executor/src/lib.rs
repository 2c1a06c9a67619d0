pub mod command_executor;
pub mod command_line;

pub use command_executor::{CommandOutput, CommandRunner, ExecutorError, ProcessRunner};
pub use command_line::CommandLine;

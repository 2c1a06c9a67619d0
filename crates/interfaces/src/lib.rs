//! Observer-facing side of the audit orchestrator: the wire protocol, the
//! transports it travels over and the adapter binding a connection to a
//! session.

pub mod adapter;
pub mod protocol;
pub mod terminal;
pub mod traits;

pub use adapter::EventChannelAdapter;
pub use protocol::{decode_command, encode_event, ClientCommand, ProtocolError};
pub use terminal::{StdioTransport, TerminalConsole};
pub use traits::Transport;

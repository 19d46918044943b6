pub mod commands;
pub mod events;
pub mod types;

pub use commands::SessionCommand;
pub use events::{ChannelSink, RenderSink};
pub use types::{ChatMessage, ConnectionState, OutgoingMessage, SessionStatus, ANONYMOUS};

//! Chat server protocol plumbing.
//!
//! - [`framing`] - outbound line validation (CR/LF and byte ceiling)
//! - [`message`] - inbound line parser
//! - [`event`] - server lines classified into engine events
//! - [`connection`] - TCP transport and the connection loop

pub mod connection;
pub mod event;
pub mod framing;
pub mod message;

pub use connection::{run, IrcConnection, ServerAddress};
pub use event::{ConnectionEvent, ServerLine};
pub use framing::{FramingError, MessageFramer, OutboundFrame};
pub use message::{IrcMessage, ParseError, Prefix};

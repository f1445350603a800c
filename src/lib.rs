//! Chat Simulator - posts Markov-generated messages that sound like a channel.
//!
//! The bot watches a chat channel, collects a rolling sample of what people
//! say, and every so often posts a generated message shaped like that sample.
//!
//! # Architecture
//!
//! Leaf-first:
//!
//! - **MessageFramer** ([`irc::framing`]) - every outbound line is checked for
//!   CR/LF and against the byte ceiling before it reaches the socket
//! - **CorpusBuffer** ([`corpus`]) - recent chat messages, oldest first
//! - **LengthModel** ([`length_model`]) - length bounds and chain order from
//!   corpus statistics
//! - **GenerationController** ([`controller`]) - runs a cycle whenever the
//!   corpus reaches the trigger threshold
//! - **ConnectionEventHandler** ([`handler`]) - maps server events onto the
//!   engine and returns protocol actions
//!
//! The transport ([`irc::connection`]) processes one server line at a time,
//! so corpus mutations and generation cycles never interleave.

pub mod config;
pub mod constants;
pub mod controller;
pub mod corpus;
pub mod generator;
pub mod handler;
pub mod identity;
pub mod irc;
pub mod length_model;
pub mod markov;

// Re-export commonly used types
pub use config::{ConfigError, EngineConfig, Settings};
pub use controller::{ControllerState, Cycle, CycleError, GenerationController};
pub use corpus::CorpusBuffer;
pub use generator::{ChainOrder, GenerationError, TextGenerator};
pub use handler::{strip_urls, Action, ConnectionEventHandler};
pub use identity::ConnectionIdentity;
pub use length_model::{compute_bounds, GenerationBounds, LengthStats};
pub use markov::MarkovGenerator;

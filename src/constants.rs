//! Application-wide constants for chat-simulator.
//!
//! This module centralizes protocol limits and tuning knobs so the
//! framing, statistics and transport layers agree on the same numbers.
//!
//! # Categories
//!
//! - **Server**: Chat server endpoint and capabilities
//! - **Limits**: Per-message character and byte ceilings
//! - **Generation**: Corpus and Markov sampling defaults
//! - **Timeouts**: Transport delays

use std::time::Duration;

// ============================================================================
// Server
// ============================================================================

/// Default chat server host.
pub const DEFAULT_SERVER_HOST: &str = "irc.chat.twitch.tv";

/// Default chat server port (plain-text IRC).
pub const DEFAULT_SERVER_PORT: u16 = 6667;

/// Capability extensions requested right after the welcome numeric.
///
/// Membership gives us JOIN/PART for other users, tags carries message
/// metadata, commands enables server-side notices such as `RECONNECT`.
pub const SERVER_CAPABILITIES: &[&str] = &[
    "twitch.tv/membership",
    "twitch.tv/tags",
    "twitch.tv/commands",
];

/// Prefix every OAuth token must carry when sent with `PASS`.
pub const OAUTH_TOKEN_PREFIX: &str = "oauth:";

/// Marker prefixed to channel names.
pub const CHANNEL_PREFIX: char = '#';

/// Delimiter wrapping client-to-client requests such as `/me` actions.
pub const CTCP_DELIMITER: char = '\x01';

// ============================================================================
// Limits
// ============================================================================

/// Declared per-message character limit of the chat server.
pub const MESSAGE_CHAR_LIMIT: usize = 500;

/// UTF-8 uses 1 to 4 bytes per character.
pub const DEFAULT_BYTE_CEILING_MULTIPLIER: usize = 4;

/// Hard byte ceiling for one outbound line, CRLF included.
pub const MESSAGE_BYTE_LIMIT: usize = DEFAULT_BYTE_CEILING_MULTIPLIER * MESSAGE_CHAR_LIMIT;

/// Longest inbound server line accepted, tags included. Longer lines are
/// skipped.
pub const MAX_INBOUND_LINE_BYTES: usize = 16 * 1024;

/// Line terminator appended to every outbound frame.
pub const LINE_TERMINATOR: &str = "\r\n";

// ============================================================================
// Generation
// ============================================================================

/// Default number of chat messages collected before one is generated.
pub const DEFAULT_MESSAGES_PER_GENERATION: usize = 200;

/// Smallest corpus a generation cycle can run on (sample stdev needs two).
pub const MIN_MESSAGES_PER_GENERATION: usize = 2;

/// Messages starting with this are commands for other bots.
pub const COMMAND_PREFIX: char = '!';

/// Mean corpus message length at which the Markov chain switches to order 2.
pub const SECOND_ORDER_MEAN_LENGTH: usize = 100;

/// Sampling walks attempted before a generation cycle gives up.
pub const DEFAULT_GENERATION_ATTEMPTS: usize = 10;

// ============================================================================
// Timeouts
// ============================================================================

/// Delay before the transport reconnects after losing the server.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// TCP connect timeout.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

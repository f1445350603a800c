//! Connection event handler.
//!
//! Maps each [`ConnectionEvent`] onto the engine and returns the protocol
//! actions the transport should perform. The handler does no I/O itself.
//!
//! | Event | Action |
//! |---|---|
//! | `Connected` | request capabilities, join channel |
//! | `Joined` (self) | log |
//! | `Disconnected` | log; corpus is kept for the next connection |
//! | `Notice` | log |
//! | `Message` starting with `!` | ignore |
//! | `Message` | strip URLs, feed the controller, send any generated line |

use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::constants::{COMMAND_PREFIX, SERVER_CAPABILITIES};
use crate::controller::GenerationController;
use crate::generator::TextGenerator;
use crate::identity::ConnectionIdentity;
use crate::irc::event::ConnectionEvent;
use crate::irc::framing::OutboundFrame;

/// `scheme://` followed by a run of non-whitespace. The scheme is ASCII.
#[allow(clippy::unwrap_used, reason = "constant pattern, covered by tests")]
static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-zA-Z][a-zA-Z0-9+.\-]*)://\S+").unwrap());

/// Schemes whose glued-on leading text is kept, longest first.
const WEB_SCHEMES: [&str; 2] = ["https", "http"];

/// Remove URL-like substrings from chat text.
///
/// Links in generated messages are the likeliest thing to get the bot
/// moderated, so they never reach the corpus. A word glued to the front of a
/// web link survives: `seehttps://x` becomes `see`.
pub fn strip_urls(text: &str) -> String {
    URL_PATTERN
        .replace_all(text, |caps: &Captures<'_>| {
            let scheme = caps.get(1).map_or("", |m| m.as_str());
            glued_prefix(scheme).to_string()
        })
        .into_owned()
}

/// Text in front of a trailing web scheme, or nothing.
fn glued_prefix(scheme: &str) -> &str {
    let lower = scheme.to_ascii_lowercase();
    WEB_SCHEMES
        .iter()
        .find(|web| lower.ends_with(*web))
        .map_or("", |web| &scheme[..scheme.len() - web.len()])
}

/// Protocol action requested by the handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `CAP REQ` for the listed capabilities.
    RequestCapabilities(Vec<String>),
    /// `JOIN` a channel.
    Join(String),
    /// `PRIVMSG` a framed message to a channel.
    Send {
        /// Target channel.
        channel: String,
        /// Pre-validated message.
        frame: OutboundFrame,
    },
}

/// Dispatches connection events onto the generation engine.
#[derive(Debug)]
pub struct ConnectionEventHandler<G> {
    identity: ConnectionIdentity,
    controller: GenerationController<G>,
}

impl<G: TextGenerator> ConnectionEventHandler<G> {
    /// Handler for `identity` driving `controller`.
    pub fn new(identity: ConnectionIdentity, controller: GenerationController<G>) -> Self {
        Self {
            identity,
            controller,
        }
    }

    /// Handle one event, returning actions in the order they must be sent.
    pub fn handle(&mut self, event: ConnectionEvent) -> Vec<Action> {
        match event {
            ConnectionEvent::Connected { server, port } => {
                log::info!(
                    "{} connected to {}:{}",
                    self.identity.login(),
                    server,
                    port
                );
                vec![
                    Action::RequestCapabilities(
                        SERVER_CAPABILITIES.iter().map(|c| (*c).to_string()).collect(),
                    ),
                    Action::Join(self.identity.channel().to_string()),
                ]
            }
            ConnectionEvent::Joined { user, .. } => {
                if user == self.identity.login() {
                    log::info!(
                        "{} joined {}'s chat room",
                        self.identity.login(),
                        self.identity.channel_owner()
                    );
                }
                Vec::new()
            }
            ConnectionEvent::Disconnected => {
                log::warn!("{} disconnected", self.identity.login());
                Vec::new()
            }
            ConnectionEvent::Notice { text, .. } => {
                log::warn!("{}", text);
                Vec::new()
            }
            ConnectionEvent::Message { user, channel, text } => {
                self.handle_message(&user, &channel, &text)
            }
        }
    }

    fn handle_message(&mut self, user: &str, channel: &str, text: &str) -> Vec<Action> {
        if channel != self.identity.channel() {
            return Vec::new();
        }
        // Commands for other bots.
        if text.starts_with(COMMAND_PREFIX) {
            return Vec::new();
        }

        let text = strip_urls(text);
        log::debug!("{}: {}", user, text);

        let Some(cycle) = self.controller.observe(text) else {
            return Vec::new();
        };

        match cycle.outcome {
            Ok(frame) => {
                log::info!("{}: {}", self.identity.login(), frame.text());
                vec![Action::Send {
                    channel: self.identity.channel().to_string(),
                    frame,
                }]
            }
            Err(e) => {
                log::warn!(
                    "[Generator] Skipping message (bounds {}..={}): {}",
                    cycle.bounds.min_length,
                    cycle.bounds.max_length,
                    e
                );
                Vec::new()
            }
        }
    }

    /// Identity this handler acts for.
    pub fn identity(&self) -> &ConnectionIdentity {
        &self.identity
    }

    /// The generation controller.
    pub fn controller(&self) -> &GenerationController<G> {
        &self.controller
    }
}

//! Connection lifecycle events.
//!
//! The transport turns server lines into [`ServerLine`]s. Keep-alive and
//! reconnect requests stay inside the transport; everything else reaches the
//! engine as a [`ConnectionEvent`] through a single dispatch function.

use super::message::IrcMessage;
use crate::constants::{CHANNEL_PREFIX, CTCP_DELIMITER};

/// Event delivered to the engine, in arrival order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Server accepted the login (welcome numeric).
    Connected {
        /// Server host we are talking to.
        server: String,
        /// Server port.
        port: u16,
    },

    /// Someone joined a channel.
    Joined {
        /// User who joined.
        user: String,
        /// Channel joined, with its `#` marker.
        channel: String,
    },

    /// Connection to the server was lost.
    Disconnected,

    /// Server notice.
    Notice {
        /// Notice target (a channel or `*`).
        target: String,
        /// Notice text.
        text: String,
    },

    /// Chat message posted to a channel.
    Message {
        /// Sending user.
        user: String,
        /// Channel the message was posted to.
        channel: String,
        /// Message text.
        text: String,
    },
}

/// Classification of one parsed server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerLine {
    /// Keep-alive that must be answered with `PONG <token>`.
    Ping(String),
    /// Server asks us to reconnect.
    Reconnect,
    /// Welcome numeric; the transport fills in server and port.
    Welcome,
    /// Engine-visible event.
    Event(ConnectionEvent),
    /// Anything we do not act on.
    Ignored,
}

impl ServerLine {
    /// Classify a parsed line.
    pub fn classify(msg: &IrcMessage) -> Self {
        match msg.command.as_str() {
            "PING" => Self::Ping(msg.trailing().unwrap_or_default().to_string()),
            "RECONNECT" => Self::Reconnect,
            "001" => Self::Welcome,
            "JOIN" => match (msg.source_user(), msg.param(0)) {
                (Some(user), Some(channel)) => Self::Event(ConnectionEvent::Joined {
                    user: user.to_string(),
                    channel: channel.to_string(),
                }),
                _ => Self::Ignored,
            },
            "NOTICE" => match (msg.param(0), msg.params.len()) {
                (Some(target), n) if n >= 2 => Self::Event(ConnectionEvent::Notice {
                    target: target.to_string(),
                    text: msg.trailing().unwrap_or_default().to_string(),
                }),
                _ => Self::Ignored,
            },
            "PRIVMSG" => match (msg.source_user(), msg.param(0), msg.params.len()) {
                // `/me` actions and other CTCP requests are not chat.
                _ if msg.trailing().is_some_and(|t| t.starts_with(CTCP_DELIMITER)) => {
                    Self::Ignored
                }
                (Some(user), Some(channel), n) if n >= 2 && channel.starts_with(CHANNEL_PREFIX) => {
                    Self::Event(ConnectionEvent::Message {
                        user: user.to_string(),
                        channel: channel.to_string(),
                        text: msg.trailing().unwrap_or_default().to_string(),
                    })
                }
                _ => Self::Ignored,
            },
            _ => Self::Ignored,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(line: &str) -> ServerLine {
        ServerLine::classify(&IrcMessage::parse(line).unwrap())
    }

    #[test]
    fn test_ping() {
        assert_eq!(
            classify("PING :tmi.twitch.tv"),
            ServerLine::Ping("tmi.twitch.tv".to_string())
        );
    }

    #[test]
    fn test_welcome_and_reconnect() {
        assert_eq!(classify(":tmi.twitch.tv 001 bot :Welcome"), ServerLine::Welcome);
        assert_eq!(classify(":tmi.twitch.tv RECONNECT"), ServerLine::Reconnect);
    }

    #[test]
    fn test_channel_message() {
        assert_eq!(
            classify("@id=1 :viewer!viewer@viewer.tmi.twitch.tv PRIVMSG #chan :hi all"),
            ServerLine::Event(ConnectionEvent::Message {
                user: "viewer".to_string(),
                channel: "#chan".to_string(),
                text: "hi all".to_string(),
            })
        );
    }

    #[test]
    fn test_private_message_ignored() {
        assert_eq!(
            classify(":viewer!viewer@host PRIVMSG bot :psst"),
            ServerLine::Ignored
        );
    }

    #[test]
    fn test_ctcp_action_ignored() {
        assert_eq!(
            classify(":viewer!viewer@host PRIVMSG #chan :\x01ACTION waves\x01"),
            ServerLine::Ignored
        );
        assert_eq!(
            classify(":viewer!viewer@host PRIVMSG #chan :\x01VERSION\x01"),
            ServerLine::Ignored
        );
    }

    #[test]
    fn test_join() {
        assert_eq!(
            classify(":bot!bot@bot.tmi.twitch.tv JOIN #chan"),
            ServerLine::Event(ConnectionEvent::Joined {
                user: "bot".to_string(),
                channel: "#chan".to_string(),
            })
        );
    }

    #[test]
    fn test_notice() {
        assert_eq!(
            classify("@msg-id=slow_on :tmi.twitch.tv NOTICE #chan :This room is now in slow mode."),
            ServerLine::Event(ConnectionEvent::Notice {
                target: "#chan".to_string(),
                text: "This room is now in slow mode.".to_string(),
            })
        );
    }

    #[test]
    fn test_unknown_command_ignored() {
        assert_eq!(classify(":tmi.twitch.tv 372 bot :motd"), ServerLine::Ignored);
        assert_eq!(classify(":tmi.twitch.tv CAP * ACK :twitch.tv/tags"), ServerLine::Ignored);
    }
}

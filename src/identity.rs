//! Connection identity.
//!
//! The login name, OAuth token and target channel are normalized once at
//! construction and never change afterwards. An identity that exists is a
//! valid one.

use crate::config::ConfigError;
use crate::constants::{CHANNEL_PREFIX, OAUTH_TOKEN_PREFIX};

/// Normalized (login, token, channel) triple used to authenticate and join.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionIdentity {
    login: String,
    token: String,
    channel: String,
}

impl ConnectionIdentity {
    /// Validate and normalize an identity.
    ///
    /// - `login` is lowercased.
    /// - `token` gets the `oauth:` prefix when it is missing; a token that is
    ///   only the prefix is rejected.
    /// - `channel` is lowercased and gets the `#` marker when it is missing.
    pub fn new(login: &str, token: &str, channel: &str) -> Result<Self, ConfigError> {
        if login.is_empty() {
            return Err(ConfigError::MissingLogin);
        }

        if token.is_empty() {
            return Err(ConfigError::MissingToken);
        }
        if token == OAUTH_TOKEN_PREFIX {
            return Err(ConfigError::IncompleteToken);
        }
        let token = if token.starts_with(OAUTH_TOKEN_PREFIX) {
            token.to_string()
        } else {
            format!("{OAUTH_TOKEN_PREFIX}{token}")
        };

        if channel.is_empty() {
            return Err(ConfigError::MissingChannel);
        }
        let channel = channel.to_lowercase();
        let channel = if channel.starts_with(CHANNEL_PREFIX) {
            channel
        } else {
            format!("{CHANNEL_PREFIX}{channel}")
        };

        Ok(Self {
            login: login.to_lowercase(),
            token,
            channel,
        })
    }

    /// Lowercased login name, also used as the nick.
    pub fn login(&self) -> &str {
        &self.login
    }

    /// Token including the `oauth:` scheme prefix.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Channel name including the `#` marker.
    pub fn channel(&self) -> &str {
        &self.channel
    }

    /// Channel name without the `#` marker, for log lines.
    pub fn channel_owner(&self) -> &str {
        self.channel
            .strip_prefix(CHANNEL_PREFIX)
            .unwrap_or(&self.channel)
    }
}

impl std::fmt::Debug for ConnectionIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionIdentity")
            .field("login", &self.login)
            .field("token", &"<redacted>")
            .field("channel", &self.channel)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_all_fields() {
        let identity = ConnectionIdentity::new("SimBot", "abcd1234", "SomeStreamer").unwrap();
        assert_eq!(identity.login(), "simbot");
        assert_eq!(identity.token(), "oauth:abcd1234");
        assert_eq!(identity.channel(), "#somestreamer");
        assert_eq!(identity.channel_owner(), "somestreamer");
    }

    #[test]
    fn test_keeps_existing_prefixes() {
        let identity = ConnectionIdentity::new("bot", "oauth:abcd1234", "#chan").unwrap();
        assert_eq!(identity.token(), "oauth:abcd1234");
        assert_eq!(identity.channel(), "#chan");
    }

    #[test]
    fn test_empty_login_rejected() {
        let err = ConnectionIdentity::new("", "oauth:abcd1234", "channel").unwrap_err();
        assert_eq!(err, ConfigError::MissingLogin);
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = ConnectionIdentity::new("username", "", "channel").unwrap_err();
        assert_eq!(err, ConfigError::MissingToken);
    }

    #[test]
    fn test_prefix_only_token_rejected() {
        let err = ConnectionIdentity::new("username", "oauth:", "channel").unwrap_err();
        assert_eq!(err, ConfigError::IncompleteToken);
    }

    #[test]
    fn test_empty_channel_rejected() {
        let err = ConnectionIdentity::new("username", "oauth:abcd1234", "").unwrap_err();
        assert_eq!(err, ConfigError::MissingChannel);
    }

    #[test]
    fn test_debug_redacts_token() {
        let identity = ConnectionIdentity::new("bot", "oauth:secret", "chan").unwrap();
        let debug = format!("{identity:?}");
        assert!(!debug.contains("secret"));
        assert!(debug.contains("#chan"));
    }
}

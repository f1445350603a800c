//! Inbound protocol line parser.
//!
//! Parses one server line (terminator already stripped):
//!
//! ```text
//! [@tag=value;tag2 ][:nick!user@host ]COMMAND [param ...][ :trailing]
//! ```

use std::collections::HashMap;

/// Errors from parsing a server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Line is empty after stripping.
    Empty,
    /// Line has tags or a prefix but no command.
    MissingCommand,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "empty line"),
            Self::MissingCommand => write!(f, "line has no command"),
        }
    }
}

impl std::error::Error for ParseError {}

/// Message source (`nick!user@host` or a bare server name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prefix {
    /// Nick, or server name for server-originated lines.
    pub nick: String,
    /// User part, when present.
    pub user: Option<String>,
    /// Host part, when present.
    pub host: Option<String>,
}

impl Prefix {
    fn parse(raw: &str) -> Self {
        let (rest, host) = match raw.split_once('@') {
            Some((rest, host)) => (rest, Some(host.to_string())),
            None => (raw, None),
        };
        let (nick, user) = match rest.split_once('!') {
            Some((nick, user)) => (nick.to_string(), Some(user.to_string())),
            None => (rest.to_string(), None),
        };
        Self { nick, user, host }
    }

    /// User name if present, nick otherwise.
    pub fn user_or_nick(&self) -> &str {
        self.user.as_deref().unwrap_or(&self.nick)
    }
}

/// A parsed server line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrcMessage {
    /// Message tags (IRCv3), unescaped.
    pub tags: HashMap<String, String>,
    /// Message source.
    pub prefix: Option<Prefix>,
    /// Command or numeric, uppercased.
    pub command: String,
    /// Parameters, trailing parameter last.
    pub params: Vec<String>,
}

impl IrcMessage {
    /// Parse a single line.
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let mut rest = line.trim_end_matches(['\r', '\n']);
        if rest.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut tags = HashMap::new();
        if let Some(stripped) = rest.strip_prefix('@') {
            let (raw_tags, after) = stripped.split_once(' ').unwrap_or((stripped, ""));
            for pair in raw_tags.split(';').filter(|p| !p.is_empty()) {
                let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
                tags.insert(key.to_string(), unescape_tag_value(value));
            }
            rest = after.trim_start_matches(' ');
        }

        let mut prefix = None;
        if let Some(stripped) = rest.strip_prefix(':') {
            let (raw_prefix, after) = stripped.split_once(' ').unwrap_or((stripped, ""));
            prefix = Some(Prefix::parse(raw_prefix));
            rest = after.trim_start_matches(' ');
        }

        let (head, trailing) = match rest.split_once(" :") {
            Some((head, trailing)) => (head, Some(trailing)),
            None => match rest.strip_prefix(':') {
                Some(trailing) => ("", Some(trailing)),
                None => (rest, None),
            },
        };

        let mut words = head.split(' ').filter(|w| !w.is_empty());
        let command = words
            .next()
            .ok_or(ParseError::MissingCommand)?
            .to_ascii_uppercase();
        let mut params: Vec<String> = words.map(str::to_string).collect();
        if let Some(trailing) = trailing {
            params.push(trailing.to_string());
        }

        Ok(Self {
            tags,
            prefix,
            command,
            params,
        })
    }

    /// Parameter at `index`, if present.
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// Last parameter, usually the trailing text.
    pub fn trailing(&self) -> Option<&str> {
        self.params.last().map(String::as_str)
    }

    /// Source user, when the line has a prefix.
    pub fn source_user(&self) -> Option<&str> {
        self.prefix.as_ref().map(Prefix::user_or_nick)
    }
}

/// Undo IRCv3 tag value escaping.
fn unescape_tag_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some(':') => out.push(';'),
            Some('s') => out.push(' '),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

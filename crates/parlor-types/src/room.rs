//! Room addressing.
//!
//! Every room owned by the web gateway has a full address (a "jid") made
//! of the fixed [`WEB_JID_PREFIX`] followed by a short [`RoomId`]. Other
//! channels in a multi-channel deployment use other prefixes, so anything
//! without this prefix is never handled here.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Address space prefix of every room owned by the web gateway.
pub const WEB_JID_PREFIX: &str = "web:";

/// Channel kind reported in chat metadata for web rooms.
pub const WEB_CHANNEL: &str = "web";

/// Separator used when deriving a [`RoomId`] from a display name.
const SEPARATOR: char = '-';

/// Reasons a string is not a valid [`RoomId`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomIdError {
    /// The identifier was empty.
    #[error("room identifier is empty")]
    Empty,

    /// The identifier contained a character outside `a-z`, `0-9` and `-`.
    #[error("room identifier contains invalid character {0:?}")]
    InvalidChar(char),

    /// The identifier started or ended with a separator.
    #[error("room identifier must not start or end with '-'")]
    EdgeSeparator,
}

/// Short, URL-safe room identifier (the part after [`WEB_JID_PREFIX`]).
///
/// Only lowercase ASCII letters, digits and `-` are allowed, and the
/// identifier never starts or ends with `-`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoomId(String);

impl RoomId {
    /// Parse a room identifier taken verbatim from a URL path segment.
    pub fn parse(raw: &str) -> Result<Self, RoomIdError> {
        if raw.is_empty() {
            return Err(RoomIdError::Empty);
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == SEPARATOR))
        {
            return Err(RoomIdError::InvalidChar(bad));
        }
        if raw.starts_with(SEPARATOR) || raw.ends_with(SEPARATOR) {
            return Err(RoomIdError::EdgeSeparator);
        }
        Ok(Self(raw.to_owned()))
    }

    /// Derive a room identifier from a human-entered display name.
    ///
    /// Lowercases and trims the name, collapses every run of characters
    /// that are not ASCII alphanumeric into a single `-`, and strips
    /// separators from both ends. Returns `None` if nothing is left.
    ///
    /// ```
    /// use parlor_types::RoomId;
    ///
    /// let id = RoomId::from_display_name("Work Stuff!!").map(|id| id.to_string());
    /// assert_eq!(id.as_deref(), Some("work-stuff"));
    /// ```
    pub fn from_display_name(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        let mut slug = String::with_capacity(lowered.len());
        let mut pending_separator = false;

        for ch in lowered.chars() {
            if ch.is_ascii_alphanumeric() {
                if pending_separator && !slug.is_empty() {
                    slug.push(SEPARATOR);
                }
                pending_separator = false;
                slug.push(ch);
            } else {
                pending_separator = true;
            }
        }

        if slug.is_empty() { None } else { Some(Self(slug)) }
    }

    /// Recover the short identifier from a full room address.
    ///
    /// Returns `None` for addresses outside the web address space.
    pub fn from_jid(jid: &str) -> Option<Self> {
        jid.strip_prefix(WEB_JID_PREFIX)
            .and_then(|short| Self::parse(short).ok())
    }

    /// Full room address (`web:<id>`).
    pub fn jid(&self) -> String {
        format!("{WEB_JID_PREFIX}{}", self.0)
    }

    /// Address-space qualified storage folder name for this room.
    pub fn folder(&self) -> String {
        format!("{WEB_CHANNEL}-{}", self.0)
    }

    /// Borrow the short identifier.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for RoomId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoomId {
    type Err = RoomIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RoomId {
    type Error = RoomIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<RoomId> for String {
    fn from(id: RoomId) -> Self {
        id.0
    }
}

/// Whether a room address belongs to the web gateway's address space.
pub fn owns_jid(jid: &str) -> bool {
    jid.starts_with(WEB_JID_PREFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn derive(name: &str) -> Option<String> {
        RoomId::from_display_name(name).map(String::from)
    }

    #[test]
    fn derives_simple_names() {
        assert_eq!(derive("My Project").as_deref(), Some("my-project"));
        assert_eq!(derive("Work Stuff!!").as_deref(), Some("work-stuff"));
        assert_eq!(derive("  --Hello,   World--  ").as_deref(), Some("hello-world"));
        assert_eq!(derive("Room 42").as_deref(), Some("room-42"));
    }

    #[test]
    fn derivation_collapses_mixed_runs() {
        assert_eq!(derive("a . _ / b").as_deref(), Some("a-b"));
        assert_eq!(derive("Café Crème").as_deref(), Some("caf-cr-me"));
    }

    #[test]
    fn derivation_is_idempotent() {
        for name in ["My Project", "Work Stuff!!", "x", "A--B__C"] {
            let once = derive(name).unwrap_or_default();
            let twice = derive(&once).unwrap_or_default();
            assert_eq!(once, twice, "derivation of {name:?} is not idempotent");
        }
    }

    #[test]
    fn derivation_rejects_names_without_alphanumerics() {
        assert_eq!(derive(""), None);
        assert_eq!(derive("   "), None);
        assert_eq!(derive("!!!---???"), None);
    }

    #[test]
    fn parse_accepts_valid_identifiers() {
        assert!(RoomId::parse("main").is_ok());
        assert!(RoomId::parse("my-project-2").is_ok());
    }

    #[test]
    fn parse_rejects_malformed_identifiers() {
        assert_eq!(RoomId::parse(""), Err(RoomIdError::Empty));
        assert_eq!(RoomId::parse("My Room"), Err(RoomIdError::InvalidChar('M')));
        assert_eq!(RoomId::parse("a b"), Err(RoomIdError::InvalidChar(' ')));
        assert_eq!(RoomId::parse("-main"), Err(RoomIdError::EdgeSeparator));
        assert_eq!(RoomId::parse("main-"), Err(RoomIdError::EdgeSeparator));
    }

    #[test]
    fn jid_roundtrip() {
        let id = RoomId::parse("work-stuff").unwrap_or_else(|_| RoomId(String::new()));
        assert_eq!(id.jid(), "web:work-stuff");
        assert_eq!(RoomId::from_jid(&id.jid()), Some(id));
    }

    #[test]
    fn foreign_jids_are_not_owned() {
        assert!(owns_jid("web:main"));
        assert!(!owns_jid("tg:12345"));
        assert!(!owns_jid("120363@g.us"));
        assert_eq!(RoomId::from_jid("tg:main"), None);
    }

    #[test]
    fn folder_is_address_space_qualified() {
        let id = RoomId::from_display_name("Work Stuff").unwrap_or_else(|| RoomId(String::new()));
        assert_eq!(id.folder(), "web-work-stuff");
    }

    #[test]
    fn deserialization_validates() {
        let ok: Result<RoomId, _> = serde_json::from_str("\"main\"");
        assert!(ok.is_ok());
        let bad: Result<RoomId, _> = serde_json::from_str("\"Not Valid\"");
        assert!(bad.is_err());
    }
}

//! Channel identity - composite `kind:id` identifier
//!
//! A channel is globally identified by its kind (e.g. "messaging", "team")
//! and an id unique within that kind, written as a single `kind:id` string.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Composite channel identifier (`kind:id`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChannelId {
    kind: String,
    id: String,
}

impl ChannelId {
    /// Create a new ChannelId from its parts
    ///
    /// Parts are not validated here; payload validation rejects empty
    /// identities before they reach the store.
    pub fn new(kind: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            id: id.into(),
        }
    }

    /// Parse from the `kind:id` string form
    pub fn parse(s: &str) -> Result<Self, ChannelIdParseError> {
        match s.split_once(':') {
            Some((kind, id)) if !kind.is_empty() && !id.is_empty() => Ok(Self::new(kind, id)),
            _ => Err(ChannelIdParseError::InvalidFormat),
        }
    }

    /// Channel kind ("type" in the wire representation)
    #[inline]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Kind-scoped id part
    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Check whether both parts are non-empty
    #[inline]
    pub fn is_valid(&self) -> bool {
        !self.kind.is_empty() && !self.id.is_empty()
    }
}

/// Error when parsing a ChannelId from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelIdParseError {
    #[error("invalid channel id format, expected `kind:id`")]
    InvalidFormat,
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

impl std::str::FromStr for ChannelId {
    type Err = ChannelIdParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ChannelId::parse(s)
    }
}

// Serialize as the joined `kind:id` string, matching the wire form
impl Serialize for ChannelId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ChannelId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ChannelId::parse(&s).map_err(serde::de::Error::custom)
    }
}

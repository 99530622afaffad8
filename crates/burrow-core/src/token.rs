use crate::base62;
use crate::error::{CoreError, Result};
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::fmt::Display;

/// Added to every sequence id before encoding, so the first links get
/// four-symbol tokens instead of single letters that are trivial to enumerate.
pub const SEQUENCE_OFFSET: u64 = 1_000_000;

/// Largest sequence id that still encodes to a distinct token.
pub const MAX_SEQUENCE: u64 = u64::MAX - SEQUENCE_OFFSET;

/// A public, opaque short token.
///
/// Every `Token` is a valid base62 string. Tokens handed out by the
/// allocator are derived from the store's sequence id with
/// [`Token::from_sequence`]; tokens arriving from clients go through
/// [`Token::parse`].
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(SmolStr);

impl Token {
    /// Derives the token for a store-assigned sequence id.
    ///
    /// Injective on `0..=MAX_SEQUENCE`. Larger ids all saturate to the token
    /// of `u64::MAX`; stores refuse to allocate them (see
    /// [`check_sequence`](crate::store::check_sequence)).
    pub fn from_sequence(sequence_id: u64) -> Self {
        Self(SmolStr::new(base62::encode(
            sequence_id.saturating_add(SEQUENCE_OFFSET),
        )))
    }

    /// Like [`Token::from_sequence`], but fails instead of saturating.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidToken`] if `sequence_id` is above
    /// [`MAX_SEQUENCE`].
    pub fn try_from_sequence(sequence_id: u64) -> Result<Self> {
        let value = sequence_id.checked_add(SEQUENCE_OFFSET).ok_or_else(|| {
            CoreError::InvalidToken(format!(
                "sequence id {sequence_id} is above the largest encodable id {MAX_SEQUENCE}"
            ))
        })?;
        Ok(Self(SmolStr::new(base62::encode(value))))
    }

    /// Parses a client-supplied token.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidToken`] if `raw` is not a base62 string.
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let raw = raw.as_ref();
        base62::decode(raw)?;
        Ok(Self(SmolStr::new(raw)))
    }

    /// Recovers the sequence id this token was derived from.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidToken`] if the decoded value is below
    /// [`SEQUENCE_OFFSET`], which the allocator never produces.
    pub fn sequence(&self) -> Result<u64> {
        let value = base62::decode(&self.0)?;
        value.checked_sub(SEQUENCE_OFFSET).ok_or_else(|| {
            CoreError::InvalidToken(format!("'{}' is below the sequence offset", self.0))
        })
    }

    /// Returns the token as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Token").field(&self.0).finish()
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::str::FromStr for Token {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Serialize for Token {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Token {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = SmolStr::deserialize(deserializer)?;
        Token::parse(raw).map_err(serde::de::Error::custom)
    }
}

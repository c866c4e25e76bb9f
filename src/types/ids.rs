use super::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use uuid::Uuid;

/// Strong typing for record ids with phantom types.
///
/// Record ids are opaque: whatever the service keys a record by is kept
/// verbatim, so lookups in a record map match the wire keys exactly.
pub struct Id<T> {
    value: String,
    _phantom: PhantomData<T>,
}

/// Marker types for different ID kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionMarker;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionViewMarker;

/// Type aliases for specific ID types
pub type BlockId = Id<BlockMarker>;
pub type SpaceId = Id<SpaceMarker>;
pub type UserId = Id<UserMarker>;
pub type CollectionId = Id<CollectionMarker>;
pub type CollectionViewId = Id<CollectionViewMarker>;

impl<T> Id<T> {
    /// Wraps an id exactly as the service spells it.
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            _phantom: PhantomData,
        }
    }

    /// Create a new random v4 UUID ID in the dashed form the v3 API uses
    pub fn new_v4() -> Self {
        Self::new(Uuid::new_v4().hyphenated().to_string())
    }

    /// Get the ID as a string reference
    pub fn as_str(&self) -> &str {
        &self.value
    }
}

// Manual impls: derives would demand the marker types implement these too.
impl<T> Clone for Id<T> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T> fmt::Debug for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({:?})", self.value)
    }
}

impl<T> PartialEq for Id<T> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Must agree with `str`'s hash for `Borrow<str>` lookups.
        self.value.as_str().hash(state)
    }
}

impl<T> Borrow<str> for Id<T> {
    fn borrow(&self) -> &str {
        &self.value
    }
}

impl<T> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

impl<T> From<&str> for Id<T> {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl<T> From<String> for Id<T> {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl<T> Serialize for Id<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.value.serialize(serializer)
    }
}

impl<'de, T> Deserialize<'de> for Id<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Ok(Self::new(value))
    }
}

/// NotionId - a user-supplied Notion ID, normalized from any of the forms
/// people paste (32 hex characters, dashed UUID, or a notion.so URL).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NotionId(String); // Store the non-hyphenated version internally

impl NotionId {
    /// Returns the ID as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the hyphenated UUID format the v3 API keys records by.
    pub fn to_hyphenated(&self) -> String {
        format!(
            "{}-{}-{}-{}-{}",
            &self.0[0..8],
            &self.0[8..12],
            &self.0[12..16],
            &self.0[16..20],
            &self.0[20..32]
        )
    }

    /// The block id this Notion ID names.
    pub fn to_block_id(&self) -> BlockId {
        BlockId::new(self.to_hyphenated())
    }

    /// Creates a NotionId from a validated hex string.
    fn from_hex(hex: &str) -> Result<Self, ValidationError> {
        if hex.len() == 32 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(NotionId(hex.to_lowercase()))
        } else {
            Err(ValidationError::InvalidId(format!(
                "Invalid Notion ID format: {}",
                hex
            )))
        }
    }

    /// Parses various Notion ID formats.
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        let cleaned = input.trim().trim_end_matches('/');

        // 1. UUID format with dashes
        if let Ok(uuid) = Uuid::parse_str(cleaned) {
            return Ok(NotionId(uuid.as_simple().to_string()));
        }

        // 2. Direct 32-char hex ID
        if cleaned.len() == 32 && cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
            return Self::from_hex(cleaned);
        }

        // 3. Extract from URLs
        if cleaned.contains("notion") {
            return Self::extract_from_url(cleaned);
        }

        Err(ValidationError::InvalidId(format!(
            "Could not parse Notion ID from: {}",
            input
        )))
    }

    /// Extracts ID from Notion URLs.
    fn extract_from_url(url: &str) -> Result<Self, ValidationError> {
        lazy_static::lazy_static! {
            static ref ID_REGEX: Regex = Regex::new(
                r"(?:[/-])([a-fA-F0-9]{32}|[a-fA-F0-9]{8}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{4}-[a-fA-F0-9]{12})(?:[/?#]|$)"
            ).expect("Failed to compile Notion ID regex - this is a bug in the code");
        }

        if let Some(captures) = ID_REGEX.captures(url) {
            if let Some(id_match) = captures.get(1) {
                let id = id_match.as_str().replace('-', "");
                return Self::from_hex(&id);
            }
        }

        Err(ValidationError::InvalidId(format!(
            "No valid ID found in URL: {}",
            url
        )))
    }
}

impl fmt::Display for NotionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_notion_id_forms() {
        let id = NotionId::parse("550e8400e29b41d4a716446655440000").unwrap();
        assert_eq!(id.as_str(), "550e8400e29b41d4a716446655440000");

        let id = NotionId::parse("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(id.as_str(), "550e8400e29b41d4a716446655440000");

        let id =
            NotionId::parse("https://www.notion.so/Test-Page-550e8400e29b41d4a716446655440000")
                .unwrap();
        assert_eq!(id.to_hyphenated(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_invalid_ids() {
        assert!(NotionId::parse("too-short").is_err());
        assert!(NotionId::parse("not-hex-chars-00000000000000000").is_err());
        assert!(NotionId::parse("").is_err());
    }

    #[test]
    fn test_block_id_is_opaque() {
        let id = BlockId::new("r");
        assert_eq!(id.as_str(), "r");
        let parsed: BlockId = serde_json::from_str("\"Not-A-Uuid\"").unwrap();
        assert_eq!(parsed.as_str(), "Not-A-Uuid");
    }

    #[test]
    fn test_block_id_lookup_by_str() {
        let mut map = HashMap::new();
        map.insert(BlockId::new("abc"), 1);
        assert_eq!(map.get("abc"), Some(&1));
    }

    #[test]
    fn test_new_v4_is_dashed() {
        let id = BlockId::new_v4();
        assert_eq!(id.as_str().len(), 36);
        assert!(NotionId::parse(id.as_str()).is_ok());
    }
}

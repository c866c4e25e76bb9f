// src/types/domain_types.rs
//! Domain-specific newtypes for type safety and validation.

use super::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// The `token_v2` session cookie the v3 API authenticates with.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Create a new token with validation
    pub fn new(token: impl Into<String>) -> Result<Self, ValidationError> {
        let token = token.into();
        let token = token.trim();

        if token.is_empty() {
            return Err(ValidationError::InvalidToken {
                reason: "token cannot be empty".to_string(),
            });
        }

        // The token travels inside a cookie header value.
        if token
            .chars()
            .any(|c| c.is_whitespace() || c.is_control() || c == ';')
        {
            return Err(ValidationError::InvalidToken {
                reason: "token cannot contain whitespace, control characters or ';'".to_string(),
            });
        }

        Ok(Self(token.to_string()))
    }

    /// Get the token as a string reference
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `cookie` header value carrying this token.
    pub fn cookie_value(&self) -> String {
        format!("token={}", self.0)
    }
}

impl fmt::Display for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Redact token in display
        let visible: String = self.0.chars().take(6).collect();
        write!(f, "{}...", visible)
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiToken({})", self)
    }
}

/// Validated URL type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedUrl(Url);

// Manual Serialize/Deserialize implementation for Url
impl Serialize for ValidatedUrl {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.as_str().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ValidatedUrl {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ValidatedUrl::parse(&s).map_err(serde::de::Error::custom)
    }
}

impl ValidatedUrl {
    /// Create a new validated URL
    pub fn parse(url: &str) -> Result<Self, ValidationError> {
        match Url::parse(url) {
            Ok(parsed_url) => {
                if parsed_url.scheme() != "http" && parsed_url.scheme() != "https" {
                    return Err(ValidationError::InvalidUrl {
                        url: url.to_string(),
                        reason: "Only HTTP and HTTPS URLs are supported".to_string(),
                    });
                }
                Ok(Self(parsed_url))
            }
            Err(e) => Err(ValidationError::InvalidUrl {
                url: url.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// Parses a base URL that endpoint names are appended to.
    ///
    /// A missing trailing slash is added so `join` keeps the last path segment.
    pub fn parse_base(url: &str) -> Result<Self, ValidationError> {
        if url.ends_with('/') {
            Self::parse(url)
        } else {
            Self::parse(&format!("{}/", url))
        }
    }

    /// Get the URL as a string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Resolves an endpoint name (e.g. `loadPageChunk`) against this base.
    pub fn endpoint(&self, endpoint: &str) -> Result<Url, ValidationError> {
        self.0
            .join(endpoint.trim_start_matches('/'))
            .map_err(|e| ValidationError::InvalidUrl {
                url: format!("{}{}", self.0, endpoint),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for ValidatedUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A dotted path to a block property, e.g. `properties.title`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PropertyPath(String);

impl PropertyPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    /// Parses a user-supplied path, rejecting empty segments.
    pub fn parse(path: &str) -> Result<Self, ValidationError> {
        if path.is_empty() {
            return Err(ValidationError::EmptyField("property path"));
        }
        if path.split('.').any(str::is_empty) {
            return Err(ValidationError::InvalidPropertyPath {
                path: path.to_string(),
                reason: "path segments cannot be empty".to_string(),
            });
        }
        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path as the segment list a `set` operation carries.
    pub fn segments(&self) -> Vec<String> {
        self.0.split('.').map(str::to_string).collect()
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for PropertyPath {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

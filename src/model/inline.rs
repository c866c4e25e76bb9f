// src/model/inline.rs
//! Inline rich text in the compact array encoding the v3 API uses.
//!
//! A property value is a list of spans, each `[text]` or `[text, attrs]`,
//! where every attribute is `[code]` for a style flag or `[code, value]`
//! for a link, a user mention or a date. The grammar is decoded one level
//! at a time: read the code first, then decode the value the code demands.

use crate::constants::INLINE_AT;
use crate::types::UserId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use thiserror::Error;

/// Style flags of a span, packed into one byte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttrFlags(u8);

impl AttrFlags {
    pub const BOLD: Self = Self(1);
    pub const CODE: Self = Self(1 << 1);
    pub const ITALIC: Self = Self(1 << 2);
    pub const STRIKETHROUGH: Self = Self(1 << 3);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    /// Flags paired with their wire code, in encoding order.
    const CODES: [(AttrFlags, &'static str); 4] = [
        (AttrFlags::BOLD, "b"),
        (AttrFlags::ITALIC, "i"),
        (AttrFlags::STRIKETHROUGH, "s"),
        (AttrFlags::CODE, "c"),
    ];

    fn from_code(code: &str) -> Option<Self> {
        Self::CODES
            .iter()
            .find(|(_, c)| *c == code)
            .map(|(flag, _)| *flag)
    }
}

impl std::ops::BitOr for AttrFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

/// The single value-carrying attribute a span may have.
///
/// Links, mentions and dates share one slot in the encoding, so a span
/// carries at most one of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineTarget {
    Link(String),
    User(UserId),
    Date(Date),
}

/// A date embedded in rich text (`["d", {...}]`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Date {
    #[serde(rename = "type")]
    pub kind: DateKind,
    pub start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_zone: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateKind {
    Date,
    DateRange,
    DateTime,
    DateTimeRange,
}

impl DateKind {
    pub fn as_str(self) -> &'static str {
        match self {
            DateKind::Date => "date",
            DateKind::DateRange => "daterange",
            DateKind::DateTime => "datetime",
            DateKind::DateTimeRange => "datetimerange",
        }
    }
}

impl Date {
    /// Encodes the date back into its wire object.
    pub fn to_wire(&self) -> Value {
        let mut map = Map::new();
        map.insert("type".to_string(), json!(self.kind.as_str()));
        map.insert(
            "start_date".to_string(),
            json!(self.start_date.format("%Y-%m-%d").to_string()),
        );
        let optional = [
            ("start_time", self.start_time.clone()),
            (
                "end_date",
                self.end_date.map(|d| d.format("%Y-%m-%d").to_string()),
            ),
            ("end_time", self.end_time.clone()),
            ("date_format", self.date_format.clone()),
            ("time_zone", self.time_zone.clone()),
        ];
        for (key, value) in optional {
            if let Some(value) = value {
                map.insert(key.to_string(), json!(value));
            }
        }
        Value::Object(map)
    }
}

/// One run of text and its attributes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineBlock {
    pub text: String,
    #[serde(default, skip_serializing_if = "AttrFlags::is_empty")]
    pub flags: AttrFlags,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<InlineTarget>,
}

impl InlineBlock {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            flags: AttrFlags::empty(),
            target: None,
        }
    }

    pub fn with_flags(mut self, flags: AttrFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_target(mut self, target: InlineTarget) -> Self {
        self.target = Some(target);
        self
    }

    /// True when the span has neither style flags nor a target.
    pub fn is_plain(&self) -> bool {
        self.flags.is_empty() && self.target.is_none()
    }

    pub fn is_bold(&self) -> bool {
        self.flags.contains(AttrFlags::BOLD)
    }

    pub fn is_italic(&self) -> bool {
        self.flags.contains(AttrFlags::ITALIC)
    }

    pub fn is_strikethrough(&self) -> bool {
        self.flags.contains(AttrFlags::STRIKETHROUGH)
    }

    pub fn is_code(&self) -> bool {
        self.flags.contains(AttrFlags::CODE)
    }

    pub fn link(&self) -> Option<&str> {
        match &self.target {
            Some(InlineTarget::Link(url)) => Some(url),
            _ => None,
        }
    }

    pub fn user_id(&self) -> Option<&UserId> {
        match &self.target {
            Some(InlineTarget::User(id)) => Some(id),
            _ => None,
        }
    }

    pub fn date(&self) -> Option<&Date> {
        match &self.target {
            Some(InlineTarget::Date(date)) => Some(date),
            _ => None,
        }
    }

    /// True when the text is the placeholder the service uses for @mentions and @dates.
    pub fn is_mention_placeholder(&self) -> bool {
        self.text == INLINE_AT
    }

    /// Encodes the span back into its compact array form.
    pub fn to_wire(&self) -> Value {
        let mut attrs: Vec<Value> = AttrFlags::CODES
            .iter()
            .filter(|(flag, _)| self.flags.contains(*flag))
            .map(|(_, code)| json!([code]))
            .collect();

        match &self.target {
            Some(InlineTarget::Link(url)) => attrs.push(json!(["a", url])),
            Some(InlineTarget::User(id)) => attrs.push(json!(["u", id.as_str()])),
            Some(InlineTarget::Date(date)) => attrs.push(json!(["d", date.to_wire()])),
            None => {}
        }

        if attrs.is_empty() {
            json!([self.text])
        } else {
            json!([self.text, attrs])
        }
    }
}

/// Where in the grammar a decode failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlinePosition {
    SpanList,
    Span,
    AttributeList,
    Attribute,
}

impl fmt::Display for InlinePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InlinePosition::SpanList => "span list",
            InlinePosition::Span => "span",
            InlinePosition::AttributeList => "attribute list",
            InlinePosition::Attribute => "attribute",
        };
        write!(f, "{}", name)
    }
}

/// A rich-text value that does not follow the span grammar.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum InlineDecodeError {
    #[error("{position} is not an array: {value}")]
    NotAnArray {
        position: InlinePosition,
        value: Value,
    },

    #[error("{position} is empty: {value}")]
    Empty {
        position: InlinePosition,
        value: Value,
    },

    #[error("{position} has {actual} elements, expected 1 or 2: {value}")]
    WrongArity {
        position: InlinePosition,
        actual: usize,
        value: Value,
    },

    #[error("{position} has a non-string where a string is required: {value}")]
    NotAString {
        position: InlinePosition,
        value: Value,
    },

    #[error("unexpected attribute '{code}': {value}")]
    UnknownAttribute { code: String, value: Value },

    #[error("span carries more than one link/user/date attribute: {value}")]
    ConflictingTarget { value: Value },

    #[error("invalid date attribute ({message}): {value}")]
    InvalidDate { message: String, value: Value },
}

/// Parses one property's rich-text value into spans.
///
/// The first malformed entry aborts the whole parse.
pub fn parse_inline_blocks(raw: &Value) -> Result<Vec<InlineBlock>, InlineDecodeError> {
    let spans = expect_array(raw, InlinePosition::SpanList)?;
    if spans.is_empty() {
        return Err(InlineDecodeError::Empty {
            position: InlinePosition::SpanList,
            value: raw.clone(),
        });
    }
    spans.iter().map(parse_span).collect()
}

/// Encodes spans into the compact array form `parse_inline_blocks` reads.
pub fn encode_inline_blocks(blocks: &[InlineBlock]) -> Value {
    Value::Array(blocks.iter().map(InlineBlock::to_wire).collect())
}

/// Concatenates the text of all spans.
pub fn plain_text(blocks: &[InlineBlock]) -> String {
    blocks.iter().map(|b| b.text.as_str()).collect()
}

fn parse_span(raw: &Value) -> Result<InlineBlock, InlineDecodeError> {
    let parts = expect_array(raw, InlinePosition::Span)?;
    match parts.as_slice() {
        [text] => Ok(InlineBlock::plain(expect_str(text, InlinePosition::Span)?)),
        [text, attrs] => {
            let mut block = InlineBlock::plain(expect_str(text, InlinePosition::Span)?);
            for attr in expect_array(attrs, InlinePosition::AttributeList)? {
                apply_attribute(&mut block, attr)?;
            }
            Ok(block)
        }
        [] => Err(InlineDecodeError::Empty {
            position: InlinePosition::Span,
            value: raw.clone(),
        }),
        _ => Err(InlineDecodeError::WrongArity {
            position: InlinePosition::Span,
            actual: parts.len(),
            value: raw.clone(),
        }),
    }
}

fn apply_attribute(block: &mut InlineBlock, raw: &Value) -> Result<(), InlineDecodeError> {
    let parts = expect_array(raw, InlinePosition::Attribute)?;
    let (code, rest) = parts
        .split_first()
        .ok_or_else(|| InlineDecodeError::Empty {
            position: InlinePosition::Attribute,
            value: raw.clone(),
        })?;
    let code = expect_str(code, InlinePosition::Attribute)?;

    let unknown = || InlineDecodeError::UnknownAttribute {
        code: code.to_string(),
        value: raw.clone(),
    };

    let target = match (code, rest) {
        (_, []) => {
            let flag = AttrFlags::from_code(code).ok_or_else(unknown)?;
            block.flags.insert(flag);
            return Ok(());
        }
        ("a", [url]) => InlineTarget::Link(expect_str(url, InlinePosition::Attribute)?.to_string()),
        ("u", [user]) => InlineTarget::User(UserId::new(expect_str(
            user,
            InlinePosition::Attribute,
        )?)),
        ("d", [date]) => InlineTarget::Date(parse_date(date)?),
        (_, [_]) => return Err(unknown()),
        _ => {
            return Err(InlineDecodeError::WrongArity {
                position: InlinePosition::Attribute,
                actual: parts.len(),
                value: raw.clone(),
            })
        }
    };

    if block.target.is_some() {
        return Err(InlineDecodeError::ConflictingTarget { value: raw.clone() });
    }
    block.target = Some(target);
    Ok(())
}

fn parse_date(raw: &Value) -> Result<Date, InlineDecodeError> {
    if !raw.is_object() {
        return Err(InlineDecodeError::InvalidDate {
            message: "expected an object".to_string(),
            value: raw.clone(),
        });
    }
    Date::deserialize(raw).map_err(|e| InlineDecodeError::InvalidDate {
        message: e.to_string(),
        value: raw.clone(),
    })
}

fn expect_array(raw: &Value, position: InlinePosition) -> Result<&Vec<Value>, InlineDecodeError> {
    raw.as_array().ok_or_else(|| InlineDecodeError::NotAnArray {
        position,
        value: raw.clone(),
    })
}

fn expect_str(raw: &Value, position: InlinePosition) -> Result<&str, InlineDecodeError> {
    raw.as_str().ok_or_else(|| InlineDecodeError::NotAString {
        position,
        value: raw.clone(),
    })
}

// src/model/format.rs
//! Per-type `format` payloads of a block.
//!
//! Fields the service omits fall back to their defaults, so a sparse
//! payload still decodes; a payload of the wrong shape does not.

use crate::constants::{IMAGE_PROXY_PREFIX, NOTION_HOST, SECURE_FILE_PREFIX};
use serde::{Deserialize, Serialize};

/// Format of a page block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatPage {
    /// e.g. `/images/page-cover/gradients_11.jpg`
    pub page_cover: Option<String>,
    pub page_cover_position: Option<f64>,
    pub page_font: Option<String>,
    pub page_full_width: bool,
    /// An uploaded image URL or an emoji such as "✉️"
    pub page_icon: Option<String>,
    pub page_small_text: bool,
}

impl FormatPage {
    /// The cover as an absolute, reachable URL.
    pub fn cover_url(&self) -> Option<String> {
        let cover = self.page_cover.as_deref()?;
        if cover.starts_with('/') {
            Some(format!("{}{}", NOTION_HOST, cover))
        } else {
            Some(accessible_image_url(cover))
        }
    }
}

/// Format of a bookmark block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatBookmark {
    pub bookmark_icon: Option<String>,
    pub bookmark_cover: Option<String>,
}

/// Format of an image block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatImage {
    pub block_aspect_ratio: Option<f64>,
    pub block_full_width: bool,
    pub block_page_width: bool,
    pub block_preserve_scale: bool,
    pub block_width: Option<f64>,
    pub display_source: Option<String>,
}

/// Format of a video block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatVideo {
    pub block_width: Option<f64>,
    pub block_height: Option<f64>,
    pub display_source: Option<String>,
    pub block_full_width: bool,
    pub block_page_width: bool,
    pub block_aspect_ratio: Option<f64>,
    pub block_preserve_scale: bool,
}

/// Format of a text block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatText {
    pub block_color: Option<String>,
}

/// Format of a table block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatTable {
    pub table_wrap: bool,
    pub table_properties: Vec<TableProperty>,
}

/// One column of a table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableProperty {
    pub width: Option<f64>,
    pub visible: bool,
    pub property: String,
}

/// Format of a column block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatColumn {
    /// e.g. 0.5 for a half-width column
    pub column_ratio: Option<f64>,
}

/// Routes secure uploads through the image proxy; other URLs pass through.
pub fn accessible_image_url(source: &str) -> String {
    if source.starts_with(IMAGE_PROXY_PREFIX) || !source.starts_with(SECURE_FILE_PREFIX) {
        return source.to_string();
    }
    let escaped: String = url::form_urlencoded::byte_serialize(source.as_bytes()).collect();
    format!("{}{}", IMAGE_PROXY_PREFIX, escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn sparse_payload_uses_defaults() {
        let format: FormatImage = serde_json::from_value(json!({"block_width": 240})).unwrap();
        assert_eq!(format.block_width, Some(240.0));
        assert!(!format.block_full_width);
        assert_eq!(format.display_source, None);
    }

    #[test]
    fn wrong_shape_fails() {
        let result: Result<FormatTable, _> =
            serde_json::from_value(json!({"table_properties": "nope"}));
        assert!(result.is_err());
    }

    #[test]
    fn secure_uploads_go_through_proxy() {
        let source = "https://s3-us-west-2.amazonaws.com/secure.notion-static.com/abc/pic.png";
        let url = accessible_image_url(source);
        assert!(url.starts_with("https://www.notion.so/image/https%3A%2F%2Fs3-us-west-2"));
        assert_eq!(
            accessible_image_url("https://example.com/a.png"),
            "https://example.com/a.png"
        );
    }

    #[test]
    fn relative_cover_resolves_against_host() {
        let format = FormatPage {
            page_cover: Some("/images/page-cover/gradients_11.jpg".to_string()),
            ..FormatPage::default()
        };
        assert_eq!(
            format.cover_url().as_deref(),
            Some("https://www.notion.so/images/page-cover/gradients_11.jpg")
        );
    }
}

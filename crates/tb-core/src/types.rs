//! Common types used throughout Taskboard RS

use serde::{Deserialize, Serialize};

/// Default tag color offered by the tag form
pub const DEFAULT_TAG_COLOR: &str = "#4f46e5";

/// Hex color as stored on tags (e.g. "#4f46e5")
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `#rgb` or `#rrggbb`
    pub fn is_valid_hex(&self) -> bool {
        let Some(digits) = self.0.strip_prefix('#') else {
            return false;
        };
        matches!(digits.len(), 3 | 6) && digits.chars().all(|c| c.is_ascii_hexdigit())
    }

    /// Color with a two-digit alpha suffix, used for unselected tag chips
    pub fn with_alpha(&self, alpha: &str) -> String {
        format!("{}{}", self.0, alpha)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self(DEFAULT_TAG_COLOR.to_string())
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

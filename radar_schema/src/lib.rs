//! Data contracts shared by the market radar crates.
//!
//! Everything here is plain data: the item model, the two enumerations that
//! drive chart placement, and the small records exchanged between the core
//! state machine and the terminal front-end.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;

pub const BUILTIN_SAMPLE_ITEMS: &str = include_str!("data/sample_items.json");

/// One untyped spreadsheet row, keyed by column header.
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Thematic quadrant of the radar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Macro environment", alias = "Macro")]
    Macro,
    #[serde(rename = "Competition")]
    Competition,
    #[serde(rename = "Buyer behavior", alias = "Buyer")]
    Buyer,
    #[serde(rename = "Technology")]
    Technology,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Macro,
        Category::Competition,
        Category::Buyer,
        Category::Technology,
    ];

    /// Canonical label, as it appears in imported spreadsheets.
    pub fn label(self) -> &'static str {
        match self {
            Category::Macro => "Macro environment",
            Category::Competition => "Competition",
            Category::Buyer => "Buyer behavior",
            Category::Technology => "Technology",
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            Category::Macro => "macro",
            Category::Competition => "competition",
            Category::Buyer => "buyer",
            Category::Technology => "technology",
        }
    }

    /// Case-insensitive lookup by canonical label.
    pub fn from_label(value: &str) -> Option<Self> {
        let needle = value.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.label().to_lowercase() == needle)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::from_label(trimmed)
            .or_else(|| {
                let needle = trimmed.to_lowercase();
                Self::ALL.into_iter().find(|category| category.short_name() == needle)
            })
            .ok_or_else(|| ParseLabelError::Category(s.to_string()))
    }
}

/// Time-distance band of an item; nearer horizons sit closer to the center.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Impact {
    #[serde(rename = "Near-term", alias = "Near")]
    Near,
    #[serde(rename = "Medium-term", alias = "Medium")]
    Medium,
    #[serde(rename = "Longer-term", alias = "Long")]
    Long,
}

impl Impact {
    /// Ordered from the center outwards.
    pub const ALL: [Impact; 3] = [Impact::Near, Impact::Medium, Impact::Long];

    pub fn label(self) -> &'static str {
        match self {
            Impact::Near => "Near-term",
            Impact::Medium => "Medium-term",
            Impact::Long => "Longer-term",
        }
    }

    fn short_name(self) -> &'static str {
        match self {
            Impact::Near => "near",
            Impact::Medium => "medium",
            Impact::Long => "long",
        }
    }

    pub fn from_label(value: &str) -> Option<Self> {
        let needle = value.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|impact| impact.label().to_lowercase() == needle)
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Impact {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::from_label(trimmed)
            .or_else(|| {
                let needle = trimmed.to_lowercase();
                Self::ALL.into_iter().find(|impact| impact.short_name() == needle)
            })
            .ok_or_else(|| ParseLabelError::Impact(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseLabelError {
    #[error("unknown category '{0}'")]
    Category(String),
    #[error("unknown impact '{0}'")]
    Impact(String),
    #[error("invalid color '{0}', expected #rrggbb")]
    Color(String),
    #[error("invalid percentage '{0}'")]
    Percent(String),
}

/// A percentage of the chart's side length, serialized as `"42.5%"`.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Default)]
pub struct Percent(pub f64);

impl Percent {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.0)
    }
}

impl FromStr for Percent {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let number = trimmed.strip_suffix('%').unwrap_or(trimmed).trim();
        number
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(Percent)
            .ok_or_else(|| ParseLabelError::Percent(s.to_string()))
    }
}

impl Serialize for Percent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Percent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Text(String),
            Number(f64),
        }

        match Repr::deserialize(deserializer)? {
            Repr::Text(text) => text.parse().map_err(de::Error::custom),
            Repr::Number(value) => Ok(Percent(value)),
        }
    }
}

/// Chart-relative placement; (50%, 50%) is the center.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub top: Percent,
    pub left: Percent,
}

impl Position {
    pub fn new(top: f64, left: f64) -> Self {
        Self {
            top: Percent(top),
            left: Percent(left),
        }
    }
}

/// One market signal shown on the radar.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MarketItem {
    pub id: i64,
    pub text: String,
    pub category: Category,
    pub impact: Impact,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl MarketItem {
    pub fn new(id: i64, text: impl Into<String>, category: Category, impact: Impact) -> Self {
        Self {
            id,
            text: text.into(),
            category,
            impact,
            position: None,
        }
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }
}

/// 24-bit color, written as `#rrggbb` in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub const WHITE: Rgb = Rgb(0xff, 0xff, 0xff);
    pub const INK: Rgb = Rgb(0x00, 0x3d, 0x4f);
    pub const GRID: Rgb = Rgb(0xd1, 0xd5, 0xdb);
    pub const TEXT: Rgb = Rgb(0x33, 0x33, 0x33);

    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl FromStr for Rgb {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseLabelError::Color(s.to_string());
        let digits = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&digits[range], 16).map_err(|_| invalid())
        };
        Ok(Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

impl<'de> Deserialize<'de> for Rgb {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Hover tooltip; coordinates are in the front-end's own units.
#[derive(Clone, Debug, PartialEq)]
pub struct TooltipData {
    pub content: String,
    pub x: f64,
    pub y: f64,
}

/// Named, timestamped copy of the whole item collection.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryCheckpoint {
    pub name: String,
    pub timestamp: DateTime<Utc>,
    pub items: Vec<MarketItem>,
}

/// Items shown before anything is imported.
pub fn sample_items() -> Vec<MarketItem> {
    serde_json::from_str(BUILTIN_SAMPLE_ITEMS).expect("builtin sample items should parse")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_parse_case_insensitively() {
        assert_eq!(Category::from_label("BUYER BEHAVIOR"), Some(Category::Buyer));
        assert_eq!(Category::from_label("macro environment"), Some(Category::Macro));
        assert_eq!(Category::from_label("macro"), None);
        assert_eq!(" Macro ".parse::<Category>(), Ok(Category::Macro));
        assert_eq!("medium".parse::<Impact>(), Ok(Impact::Medium));
        assert_eq!(Impact::from_label("longer-TERM"), Some(Impact::Long));
        assert_eq!(Impact::from_label("soon"), None);
        assert!("Space".parse::<Category>().is_err());
    }

    #[test]
    fn percent_round_trips_through_json() {
        let position = Position::new(12.5, 80.0);
        let json = serde_json::to_string(&position).unwrap();
        assert_eq!(json, r#"{"top":"12.5%","left":"80%"}"#);
        let back: Position = serde_json::from_str(&json).unwrap();
        assert_eq!(back, position);
        let numeric: Position = serde_json::from_str(r#"{"top":3,"left":"4 %"}"#).unwrap();
        assert_eq!(numeric, Position::new(3.0, 4.0));
    }

    #[test]
    fn colors_parse_from_hex() {
        assert_eq!("#47a1ad".parse::<Rgb>().unwrap(), Rgb(0x47, 0xa1, 0xad));
        assert_eq!(Rgb(0xf2, 0x61, 0x7a).hex(), "#f2617a");
        assert!("47a1ad".parse::<Rgb>().is_err());
        assert!("#47a1a".parse::<Rgb>().is_err());
    }

    #[test]
    fn sample_items_cover_every_category() {
        let items = sample_items();
        assert_eq!(items.len(), 25);
        for category in Category::ALL {
            assert!(items.iter().any(|item| item.category == category));
        }
        assert!(items.iter().all(|item| item.position.is_none()));
    }
}

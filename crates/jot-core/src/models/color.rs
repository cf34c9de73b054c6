//! Note color palette.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::Error;

/// Fixed palette for note cards. `Default` is the uncolored sentinel.
///
/// The backend stores the hex value, so serialization round-trips through
/// [`NoteColor::as_hex`]. Stored values outside the palette deserialize as
/// `Default` rather than failing the whole document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum NoteColor {
    #[default]
    Default,
    Red,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
}

impl NoteColor {
    pub const ALL: [Self; 7] = [
        Self::Default,
        Self::Red,
        Self::Orange,
        Self::Yellow,
        Self::Green,
        Self::Blue,
        Self::Purple,
    ];

    #[must_use]
    pub const fn as_hex(self) -> &'static str {
        match self {
            Self::Default => "#FFFFFF",
            Self::Red => "#EF4444",
            Self::Orange => "#F97316",
            Self::Yellow => "#EAB308",
            Self::Green => "#22C55E",
            Self::Blue => "#3B82F6",
            Self::Purple => "#A855F7",
        }
    }

    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Red => "red",
            Self::Orange => "orange",
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Blue => "blue",
            Self::Purple => "purple",
        }
    }

    /// Parse a stored hex value, treating anything outside the palette as
    /// `Default` (the server copy wins over strictness).
    #[must_use]
    pub fn from_hex_or_default(raw: &str) -> Self {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|color| color.as_hex().eq_ignore_ascii_case(raw))
            .unwrap_or_default()
    }
}

impl fmt::Display for NoteColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for NoteColor {
    type Err = Error;

    /// Accepts palette names (`green`) and hex values (`#22C55E`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        Self::ALL
            .into_iter()
            .find(|color| {
                color.name().eq_ignore_ascii_case(raw) || color.as_hex().eq_ignore_ascii_case(raw)
            })
            .ok_or_else(|| Error::Validation(format!("unknown note color: {raw}")))
    }
}

impl Serialize for NoteColor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_hex())
    }
}

impl<'de> Deserialize<'de> for NoteColor {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_hex_or_default(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_has_seven_distinct_hex_values() {
        let mut seen = std::collections::HashSet::new();
        for color in NoteColor::ALL {
            assert!(seen.insert(color.as_hex()));
        }
        assert_eq!(seen.len(), 7);
    }

    #[test]
    fn from_hex_matches_case_insensitively() {
        assert_eq!(NoteColor::from_hex_or_default("#22c55e"), NoteColor::Green);
        assert_eq!(NoteColor::from_hex_or_default(" #3B82F6 "), NoteColor::Blue);
    }

    #[test]
    fn unknown_hex_falls_back_to_default() {
        assert_eq!(NoteColor::from_hex_or_default("#012345"), NoteColor::Default);
        assert_eq!(NoteColor::from_hex_or_default(""), NoteColor::Default);
    }

    #[test]
    fn parses_names_and_hex_values() {
        assert_eq!("green".parse::<NoteColor>().unwrap(), NoteColor::Green);
        assert_eq!("#EF4444".parse::<NoteColor>().unwrap(), NoteColor::Red);
        assert!("chartreuse".parse::<NoteColor>().is_err());
    }

    #[test]
    fn serializes_as_hex_string() {
        let json = serde_json::to_string(&NoteColor::Green).unwrap();
        assert_eq!(json, "\"#22C55E\"");

        let parsed: NoteColor = serde_json::from_str("\"#22C55E\"").unwrap();
        assert_eq!(parsed, NoteColor::Green);
    }
}

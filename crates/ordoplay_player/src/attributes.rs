// SPDX-License-Identifier: MIT OR Apache-2.0
//! Host-facing player attributes.
//!
//! Hosts configure a player through string attributes, the way markup sets
//! them on an element. Parsing is lenient: malformed numbers fall back to
//! their defaults instead of failing.

/// Attributes whose changes the player reacts to
pub const OBSERVED_ATTRIBUTES: [&str; 5] = ["src", "quality", "width", "height", "auto"];

/// A parsed attribute change
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeChange {
    /// New project source; `None` when the attribute was removed
    Source(Option<String>),
    /// Resolution multiplier
    Quality(f64),
    /// Output width; `None` restores the project's own width
    Width(Option<f64>),
    /// Output height; `None` restores the project's own height
    Height(Option<f64>),
    /// Autoplay flag
    Auto(bool),
}

impl AttributeChange {
    /// Parse a change of `name` to `value`. Unobserved names yield `None`.
    pub fn parse(name: &str, value: Option<&str>) -> Option<Self> {
        let change = match name {
            "src" => AttributeChange::Source(value.filter(|v| !v.is_empty()).map(str::to_string)),
            "quality" => AttributeChange::Quality(parse_number(value).unwrap_or(1.0)),
            "width" => AttributeChange::Width(parse_number(value)),
            "height" => AttributeChange::Height(parse_number(value)),
            "auto" => AttributeChange::Auto(parse_flag(value)),
            _ => return None,
        };
        Some(change)
    }
}

/// Current attribute values of a player
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerAttributes {
    /// Project source
    pub src: Option<String>,
    /// Resolution multiplier
    pub quality: f64,
    /// Width override
    pub width: Option<f64>,
    /// Height override
    pub height: Option<f64>,
    /// Play whenever ready
    pub auto: bool,
}

impl Default for PlayerAttributes {
    fn default() -> Self {
        Self {
            src: None,
            quality: 1.0,
            width: None,
            height: None,
            auto: false,
        }
    }
}

impl PlayerAttributes {
    /// Record a change
    pub fn apply(&mut self, change: &AttributeChange) {
        match change {
            AttributeChange::Source(src) => self.src.clone_from(src),
            AttributeChange::Quality(quality) => self.quality = *quality,
            AttributeChange::Width(width) => self.width = *width,
            AttributeChange::Height(height) => self.height = *height,
            AttributeChange::Auto(auto) => self.auto = *auto,
        }
    }
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

fn parse_flag(value: Option<&str>) -> bool {
    value.is_some_and(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_numbers() {
        assert_eq!(
            AttributeChange::parse("quality", Some("0.5")),
            Some(AttributeChange::Quality(0.5))
        );
        assert_eq!(
            AttributeChange::parse("quality", Some("high")),
            Some(AttributeChange::Quality(1.0))
        );
        assert_eq!(
            AttributeChange::parse("width", Some(" 640 ")),
            Some(AttributeChange::Width(Some(640.0)))
        );
        assert_eq!(
            AttributeChange::parse("height", None),
            Some(AttributeChange::Height(None))
        );
        assert_eq!(
            AttributeChange::parse("height", Some("NaN")),
            Some(AttributeChange::Height(None))
        );
    }

    #[test]
    fn test_parse_flags_and_source() {
        assert_eq!(AttributeChange::parse("auto", Some("")), Some(AttributeChange::Auto(false)));
        assert_eq!(AttributeChange::parse("auto", Some("yes")), Some(AttributeChange::Auto(true)));
        assert_eq!(AttributeChange::parse("auto", None), Some(AttributeChange::Auto(false)));
        assert_eq!(
            AttributeChange::parse("src", Some("intro")),
            Some(AttributeChange::Source(Some("intro".to_string())))
        );
        assert_eq!(AttributeChange::parse("src", Some("")), Some(AttributeChange::Source(None)));
        assert_eq!(AttributeChange::parse("style", Some("x")), None);
    }

    #[test]
    fn test_observed_attributes_parse() {
        let mut attributes = PlayerAttributes::default();
        for name in OBSERVED_ATTRIBUTES {
            let change = AttributeChange::parse(name, Some("2")).unwrap();
            attributes.apply(&change);
        }
        assert_eq!(attributes.src.as_deref(), Some("2"));
        assert_eq!(attributes.quality, 2.0);
        assert_eq!(attributes.width, Some(2.0));
        assert!(attributes.auto);
    }
}

//! Recommendation preferences
//!
//! Vibe and group size are validated strictly; adventurousness and budget
//! silently fall back to their defaults on unrecognized values.

use serde::{Deserialize, Serialize};

/// Occasion type for an ordering plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vibe {
    DateNight,
    Friends,
    Family,
    Business,
}

impl Vibe {
    pub const VALID_VALUES: &'static [&'static str] =
        &["date_night", "friends", "family", "business"];

    /// Strict parse; an unknown value is a validation failure
    pub fn parse(value: &str) -> Option<Vibe> {
        match value {
            "date_night" => Some(Vibe::DateNight),
            "friends" => Some(Vibe::Friends),
            "family" => Some(Vibe::Family),
            "business" => Some(Vibe::Business),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Vibe::DateNight => "date_night",
            Vibe::Friends => "friends",
            Vibe::Family => "family",
            Vibe::Business => "business",
        }
    }
}

/// Willingness to order unfamiliar dishes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Adventurousness {
    Low,
    #[default]
    Medium,
    High,
}

impl Adventurousness {
    /// Lenient parse; unknown values fall back to the default
    pub fn parse_or_default(value: &str) -> Adventurousness {
        match value {
            "low" => Adventurousness::Low,
            "medium" => Adventurousness::Medium,
            "high" => Adventurousness::High,
            _ => Adventurousness::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Adventurousness::Low => "low",
            Adventurousness::Medium => "medium",
            Adventurousness::High => "high",
        }
    }
}

/// Budget sensitivity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Low,
    #[default]
    Moderate,
    High,
}

impl Budget {
    /// Lenient parse; unknown values fall back to the default
    pub fn parse_or_default(value: &str) -> Budget {
        match value {
            "low" => Budget::Low,
            "moderate" => Budget::Moderate,
            "high" => Budget::High,
            _ => Budget::default(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Budget::Low => "low",
            Budget::Moderate => "moderate",
            Budget::High => "high",
        }
    }
}

/// Normalized preference profile used for both the prompt and the cache key.
///
/// Field order is fixed, so serializing this struct yields a canonical JSON
/// string regardless of key insertion order in the incoming request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PreferenceProfile {
    #[serde(default)]
    pub adventurousness: Adventurousness,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub dietary: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vibe_rejects_unknown_values() {
        assert_eq!(Vibe::parse("date_night"), Some(Vibe::DateNight));
        assert_eq!(Vibe::parse("romantic"), None);
        assert_eq!(Vibe::parse(""), None);
    }

    #[test]
    fn adventurousness_defaults_on_invalid() {
        assert_eq!(Adventurousness::parse_or_default("high"), Adventurousness::High);
        assert_eq!(Adventurousness::parse_or_default("extreme"), Adventurousness::Medium);
    }

    #[test]
    fn budget_defaults_on_invalid() {
        assert_eq!(Budget::parse_or_default("low"), Budget::Low);
        assert_eq!(Budget::parse_or_default("unlimited"), Budget::Moderate);
    }

    #[test]
    fn profile_serialization_is_canonical() {
        // Two JSON inputs with different key order deserialize to the same
        // profile, which re-serializes to one canonical string.
        let a: PreferenceProfile = serde_json::from_str(
            r#"{"dietary":["no_pork"],"budget":"high","adventurousness":"low"}"#,
        )
        .unwrap();
        let b: PreferenceProfile = serde_json::from_str(
            r#"{"adventurousness":"low","dietary":["no_pork"],"budget":"high"}"#,
        )
        .unwrap();
        assert_eq!(a, b);
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}

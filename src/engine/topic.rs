use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use icu_normalizer::ComposingNormalizerBorrowed;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A study topic.
///
/// Two topics are the same topic when their canonical keys match: the raw
/// name is NFKC-normalized, trimmed, whitespace-collapsed and lowercased.
/// The label keeps the caller's casing from the first reference and is what
/// gets displayed and persisted.
#[derive(Clone, Debug)]
pub struct Topic {
    key: String,
    label: String,
}

impl Topic {
    /// Returns `None` when the name is empty after trimming.
    pub fn parse(raw: &str) -> Option<Self> {
        let label = collapse_whitespace(raw);
        if label.is_empty() {
            return None;
        }
        let key = canonical_key(&label);
        Some(Self { key, label })
    }

    /// Parse `raw`, substituting `fallback` for blank input.
    pub fn parse_or(raw: &str, fallback: &str) -> Self {
        Self::parse(raw)
            .or_else(|| Self::parse(fallback))
            .unwrap_or_else(|| Self {
                key: "general".to_string(),
                label: "general".to_string(),
            })
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

pub fn canonical_key(raw: &str) -> String {
    let nfkc = ComposingNormalizerBorrowed::new_nfkc();
    let normalized = nfkc.normalize(raw.trim());
    collapse_whitespace(&normalized).to_lowercase()
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

impl PartialEq for Topic {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Topic {}

impl Hash for Topic {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl PartialOrd for Topic {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Topic {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key)
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl Serialize for Topic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.label)
    }
}

impl<'de> Deserialize<'de> for Topic {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Topic::parse(&raw).ok_or_else(|| D::Error::custom("topic name is empty"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_rejects_blank() {
        assert!(Topic::parse("").is_none());
        assert!(Topic::parse("   \t ").is_none());
    }

    #[test]
    fn test_case_and_whitespace_fold_to_same_key() {
        let a = Topic::parse("  Marine   Biology ").unwrap();
        let b = Topic::parse("marine biology").unwrap();
        assert_eq!(a, b);
        assert_eq!(a.key(), "marine biology");
        assert_eq!(a.label(), "Marine Biology");
    }

    #[test]
    fn test_compatibility_forms_fold() {
        // Fullwidth letters normalize to ASCII under NFKC.
        let wide = Topic::parse("Ｍａｔｈ").unwrap();
        assert_eq!(wide, Topic::parse("math").unwrap());
    }

    #[test]
    fn test_parse_or_uses_fallback() {
        let t = Topic::parse_or("  ", "General Knowledge");
        assert_eq!(t.label(), "General Knowledge");
        let t = Topic::parse_or("", "");
        assert_eq!(t.key(), "general");
    }

    #[test]
    fn test_serde_keeps_label() {
        let t = Topic::parse("Robots").unwrap();
        let json = serde_json::to_string(&t).unwrap();
        assert_eq!(json, "\"Robots\"");
        let back: Topic = serde_json::from_str(&json).unwrap();
        assert_eq!(back.label(), "Robots");
        assert!(serde_json::from_str::<Topic>("\"  \"").is_err());
    }
}

//! Entity normalization
//!
//! Canonicalizes the raw slot bag produced by upstream extraction:
//! - Alias keys rewritten to the fixed vocabulary
//! - Generation, loyalty tier and cabin class mapped to stored spellings
//! - Station codes and record locators upper-cased
//! - Null, empty and non-scalar values dropped
//!
//! Every rule maps its own output to itself, so normalizing an already
//! normalized bag is a no-op.

use crate::parameters::PARAMETER_KEYS;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Raw entities as returned by extraction (any JSON object)
pub type RawEntities = serde_json::Map<String, Value>;

/// Alternate spellings seen from extraction, mapped to canonical keys
const KEY_ALIASES: &[(&str, &str)] = &[
    ("origin_code", "origin"),
    ("dest_code", "dest"),
    ("destination", "dest"),
    ("vip_id", "record_locator"),
    ("loyalty_level", "loyalty_tier"),
    ("passenger_class", "class"),
    ("cabin_class", "class"),
    ("class_of_service", "class"),
    ("aircraft_type", "fleet_type"),
    ("fleet", "fleet_type"),
    ("feedback_ID", "feedback_id"),
    ("min_score", "min_food_satisfaction"),
    ("max_score", "max_food_satisfaction"),
];

/// Scalar value of a normalized slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
}

impl EntityValue {
    /// Accept JSON scalars; null, blank strings, arrays and objects yield `None`
    fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| EntityValue::Text(trimmed.to_string()))
            }
            Value::Number(n) => match n.as_i64() {
                Some(i) => Some(EntityValue::Integer(i)),
                None => n.as_f64().filter(|f| f.is_finite()).map(EntityValue::Float),
            },
            Value::Bool(b) => Some(EntityValue::Bool(*b)),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            EntityValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer view used for threshold slots
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            EntityValue::Integer(i) => Some(*i),
            EntityValue::Float(f) => Some(f.round() as i64),
            EntityValue::Text(s) => s
                .parse::<i64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite()).map(|f| f.round() as i64)),
            EntityValue::Bool(_) => None,
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            EntityValue::Text(s) => Value::from(s.as_str()),
            EntityValue::Integer(i) => Value::from(*i),
            EntityValue::Float(f) => Value::from(*f),
            EntityValue::Bool(b) => Value::from(*b),
        }
    }
}

/// Normalized slot bag, keys unique and sorted
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityBag(BTreeMap<String, EntityValue>);

impl EntityBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&EntityValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: EntityValue) {
        self.0.insert(key.into(), value);
    }

    pub fn remove(&mut self, key: &str) -> Option<EntityValue> {
        self.0.remove(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &EntityValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Back to a raw JSON object (used to feed a bag through `normalize` again)
    pub fn to_raw(&self) -> RawEntities {
        self.0.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
    }
}

/// Parse extraction output into a raw bag. Code fences are stripped;
/// anything that is not a JSON object gives an empty bag.
pub fn parse_raw_entities(text: &str) -> Option<RawEntities> {
    match serde_json::from_str::<Value>(strip_code_fences(text)) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Strip a surrounding markdown code fence (```json ... ```) if present
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    let Some(start) = text.find("```") else {
        return text;
    };
    let body = &text[start + 3..];
    let body = body.strip_prefix("json").unwrap_or(body);
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

fn canonical_key(key: &str) -> &str {
    KEY_ALIASES
        .iter()
        .find(|(alias, _)| *alias == key)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(key)
}

/// Lower-case and keep only ASCII alphanumerics
fn compact(text: &str) -> String {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

pub fn canonical_generation(text: &str) -> Option<&'static str> {
    let c = compact(text);
    if c.contains("boomer") {
        Some("Boomer")
    } else if c.contains("millennial") || c.contains("millenial") {
        Some("Millennial")
    } else if c.contains("genx") || c.contains("generationx") {
        Some("Gen X")
    } else if c.contains("genz") || c.contains("generationz") || c.contains("zoomer") {
        Some("Gen Z")
    } else {
        None
    }
}

pub fn canonical_loyalty_tier(text: &str) -> Option<&'static str> {
    let c = compact(text);
    // "nonelite" before the metal tiers, "1k" before "platinum"
    if c.contains("nonelite") {
        Some("non-elite")
    } else if c.contains("1k") {
        Some("premier 1k")
    } else if c.contains("platinum") {
        Some("premier platinum")
    } else if c.contains("gold") {
        Some("premier gold")
    } else if c.contains("silver") {
        Some("premier silver")
    } else {
        None
    }
}

pub fn canonical_class(text: &str) -> Option<&'static str> {
    let c = compact(text);
    if c.contains("economy") || c.contains("coach") {
        Some("Economy")
    } else if c.contains("business") {
        Some("Business")
    } else if c.contains("first") {
        Some("First")
    } else {
        None
    }
}

/// Normalize a raw entity bag. Never fails; unknown keys and unrecognised
/// values pass through.
pub fn normalize(raw: &RawEntities) -> EntityBag {
    let mut bag = EntityBag::new();

    // Key renaming; a canonical key only wins when it carries a value
    for (key, value) in raw {
        let Some(value) = EntityValue::from_json(value) else {
            if !value.is_null() && !value.is_string() {
                tracing::debug!(key = %key, "Dropping non-scalar entity value");
            }
            continue;
        };

        let canonical = canonical_key(key);
        if canonical == key {
            bag.insert(canonical, value);
        } else if !bag.contains_key(canonical) && !has_value(raw, canonical) {
            bag.insert(canonical, value);
        }
    }

    rewrite_text(&mut bag, "generation", |s| canonical_generation(s).map(str::to_string));
    rewrite_text(&mut bag, "loyalty_tier", |s| canonical_loyalty_tier(s).map(str::to_string));
    rewrite_text(&mut bag, "class", |s| canonical_class(s).map(str::to_string));
    for key in ["origin", "dest", "record_locator"] {
        rewrite_text(&mut bag, key, |s| Some(s.to_ascii_uppercase()));
    }

    // Threshold slots are integers downstream
    for key in PARAMETER_KEYS {
        if let Some(value) = bag.get(key) {
            match value.as_integer() {
                Some(i) => bag.insert(key, EntityValue::Integer(i)),
                None => {
                    tracing::debug!(key = key, "Dropping non-numeric threshold");
                    bag.remove(key);
                }
            }
        }
    }

    tracing::debug!(raw_keys = raw.len(), normalized_keys = bag.len(), "Entities normalized");
    bag
}

fn has_value(raw: &RawEntities, key: &str) -> bool {
    raw.get(key).and_then(EntityValue::from_json).is_some()
}

fn rewrite_text(bag: &mut EntityBag, key: &str, rule: impl Fn(&str) -> Option<String>) {
    let Some(replacement) = bag.get(key).and_then(EntityValue::as_text).and_then(|s| rule(s)) else {
        return;
    };
    bag.insert(key, EntityValue::Text(replacement));
}

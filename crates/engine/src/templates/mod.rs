//! Query templates
//!
//! A static catalog of `(intent, required slots) -> Cypher` entries, an
//! immutable registry ordered by specificity and the matcher that picks the
//! most specific template that binds every supplied slot.

mod catalog;
mod registry;

pub use registry::{find_template, TemplateRegistry};

use crate::parameters::PARAMETER_KEYS;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical slot keys understood by templates and fallback synthesis
pub const ENTITY_KEYS: [&str; 8] = [
    "generation",
    "loyalty_tier",
    "class",
    "fleet_type",
    "origin",
    "dest",
    "record_locator",
    "feedback_id",
];

/// Whether `key` belongs to the fixed slot vocabulary (entities + thresholds)
pub fn is_vocabulary_key(key: &str) -> bool {
    ENTITY_KEYS.contains(&key) || PARAMETER_KEYS.contains(&key)
}

/// Registry-defined intents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    AnalyzeDelays,
    AnalyzeSatisfaction,
    AnalyzeLoyalty,
    AnalyzeFleet,
    SearchNetwork,
    LookupDetails,
}

impl Intent {
    pub const ALL: [Intent; 6] = [
        Intent::AnalyzeDelays,
        Intent::AnalyzeSatisfaction,
        Intent::AnalyzeLoyalty,
        Intent::AnalyzeFleet,
        Intent::SearchNetwork,
        Intent::LookupDetails,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Intent::AnalyzeDelays => "analyze_delays",
            Intent::AnalyzeSatisfaction => "analyze_satisfaction",
            Intent::AnalyzeLoyalty => "analyze_loyalty",
            Intent::AnalyzeFleet => "analyze_fleet",
            Intent::SearchNetwork => "search_network",
            Intent::LookupDetails => "lookup_details",
        }
    }

    /// Exact label lookup; anything else is not a known intent
    pub fn from_label(label: &str) -> Option<Intent> {
        Intent::ALL.into_iter().find(|i| i.label() == label)
    }

    pub fn labels() -> Vec<&'static str> {
        Intent::ALL.iter().map(|i| i.label()).collect()
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One canned query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryTemplate {
    /// Stable dotted name reported with every resolution
    pub name: &'static str,
    pub intent: Intent,
    /// Slots that must all be present for the template to apply
    pub required: &'static [&'static str],
    pub cypher: &'static str,
}

impl QueryTemplate {
    /// Whether the query text binds `$key` (not merely a longer name sharing the prefix)
    pub fn references(&self, key: &str) -> bool {
        references_param(self.cypher, key)
    }
}

pub fn references_param(cypher: &str, key: &str) -> bool {
    let needle = format!("${}", key);
    cypher.match_indices(&needle).any(|(at, _)| {
        cypher[at + needle.len()..]
            .chars()
            .next()
            .map_or(true, |c| !(c.is_ascii_alphanumeric() || c == '_'))
    })
}

/// Every `$name` bound in the query text, in order of first appearance
pub fn bound_params(cypher: &str) -> Vec<&str> {
    let mut names: Vec<&str> = Vec::new();
    for (at, _) in cypher.match_indices('$') {
        let rest = &cypher[at + 1..];
        let end = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
            .unwrap_or(rest.len());
        let name = &rest[..end];
        if !name.is_empty() && !names.contains(&name) {
            names.push(name);
        }
    }
    names
}

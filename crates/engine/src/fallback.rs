//! Fallback query synthesis
//!
//! Builds a single flat aggregate query from whichever vocabulary slots are
//! present when no canned template binds them all.

use crate::parameters::Family;
use crate::templates::is_vocabulary_key;

/// Row cap for synthesized queries
pub const FALLBACK_LIMIT: usize = 50;

/// Categorical slots in projection order: (slot, filter, projected column)
const CATEGORICAL: &[(&str, &str, &str)] = &[
    ("generation", "p.generation = $generation", "p.generation AS generation"),
    (
        "loyalty_tier",
        "toLower(p.loyalty_program_level) = $loyalty_tier",
        "p.loyalty_program_level AS loyalty_tier",
    ),
    ("record_locator", "p.record_locator = $record_locator", "p.record_locator AS record_locator"),
    ("class", "j.passenger_class = $class", "j.passenger_class AS class"),
    (
        "fleet_type",
        "f.fleet_type_description CONTAINS $fleet_type",
        "f.fleet_type_description AS fleet_type",
    ),
    ("origin", "o.station_code = $origin", "o.station_code AS origin"),
    ("dest", "d.station_code = $dest", "d.station_code AS dest"),
    ("feedback_id", "j.feedback_ID = $feedback_id", "j.feedback_ID AS feedback_id"),
];

fn journey_attribute(family: Family) -> &'static str {
    match family {
        Family::Delay => "j.arrival_delay_minutes",
        Family::Satisfaction => "j.food_satisfaction_score",
        Family::Mileage => "j.actual_flown_miles",
        Family::Legs => "j.number_of_legs",
    }
}

/// Collects WHERE conditions joined with AND
#[derive(Default)]
struct WhereBuilder {
    conditions: Vec<String>,
}

impl WhereBuilder {
    fn push(&mut self, condition: impl Into<String>) -> &mut Self {
        self.conditions.push(condition.into());
        self
    }

    fn add_range(&mut self, attribute: &str, min_key: Option<&str>, max_key: Option<&str>) -> &mut Self {
        if let Some(key) = min_key {
            self.push(format!("{} >= ${}", attribute, key));
        }
        if let Some(key) = max_key {
            self.push(format!("{} <= ${}", attribute, key));
        }
        self
    }

    fn build(&self) -> Option<String> {
        (!self.conditions.is_empty()).then(|| format!("WHERE {}", self.conditions.join("\n  AND ")))
    }
}

/// Synthesize a query binding every present vocabulary slot.
///
/// Returns `None` only when `keys` holds no vocabulary slot at all.
pub fn synthesize(keys: &[&str]) -> Option<String> {
    let has = |key: &str| keys.contains(&key);
    if !keys.iter().any(|k| is_vocabulary_key(k)) {
        return None;
    }

    let passenger = has("generation") || has("loyalty_tier") || has("record_locator");
    let flight = has("fleet_type") || has("origin") || has("dest");

    let mut pattern = String::from("MATCH ");
    if passenger {
        pattern.push_str("(p:Passenger)-[:TOOK]->");
    }
    pattern.push_str("(j:Journey)");
    if flight {
        pattern.push_str("-[:ON]->(f:Flight)");
    }
    if has("origin") {
        pattern.push_str(",\n      (f)-[:DEPARTS_FROM]->(o:Airport)");
    }
    if has("dest") {
        pattern.push_str(",\n      (f)-[:ARRIVES_AT]->(d:Airport)");
    }

    let mut filters = WhereBuilder::default();
    let mut columns: Vec<String> = Vec::new();
    for (slot, filter, column) in CATEGORICAL {
        if has(slot) {
            filters.push(*filter);
            columns.push(column.to_string());
        }
    }

    for family in Family::ALL {
        let min_key = Some(family.min_key()).filter(|k| has(k));
        let max_key = Some(family.max_key()).filter(|k| has(k));
        filters.add_range(journey_attribute(family), min_key, max_key);
    }

    columns.push("count(j) AS journey_count".to_string());
    columns.push("avg(j.food_satisfaction_score) AS avg_food_satisfaction".to_string());
    columns.push("avg(j.arrival_delay_minutes) AS avg_delay_minutes".to_string());
    if has("min_miles") || has("max_miles") {
        columns.push("avg(j.actual_flown_miles) AS avg_miles".to_string());
    }
    if has("min_legs") || has("max_legs") {
        columns.push("avg(j.number_of_legs) AS avg_legs".to_string());
    }

    let mut query = pattern;
    if let Some(where_clause) = filters.build() {
        query.push('\n');
        query.push_str(&where_clause);
    }
    query.push_str(&format!(
        "\nRETURN {}\nORDER BY journey_count DESC LIMIT {}",
        columns.join(", "),
        FALLBACK_LIMIT
    ));

    Some(query)
}

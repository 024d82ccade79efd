//! Prompt builders shared by the chat-completions client

/// Graph schema the model is told about when extracting slots
pub const SCHEMA_CONTEXT: &str = "\
Nodes and Properties:
- Passenger: record_locator, loyalty_program_level, generation
- Journey: feedback_ID, food_satisfaction_score, arrival_delay_minutes, actual_flown_miles, number_of_legs, passenger_class
- Flight: flight_number, fleet_type_description
- Airport: station_code

Relationships:
- (Passenger)-[:TOOK]->(Journey)
- (Journey)-[:ON]->(Flight)
- (Flight)-[:DEPARTS_FROM]->(Airport)
- (Flight)-[:ARRIVES_AT]->(Airport)";

pub fn classify_intent(utterance: &str, labels: &[&str]) -> String {
    let listed = labels
        .iter()
        .map(|l| format!("- {}", l))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are an intent classifier for an airline operations analytics assistant.\n\n\
        User Input: \"{}\"\n\n\
        Available Intents:\n{}\n\n\
        Map the user input to exactly one of the available intents. \
        Return ONLY the intent key. If nothing fits, return \"unknown\".",
        utterance, listed
    )
}

pub fn extract_entities(utterance: &str, intent: &str) -> String {
    format!(
        "You are an entity extractor for an airline graph database.\n\n\
        Schema Context:\n{}\n\n\
        User Input: \"{}\"\n\
        Identified Intent: \"{}\"\n\n\
        Return a single JSON object with the slots mentioned in the input. Use these keys:\n\
        - generation, loyalty_tier, class, fleet_type\n\
        - origin, dest (three-letter station codes)\n\
        - record_locator, feedback_id\n\
        - min_delay, max_delay, min_food_satisfaction, max_food_satisfaction, \
        min_miles, max_miles, min_legs, max_legs (integers)\n\n\
        Omit any slot that is not mentioned. Return JSON only.",
        SCHEMA_CONTEXT, utterance, intent
    )
}

pub fn infer_parameters(utterance: &str, vocabulary: &[&str]) -> String {
    format!(
        "Translate qualitative wording in an airline analytics question into numeric thresholds.\n\n\
        Question: \"{}\"\n\n\
        Allowed keys: {}\n\
        Delays are in minutes, satisfaction is a 1-5 score, distance is in miles, legs are a count.\n\
        Return a JSON object using only the allowed keys with integer values, \
        or {{}} if the question has no such wording.",
        utterance,
        vocabulary.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_prompt_lists_labels() {
        let prompt = classify_intent("late flights from LAX", &["analyze_delays", "lookup_details"]);
        assert!(prompt.contains("- analyze_delays\n- lookup_details"));
        assert!(prompt.contains("late flights from LAX"));
    }

    #[test]
    fn test_infer_prompt_restricts_vocabulary() {
        let prompt = infer_parameters("really late", &["min_delay", "max_delay"]);
        assert!(prompt.contains("Allowed keys: min_delay, max_delay"));
    }
}

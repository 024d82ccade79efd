//! Parameter inference
//!
//! Derives numeric thresholds from an utterance in three passes with strict
//! precedence; a later pass never overwrites what an earlier one produced:
//! 1. Explicit numbers with comparator words and units
//! 2. A fixed lexicon of qualitative terms
//! 3. The language model, only when nothing else applied
//!
//! All bounds are inclusive.

use crate::entities::strip_code_fences;
use flightgraph_common::errors::AppError;
use flightgraph_common::llm::LanguageModel;
use flightgraph_common::metrics::record_inference_pass;
use regex_lite::{Captures, Regex};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, OnceLock};

/// The fixed numeric-threshold vocabulary
pub const PARAMETER_KEYS: [&str; 8] = [
    "min_delay",
    "max_delay",
    "min_food_satisfaction",
    "max_food_satisfaction",
    "min_miles",
    "max_miles",
    "min_legs",
    "max_legs",
];

/// A pair of bound keys measuring the same journey attribute
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Family {
    Delay,
    Satisfaction,
    Mileage,
    Legs,
}

impl Family {
    pub const ALL: [Family; 4] = [Family::Delay, Family::Satisfaction, Family::Mileage, Family::Legs];

    pub fn min_key(self) -> &'static str {
        match self {
            Family::Delay => "min_delay",
            Family::Satisfaction => "min_food_satisfaction",
            Family::Mileage => "min_miles",
            Family::Legs => "min_legs",
        }
    }

    pub fn max_key(self) -> &'static str {
        match self {
            Family::Delay => "max_delay",
            Family::Satisfaction => "max_food_satisfaction",
            Family::Mileage => "max_miles",
            Family::Legs => "max_legs",
        }
    }
}

/// Numeric thresholds keyed by the fixed vocabulary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParameterBag(BTreeMap<&'static str, i64>);

impl ParameterBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<i64> {
        self.0.get(key).copied()
    }

    /// Set a slot unless it already holds a value; unknown keys are ignored
    pub fn set_if_absent(&mut self, key: &str, value: i64) -> bool {
        let Some(key) = PARAMETER_KEYS.iter().find(|k| **k == key) else {
            return false;
        };
        if self.0.contains_key(key) {
            return false;
        }
        self.0.insert(*key, value);
        true
    }

    /// Fill slots from a later pass without overwriting this bag
    pub fn merge_missing(&mut self, later: &ParameterBag) {
        for (key, value) in later.iter() {
            self.set_if_absent(key, value);
        }
    }

    pub fn has_family(&self, family: Family) -> bool {
        self.0.contains_key(family.min_key()) || self.0.contains_key(family.max_key())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, i64)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// What a number with a unit but no comparator means
#[derive(Debug, Clone, Copy)]
enum BareNumber {
    Lower,
    Exact,
}

struct UnitRule {
    family: Family,
    scale: f64,
    bare: BareNumber,
    single: Regex,
    between: Regex,
}

struct LexiconEntry {
    family: Family,
    term: Regex,
    min: Option<i64>,
    max: Option<i64>,
}

struct Rules {
    units: Vec<UnitRule>,
    lexicon: Vec<LexiconEntry>,
    context: Vec<(Family, Regex)>,
    trigger: Regex,
}

const LOWER: &str = r"over|above|more than|greater than|at least|exceeding|longer than|in excess of";
const UPPER: &str = r"no more than|under|below|less than|fewer than|at most|within|up to";
const NUM: &str = r"\d{1,3}(?:,\d{3})+(?:\.\d+)?|\d+(?:\.\d+)?";

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).unwrap_or_else(|e| panic!("built-in pattern {:?} must compile: {}", pattern, e))
}

/// `<cmp>? <num> <unit>` and `between <num> and <num> <unit>`
fn postfix_rule(family: Family, num: &str, unit: &str, scale: f64, bare: BareNumber) -> UnitRule {
    UnitRule {
        family,
        scale,
        bare,
        single: compile(&format!(
            r"(?i)(?:\b(?P<cmp>{LOWER}|{UPPER})\s*)?\b(?P<num>{num})[\s-]*(?:{unit})\b"
        )),
        between: compile(&format!(
            r"(?i)\bbetween\s+(?P<lo>{NUM})\s*(?:and|-)\s*(?P<hi>{NUM})[\s-]*(?:{unit})\b"
        )),
    }
}

/// `<noun> (of|is)? <cmp>? <num>` for scores quoted after the noun
fn prefix_rule(family: Family, noun: &str, bare: BareNumber) -> UnitRule {
    UnitRule {
        family,
        scale: 1.0,
        bare,
        single: compile(&format!(
            r"(?i)\b(?:{noun})\s+(?:of\s+|is\s+)?(?:(?P<cmp>{LOWER}|{UPPER})\s*)?(?P<num>{NUM})\b"
        )),
        between: compile(&format!(
            r"(?i)\b(?:{noun})\s+(?:of\s+)?between\s+(?P<lo>{NUM})\s*(?:and|-)\s*(?P<hi>{NUM})\b"
        )),
    }
}

fn entry(family: Family, term: &str, min: Option<i64>, max: Option<i64>) -> LexiconEntry {
    LexiconEntry {
        family,
        term: compile(&format!(r"(?i)\b(?:{term})\b")),
        min,
        max,
    }
}

fn rules() -> &'static Rules {
    static RULES: OnceLock<Rules> = OnceLock::new();
    RULES.get_or_init(|| {
        use BareNumber::*;
        use Family::*;

        let score_noun = r"food score|food rating|satisfaction score|satisfaction|score|rating|rated";
        let units = vec![
            postfix_rule(Delay, &format!("an?|{NUM}"), r"hours?|hrs?", 60.0, Lower),
            postfix_rule(Delay, NUM, r"minutes?|mins?", 1.0, Lower),
            postfix_rule(Mileage, NUM, r"miles?|mi", 1.0, Lower),
            postfix_rule(Legs, r"\d+", r"legs?|segments?", 1.0, Exact),
            postfix_rule(Satisfaction, NUM, r"stars?|out of 5|/5", 1.0, Exact),
            prefix_rule(Satisfaction, score_noun, Exact),
        ];

        // Ordered specific-first: the first hit per family wins
        let lexicon = vec![
            entry(Delay, r"extreme(?:ly)?|massive(?:ly)?|huge", Some(120), None),
            entry(Delay, r"severe(?:ly)?|serious(?:ly)?|major|significant(?:ly)?|long delays?|big delays?", Some(61), None),
            entry(Delay, r"moderate(?:ly)?|medium delays?", Some(16), Some(60)),
            entry(Delay, r"slight(?:ly)?|minor|short delays?|small delays?", Some(1), Some(15)),
            entry(Delay, r"on[- ]time|punctual", Some(-15), Some(15)),
            entry(Delay, r"early", None, Some(0)),
            entry(Satisfaction, r"excellent|outstanding|perfect", Some(5), None),
            entry(Satisfaction, r"poor(?:ly)?|bad(?:ly)?|low|terrible|awful", None, Some(2)),
            entry(Satisfaction, r"good|high|great", Some(4), None),
            entry(Mileage, r"long[- ]haul|long[- ]distance|long (?:flights?|routes?|trips?)", Some(4000), None),
            entry(Mileage, r"medium[- ]haul|medium[- ]distance|mid[- ]range", Some(1000), Some(4000)),
            entry(Mileage, r"short[- ]haul|short[- ]distance|short (?:flights?|routes?|trips?)", None, Some(1000)),
            entry(Legs, r"complex|complicated", Some(3), None),
            entry(Legs, r"connecting|connections?|multi[- ]leg|layovers?|multiple legs", Some(2), None),
            entry(Legs, r"direct|non[- ]?stop|single[- ]leg", None, Some(1)),
        ];

        // A lexicon term only counts when its family is being talked about
        let context = vec![
            (Delay, compile(r"(?i)\b(?:delay\w*|late|lateness|arriv\w*|on[- ]time|punctual\w*|early)\b")),
            (Satisfaction, compile(r"(?i)\b(?:food|meals?|catering|satisf\w*|dissatisf\w*|ratings?|rated|scores?|feedback)\b")),
            (Mileage, compile(r"(?i)\b(?:haul|distance|flights?|routes?|trips?|miles?|range)\b")),
            (Legs, compile(r"(?i)\b(?:legs?|connect\w*|stops?|itinerar\w*|layovers?|flights?|routes?|segments?)\b")),
        ];

        let trigger = compile(
            r"(?i)\b(?:very|really|extremely|terribl\w*|awful|worst|best|lengthy|long|short|quick|slow|bad|poor|good|great|high|low|heavy|frequent\w*|rare\w*|unhappy|disappointing|lots?|many|few|huge|tiny|big|small|barely|hardly)\b",
        );

        Rules { units, lexicon, context, trigger }
    })
}

fn parse_number(caps: &Captures<'_>, name: &str) -> Option<f64> {
    let raw = caps.name(name)?.as_str();
    match raw.to_ascii_lowercase().as_str() {
        "a" | "an" => Some(1.0),
        other => other.replace(',', "").parse().ok(),
    }
}

fn is_lower(cmp: &str) -> bool {
    let cmp = cmp.to_ascii_lowercase();
    // "no more than" must not read as "more than"
    !cmp.starts_with("no ") && LOWER.split('|').any(|c| c == cmp)
}

/// Threshold inference over an utterance
pub struct ParameterInferencer {
    model: Arc<dyn LanguageModel>,
}

impl ParameterInferencer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Infer thresholds from the utterance alone
    pub async fn infer(&self, utterance: &str) -> ParameterBag {
        self.infer_over(utterance, ParameterBag::new()).await
    }

    /// Infer thresholds on top of `seed`, which takes precedence over every pass
    pub async fn infer_over(&self, utterance: &str, seed: ParameterBag) -> ParameterBag {
        let mut bag = seed;

        let explicit = self.explicit_pass(utterance);
        if !explicit.is_empty() {
            record_inference_pass("explicit");
        }
        tracing::debug!(pass = "explicit", found = explicit.len(), "Inference pass complete");
        bag.merge_missing(&explicit);

        let covered: HashSet<Family> = Family::ALL
            .into_iter()
            .filter(|f| explicit.has_family(*f))
            .collect();
        let semantic = self.semantic_pass(utterance, &covered);
        if !semantic.is_empty() {
            record_inference_pass("semantic");
        }
        tracing::debug!(pass = "semantic", found = semantic.len(), "Inference pass complete");
        bag.merge_missing(&semantic);

        if bag.is_empty() && rules().trigger.is_match(utterance) {
            let external = self.external_pass(utterance).await;
            if !external.is_empty() {
                record_inference_pass("external");
            }
            tracing::debug!(pass = "external", found = external.len(), "Inference pass complete");
            bag.merge_missing(&external);
        }

        bag
    }

    /// Quantified comparisons: "over 90 minutes", "under 2 hours",
    /// "at least 3000 miles", "rating below 3", "2-leg", "between 1 and 3 legs"
    pub fn explicit_pass(&self, utterance: &str) -> ParameterBag {
        let mut bag = ParameterBag::new();

        for rule in &rules().units {
            for caps in rule.between.captures_iter(utterance) {
                if let (Some(lo), Some(hi)) = (parse_number(&caps, "lo"), parse_number(&caps, "hi")) {
                    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
                    bag.set_if_absent(rule.family.min_key(), (lo * rule.scale).round() as i64);
                    bag.set_if_absent(rule.family.max_key(), (hi * rule.scale).round() as i64);
                }
            }

            for caps in rule.single.captures_iter(utterance) {
                let Some(number) = parse_number(&caps, "num") else {
                    continue;
                };
                let value = (number * rule.scale).round() as i64;

                match caps.name("cmp").map(|m| m.as_str()) {
                    Some(cmp) if is_lower(cmp) => {
                        bag.set_if_absent(rule.family.min_key(), value);
                    }
                    Some(_) => {
                        bag.set_if_absent(rule.family.max_key(), value);
                    }
                    None => match rule.bare {
                        BareNumber::Lower => {
                            bag.set_if_absent(rule.family.min_key(), value);
                        }
                        BareNumber::Exact => {
                            bag.set_if_absent(rule.family.min_key(), value);
                            bag.set_if_absent(rule.family.max_key(), value);
                        }
                    },
                }
            }
        }

        bag
    }

    /// Qualitative terms from the fixed lexicon, skipping `covered` families
    pub fn semantic_pass(&self, utterance: &str, covered: &HashSet<Family>) -> ParameterBag {
        let rules = rules();
        let mut bag = ParameterBag::new();
        let mut decided: HashSet<Family> = HashSet::new();

        for entry in &rules.lexicon {
            if covered.contains(&entry.family) || decided.contains(&entry.family) {
                continue;
            }
            let in_context = rules
                .context
                .iter()
                .any(|(family, re)| *family == entry.family && re.is_match(utterance));
            if !in_context || !entry.term.is_match(utterance) {
                continue;
            }

            if let Some(min) = entry.min {
                bag.set_if_absent(entry.family.min_key(), min);
            }
            if let Some(max) = entry.max {
                bag.set_if_absent(entry.family.max_key(), max);
            }
            decided.insert(entry.family);
        }

        bag
    }

    /// Ask the language model; any failure degrades to an empty bag
    async fn external_pass(&self, utterance: &str) -> ParameterBag {
        let response = match self.model.infer_parameters(utterance, &PARAMETER_KEYS).await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, "External parameter inference failed");
                return ParameterBag::new();
            }
        };

        match parse_inferred(&response) {
            Ok(bag) => bag,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding unparseable inferred parameters");
                ParameterBag::new()
            }
        }
    }
}

/// Parse model output into a bag restricted to the fixed vocabulary
pub fn parse_inferred(response: &str) -> Result<ParameterBag, AppError> {
    let value: Value = serde_json::from_str(strip_code_fences(response)).map_err(|e| {
        AppError::InferenceParse {
            message: e.to_string(),
        }
    })?;

    let Value::Object(map) = value else {
        return Err(AppError::InferenceParse {
            message: "expected a JSON object".to_string(),
        });
    };

    let mut bag = ParameterBag::new();
    for (key, value) in map {
        let number = match &value {
            Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
            Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
            _ => None,
        };
        if let Some(number) = number {
            bag.set_if_absent(&key, number);
        }
    }

    Ok(bag)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flightgraph_common::llm::MockLanguageModel;

    fn inferencer() -> (ParameterInferencer, Arc<MockLanguageModel>) {
        let model = Arc::new(MockLanguageModel::new().with_parameters(r#"{"min_delay": 30}"#));
        (ParameterInferencer::new(model.clone()), model)
    }

    #[tokio::test]
    async fn test_explicit_delay_wins_over_lexicon() {
        let (inf, model) = inferencer();
        let bag = inf.infer("show severe delays over 90 minutes").await;
        assert_eq!(bag.get("min_delay"), Some(90));
        assert_eq!(bag.len(), 1);
        assert_eq!(model.infer_calls(), 0);
    }

    #[test]
    fn test_hours_convert_to_minutes() {
        let (inf, _) = inferencer();
        assert_eq!(inf.explicit_pass("delayed more than 2 hours").get("min_delay"), Some(120));
        assert_eq!(inf.explicit_pass("late by over an hour").get("min_delay"), Some(60));
        assert_eq!(inf.explicit_pass("delays under 1.5 hours").get("max_delay"), Some(90));
    }

    #[test]
    fn test_no_more_than_is_upper_bound() {
        let (inf, _) = inferencer();
        let bag = inf.explicit_pass("arrived no more than 15 minutes late");
        assert_eq!(bag.get("max_delay"), Some(15));
        assert_eq!(bag.get("min_delay"), None);
    }

    #[test]
    fn test_mileage_bare_number_is_lower_bound() {
        let (inf, _) = inferencer();
        assert_eq!(inf.explicit_pass("journeys of 3000 miles").get("min_miles"), Some(3000));
        assert_eq!(inf.explicit_pass("flights under 500 miles").get("max_miles"), Some(500));
    }

    #[test]
    fn test_leg_counts() {
        let (inf, _) = inferencer();
        let bag = inf.explicit_pass("2-leg itineraries");
        assert_eq!((bag.get("min_legs"), bag.get("max_legs")), (Some(2), Some(2)));

        let bag = inf.explicit_pass("more than 2 legs");
        assert_eq!((bag.get("min_legs"), bag.get("max_legs")), (Some(2), None));

        let bag = inf.explicit_pass("between 2 and 4 segments");
        assert_eq!((bag.get("min_legs"), bag.get("max_legs")), (Some(2), Some(4)));
    }

    #[test]
    fn test_satisfaction_scores() {
        let (inf, _) = inferencer();
        assert_eq!(inf.explicit_pass("food rating below 3").get("max_food_satisfaction"), Some(3));
        assert_eq!(inf.explicit_pass("score of at least 4").get("min_food_satisfaction"), Some(4));
        let bag = inf.explicit_pass("meals rated 5 stars");
        assert_eq!(bag.get("min_food_satisfaction"), Some(5));
        assert_eq!(bag.get("max_food_satisfaction"), Some(5));
    }

    #[test]
    fn test_lexicon_terms() {
        let (inf, _) = inferencer();
        let none = HashSet::new();

        let bag = inf.semantic_pass("find severe delays for flights from LAX to IAX", &none);
        assert_eq!(bag.get("min_delay"), Some(61));

        let bag = inf.semantic_pass("extremely severe delays", &none);
        assert_eq!(bag.get("min_delay"), Some(120));

        let bag = inf.semantic_pass("moderate delays", &none);
        assert_eq!((bag.get("min_delay"), bag.get("max_delay")), (Some(16), Some(60)));

        let bag = inf.semantic_pass("poor food on long-haul flights", &none);
        assert_eq!(bag.get("max_food_satisfaction"), Some(2));
        assert_eq!(bag.get("min_miles"), Some(4000));

        let bag = inf.semantic_pass("complex connecting itineraries", &none);
        assert_eq!(bag.get("min_legs"), Some(3));

        let bag = inf.semantic_pass("nonstop routes", &none);
        assert_eq!(bag.get("max_legs"), Some(1));
    }

    #[test]
    fn test_lexicon_needs_family_context() {
        let (inf, _) = inferencer();
        // "severe" without any delay wording
        let bag = inf.semantic_pass("severe turbulence reports", &HashSet::new());
        assert!(bag.is_empty());

        // "direct" as a verb says nothing about legs
        let bag = inf.semantic_pass("direct me to the busiest airport", &HashSet::new());
        assert!(bag.is_empty());
    }

    #[tokio::test]
    async fn test_plain_questions_infer_nothing() {
        let (inf, model) = inferencer();
        for utterance in [
            "How satisfied are Boomers with the food?",
            "How satisfied are Gen X travellers?",
            "what is the busiest route",
            "show me flights out of ORD",
        ] {
            let bag = inf.infer(utterance).await;
            assert!(bag.is_empty(), "{:?} inferred {:?}", utterance, bag);
        }
        assert_eq!(model.infer_calls(), 0);
    }

    #[test]
    fn test_grouped_thousands() {
        let (inf, _) = inferencer();
        let bag = inf.explicit_pass("flights under 2,500 miles");
        assert_eq!(bag.get("max_miles"), Some(2500));
        assert_eq!(bag.get("min_miles"), None);

        let bag = inf.explicit_pass("journeys over 1,000 miles");
        assert_eq!(bag.get("min_miles"), Some(1000));
        assert_eq!(bag.len(), 1);

        let bag = inf.explicit_pass("between 1,000 and 12,500 miles");
        assert_eq!((bag.get("min_miles"), bag.get("max_miles")), (Some(1000), Some(12500)));
    }

    #[test]
    fn test_semantic_skips_covered_family() {
        let (inf, _) = inferencer();
        let covered: HashSet<Family> = [Family::Delay].into_iter().collect();
        let bag = inf.semantic_pass("severe delays with poor food", &covered);
        assert_eq!(bag.get("min_delay"), None);
        assert_eq!(bag.get("max_food_satisfaction"), Some(2));
    }

    #[tokio::test]
    async fn test_external_pass_only_when_nothing_found() {
        let (inf, model) = inferencer();
        let bag = inf.infer("which flights were really disappointing").await;
        assert_eq!(bag.get("min_delay"), Some(30));
        assert_eq!(model.infer_calls(), 1);

        // No trigger words: no call
        let bag = inf.infer("list all airports").await;
        assert!(bag.is_empty());
        assert_eq!(model.infer_calls(), 1);
    }

    #[tokio::test]
    async fn test_seed_blocks_external_and_is_never_overwritten() {
        let (inf, model) = inferencer();
        let mut seed = ParameterBag::new();
        seed.set_if_absent("min_delay", 45);

        let bag = inf.infer_over("severe delays on really bad days", seed).await;
        assert_eq!(bag.get("min_delay"), Some(45));
        assert_eq!(model.infer_calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_external_output_degrades() {
        let model = Arc::new(MockLanguageModel::new().with_parameters("sure! min delay is 30"));
        let inf = ParameterInferencer::new(model.clone());
        let bag = inf.infer("really awful trips").await;
        assert!(bag.is_empty());
        assert_eq!(model.infer_calls(), 1);
    }

    #[tokio::test]
    async fn test_external_transport_error_degrades() {
        let inf = ParameterInferencer::new(Arc::new(MockLanguageModel::unavailable()));
        assert!(inf.infer("really awful trips").await.is_empty());
    }

    #[test]
    fn test_parse_inferred_filters_vocabulary() {
        let bag = parse_inferred("```json\n{\"min_delay\": \"60\", \"max_score\": 2, \"min_miles\": 1200.6}\n```").unwrap();
        assert_eq!(bag.get("min_delay"), Some(60));
        assert_eq!(bag.get("min_miles"), Some(1201));
        assert_eq!(bag.len(), 2);

        assert!(matches!(parse_inferred("[1]"), Err(AppError::InferenceParse { .. })));
    }
}

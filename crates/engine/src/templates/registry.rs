use super::catalog::TEMPLATES;
use super::{is_vocabulary_key, Intent, QueryTemplate};
use std::collections::HashMap;
use std::sync::OnceLock;

/// Immutable, process-wide template registry.
///
/// Built once on first use; each intent's templates are ordered from most to
/// least required slots, registration order breaking ties.
pub struct TemplateRegistry {
    by_intent: HashMap<Intent, Vec<&'static QueryTemplate>>,
}

impl TemplateRegistry {
    /// Shared registry instance
    pub fn global() -> &'static TemplateRegistry {
        static REGISTRY: OnceLock<TemplateRegistry> = OnceLock::new();
        REGISTRY.get_or_init(|| TemplateRegistry::from_catalog(TEMPLATES))
    }

    fn from_catalog(catalog: &'static [QueryTemplate]) -> Self {
        let mut by_intent: HashMap<Intent, Vec<&'static QueryTemplate>> = HashMap::new();
        for template in catalog {
            by_intent.entry(template.intent).or_default().push(template);
        }
        for templates in by_intent.values_mut() {
            // stable: equal specificity keeps registration order
            templates.sort_by(|a, b| b.required.len().cmp(&a.required.len()));
        }

        Self { by_intent }
    }

    /// Templates for an intent in matching order
    pub fn templates_for(&self, intent: Intent) -> &[&'static QueryTemplate] {
        self.by_intent.get(&intent).map(Vec::as_slice).unwrap_or(&[])
    }

    /// The empty-slot template of an intent, if it has one
    pub fn default_for(&self, intent: Intent) -> Option<&'static QueryTemplate> {
        self.templates_for(intent)
            .iter()
            .copied()
            .find(|t| t.required.is_empty())
    }

    /// Slots of the least specific non-default template, named when an intent
    /// cannot be resolved from an empty bag
    pub fn minimal_slots(&self, intent: Intent) -> Vec<&'static str> {
        let mut slots: Vec<&'static str> = Vec::new();
        for template in self.templates_for(intent) {
            if template.required.len() == 1 {
                for slot in template.required {
                    if !slots.contains(slot) {
                        slots.push(*slot);
                    }
                }
            }
        }
        slots
    }

    /// Select the most specific template whose required slots are all
    /// present AND whose text binds every vocabulary key in `keys`.
    ///
    /// A subset match that would leave a supplied slot unused is skipped, so
    /// `None` means "synthesize a fallback query".
    pub fn find(&self, intent: Intent, keys: &[&str]) -> Option<&'static QueryTemplate> {
        let supplied: Vec<&str> = keys.iter().copied().filter(|k| is_vocabulary_key(k)).collect();

        self.templates_for(intent).iter().copied().find(|template| {
            template.required.iter().all(|slot| keys.contains(slot))
                && supplied.iter().all(|key| template.references(key))
        })
    }
}

/// Match against the global registry
pub fn find_template(intent: Intent, keys: &[&str]) -> Option<&'static QueryTemplate> {
    TemplateRegistry::global().find(intent, keys)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::templates::bound_params;

    #[test]
    fn test_every_template_binds_exactly_its_required_slots() {
        for template in TEMPLATES {
            let mut bound = bound_params(template.cypher);
            bound.sort_unstable();
            let mut required = template.required.to_vec();
            required.sort_unstable();
            assert_eq!(bound, required, "template {}", template.name);
            assert!(
                template.required.iter().all(|k| is_vocabulary_key(k)),
                "template {} requires a non-vocabulary slot",
                template.name
            );
        }
    }

    #[test]
    fn test_template_names_unique() {
        let mut names: Vec<&str> = TEMPLATES.iter().map(|t| t.name).collect();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(before, names.len());
    }

    #[test]
    fn test_ordering_is_by_specificity() {
        let registry = TemplateRegistry::global();
        for intent in Intent::ALL {
            let sizes: Vec<usize> = registry
                .templates_for(intent)
                .iter()
                .map(|t| t.required.len())
                .collect();
            assert!(sizes.windows(2).all(|w| w[0] >= w[1]), "{} not ordered", intent);
        }
    }

    #[test]
    fn test_defaults() {
        let registry = TemplateRegistry::global();
        for intent in Intent::ALL {
            let has_default = registry.default_for(intent).is_some();
            assert_eq!(has_default, intent != Intent::LookupDetails, "{}", intent);
        }
    }

    #[test]
    fn test_generation_matches_generation_template() {
        let template = find_template(Intent::AnalyzeSatisfaction, &["generation"]).unwrap();
        assert_eq!(template.name, "satisfaction.generation");
        assert!(template.cypher.contains("p.generation = $generation"));
    }

    #[test]
    fn test_most_specific_wins() {
        let template = find_template(Intent::SearchNetwork, &["origin", "dest", "fleet_type"]).unwrap();
        assert_eq!(template.name, "network.route_fleet");

        let template = find_template(Intent::SearchNetwork, &["origin", "dest"]).unwrap();
        assert_eq!(template.name, "network.route");
    }

    #[test]
    fn test_completeness_rejects_lossy_match() {
        // delays.route fits origin+dest but would drop min_delay
        assert!(find_template(Intent::AnalyzeDelays, &["origin", "dest", "min_delay"]).is_none());
        // delays.origin would silently ignore the leg filter
        assert!(find_template(Intent::AnalyzeDelays, &["origin", "max_legs"]).is_none());
    }

    #[test]
    fn test_non_vocabulary_keys_do_not_block_match() {
        let template = find_template(Intent::AnalyzeDelays, &["origin", "flight_number"]).unwrap();
        assert_eq!(template.name, "delays.origin");
    }

    #[test]
    fn test_empty_bag_uses_default() {
        let template = find_template(Intent::AnalyzeFleet, &[]).unwrap();
        assert_eq!(template.name, "fleet.overview");
        assert!(find_template(Intent::LookupDetails, &[]).is_none());
    }

    #[test]
    fn test_match_is_deterministic() {
        let keys = ["loyalty_tier", "generation"];
        let first = find_template(Intent::AnalyzeLoyalty, &keys).map(|t| t.name);
        for _ in 0..10 {
            assert_eq!(find_template(Intent::AnalyzeLoyalty, &keys).map(|t| t.name), first);
        }
        assert_eq!(first, Some("loyalty.tier_generation"));
    }

    #[test]
    fn test_minimal_slots_for_lookup() {
        let slots = TemplateRegistry::global().minimal_slots(Intent::LookupDetails);
        assert_eq!(slots, vec!["record_locator", "feedback_id"]);
    }
}

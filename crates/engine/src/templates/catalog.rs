//! The canned query catalog, grouped by intent
//!
//! Graph schema:
//! (Passenger)-[:TOOK]->(Journey)-[:ON]->(Flight)-[:DEPARTS_FROM|ARRIVES_AT]->(Airport)
//!
//! Every `$param` a template binds must be listed in its `required` slots.

use super::{Intent, QueryTemplate};
use Intent::*;

macro_rules! template {
    ($name:literal, $intent:expr, [$($slot:literal),*], $cypher:literal) => {
        QueryTemplate {
            name: $name,
            intent: $intent,
            required: &[$($slot),*],
            cypher: $cypher,
        }
    };
}

pub(super) const TEMPLATES: &[QueryTemplate] = &[
    // =========================================================
    // Delays
    // =========================================================
    template!("delays.route", AnalyzeDelays, ["origin", "dest"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin}),
      (f)-[:ARRIVES_AT]->(d:Airport {station_code: $dest})
RETURN o.station_code AS origin, d.station_code AS dest, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes,
       max(j.arrival_delay_minutes) AS max_delay_minutes"),
    template!("delays.origin_threshold", AnalyzeDelays, ["origin", "min_delay"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin})
WHERE j.arrival_delay_minutes >= $min_delay
RETURN f.flight_number AS flight_number, count(j) AS delayed_journeys,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY delayed_journeys DESC LIMIT 50"),
    template!("delays.dest_threshold", AnalyzeDelays, ["dest", "min_delay"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:ARRIVES_AT]->(d:Airport {station_code: $dest})
WHERE j.arrival_delay_minutes >= $min_delay
RETURN f.flight_number AS flight_number, count(j) AS delayed_journeys,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY delayed_journeys DESC LIMIT 50"),
    template!("delays.fleet_threshold", AnalyzeDelays, ["fleet_type", "min_delay"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE f.fleet_type_description CONTAINS $fleet_type AND j.arrival_delay_minutes >= $min_delay
RETURN f.fleet_type_description AS fleet_type, count(j) AS delayed_journeys,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY delayed_journeys DESC"),
    template!("delays.class_threshold", AnalyzeDelays, ["class", "min_delay"], "\
MATCH (j:Journey)
WHERE j.passenger_class = $class AND j.arrival_delay_minutes >= $min_delay
RETURN j.passenger_class AS class, count(j) AS delayed_journeys,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction"),
    template!("delays.range", AnalyzeDelays, ["min_delay", "max_delay"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(o:Airport)
WHERE j.arrival_delay_minutes >= $min_delay AND j.arrival_delay_minutes <= $max_delay
RETURN o.station_code AS origin, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY journey_count DESC LIMIT 50"),
    template!("delays.origin", AnalyzeDelays, ["origin"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin})
RETURN o.station_code AS origin, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes,
       max(j.arrival_delay_minutes) AS max_delay_minutes"),
    template!("delays.dest", AnalyzeDelays, ["dest"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:ARRIVES_AT]->(d:Airport {station_code: $dest})
RETURN d.station_code AS dest, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes,
       max(j.arrival_delay_minutes) AS max_delay_minutes"),
    template!("delays.fleet", AnalyzeDelays, ["fleet_type"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE f.fleet_type_description CONTAINS $fleet_type
RETURN f.fleet_type_description AS fleet_type, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes,
       sum(j.arrival_delay_minutes) AS total_delay_minutes"),
    template!("delays.generation", AnalyzeDelays, ["generation"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE p.generation = $generation
RETURN p.generation AS generation, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes"),
    template!("delays.loyalty", AnalyzeDelays, ["loyalty_tier"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE toLower(p.loyalty_program_level) = $loyalty_tier
RETURN p.loyalty_program_level AS loyalty_tier, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes"),
    template!("delays.class", AnalyzeDelays, ["class"], "\
MATCH (j:Journey)
WHERE j.passenger_class = $class
RETURN j.passenger_class AS class, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes"),
    template!("delays.threshold", AnalyzeDelays, ["min_delay"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(o:Airport)
WHERE j.arrival_delay_minutes >= $min_delay
RETURN o.station_code AS origin, count(j) AS delayed_journeys,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY delayed_journeys DESC LIMIT 50"),
    template!("delays.ceiling", AnalyzeDelays, ["max_delay"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE j.arrival_delay_minutes <= $max_delay
RETURN f.fleet_type_description AS fleet_type, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY journey_count DESC"),
    template!("delays.distance", AnalyzeDelays, ["min_miles"], "\
MATCH (j:Journey)
WHERE j.actual_flown_miles >= $min_miles
RETURN count(j) AS journey_count, avg(j.arrival_delay_minutes) AS avg_delay_minutes,
       avg(j.actual_flown_miles) AS avg_miles"),
    template!("delays.legs", AnalyzeDelays, ["min_legs"], "\
MATCH (j:Journey)
WHERE j.number_of_legs >= $min_legs
RETURN j.number_of_legs AS legs, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY legs"),
    template!("delays.overview", AnalyzeDelays, [], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
RETURN f.fleet_type_description AS fleet_type, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY avg_delay_minutes DESC"),

    // =========================================================
    // Satisfaction
    // =========================================================
    template!("satisfaction.generation_class", AnalyzeSatisfaction, ["generation", "class"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE p.generation = $generation AND j.passenger_class = $class
RETURN p.generation AS generation, j.passenger_class AS class, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction"),
    template!("satisfaction.route", AnalyzeSatisfaction, ["origin", "dest"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin}),
      (f)-[:ARRIVES_AT]->(d:Airport {station_code: $dest})
RETURN o.station_code AS origin, d.station_code AS dest, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction"),
    template!("satisfaction.delay_impact", AnalyzeSatisfaction, ["min_delay"], "\
MATCH (j:Journey)
WITH j.arrival_delay_minutes >= $min_delay AS delayed, j
RETURN delayed, count(j) AS journey_count, avg(j.food_satisfaction_score) AS avg_food_satisfaction"),
    template!("satisfaction.poor_flights", AnalyzeSatisfaction, ["max_food_satisfaction"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE j.food_satisfaction_score <= $max_food_satisfaction
RETURN f.flight_number AS flight_number, count(j) AS poor_feedback_count
ORDER BY poor_feedback_count DESC LIMIT 50"),
    template!("satisfaction.high_scores", AnalyzeSatisfaction, ["min_food_satisfaction"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE j.food_satisfaction_score >= $min_food_satisfaction
RETURN f.fleet_type_description AS fleet_type, count(j) AS journey_count,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY journey_count DESC"),
    template!("satisfaction.generation", AnalyzeSatisfaction, ["generation"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE p.generation = $generation
RETURN p.generation AS generation, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction"),
    template!("satisfaction.loyalty", AnalyzeSatisfaction, ["loyalty_tier"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE toLower(p.loyalty_program_level) = $loyalty_tier
RETURN p.loyalty_program_level AS loyalty_tier, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction"),
    template!("satisfaction.class", AnalyzeSatisfaction, ["class"], "\
MATCH (j:Journey)
WHERE j.passenger_class = $class
RETURN j.passenger_class AS class, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction"),
    template!("satisfaction.fleet", AnalyzeSatisfaction, ["fleet_type"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE f.fleet_type_description CONTAINS $fleet_type
RETURN f.fleet_type_description AS fleet_type, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction,
       stDev(j.food_satisfaction_score) AS satisfaction_stddev"),
    template!("satisfaction.legs", AnalyzeSatisfaction, ["min_legs"], "\
MATCH (j:Journey)
WHERE j.number_of_legs >= $min_legs
RETURN j.number_of_legs AS legs, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction
ORDER BY legs"),
    template!("satisfaction.overview", AnalyzeSatisfaction, [], "\
MATCH (j:Journey)
RETURN j.passenger_class AS class, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction
ORDER BY avg_food_satisfaction DESC"),

    // =========================================================
    // Loyalty
    // =========================================================
    template!("loyalty.tier_generation", AnalyzeLoyalty, ["loyalty_tier", "generation"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE toLower(p.loyalty_program_level) = $loyalty_tier AND p.generation = $generation
RETURN p.loyalty_program_level AS loyalty_tier, p.generation AS generation,
       count(DISTINCT p) AS passenger_count, sum(j.actual_flown_miles) AS total_miles,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction"),
    template!("loyalty.tier", AnalyzeLoyalty, ["loyalty_tier"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE toLower(p.loyalty_program_level) = $loyalty_tier
RETURN p.generation AS generation, count(DISTINCT p) AS passenger_count,
       sum(j.actual_flown_miles) AS total_miles,
       avg(j.arrival_delay_minutes) AS avg_delay_minutes
ORDER BY passenger_count DESC"),
    template!("loyalty.generation", AnalyzeLoyalty, ["generation"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE p.generation = $generation
RETURN p.loyalty_program_level AS loyalty_tier, j.passenger_class AS class, count(*) AS journey_count
ORDER BY journey_count DESC"),
    template!("loyalty.class", AnalyzeLoyalty, ["class"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE j.passenger_class = $class
RETURN p.loyalty_program_level AS loyalty_tier, count(*) AS journey_count
ORDER BY journey_count DESC"),
    template!("loyalty.high_mileage", AnalyzeLoyalty, ["min_miles"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WITH p, sum(j.actual_flown_miles) AS total_miles
WHERE total_miles >= $min_miles
RETURN p.record_locator AS record_locator, p.loyalty_program_level AS loyalty_tier, total_miles
ORDER BY total_miles DESC LIMIT 50"),
    template!("loyalty.delay_tolerance", AnalyzeLoyalty, ["min_delay"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey)
WHERE j.arrival_delay_minutes >= $min_delay
RETURN p.loyalty_program_level AS loyalty_tier, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction
ORDER BY avg_food_satisfaction DESC"),
    template!("loyalty.overview", AnalyzeLoyalty, [], "\
MATCH (p:Passenger)
RETURN p.loyalty_program_level AS loyalty_tier, count(p) AS passenger_count
ORDER BY passenger_count DESC"),

    // =========================================================
    // Fleet
    // =========================================================
    template!("fleet.type_class", AnalyzeFleet, ["fleet_type", "class"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE f.fleet_type_description CONTAINS $fleet_type AND j.passenger_class = $class
RETURN f.fleet_type_description AS fleet_type, j.passenger_class AS class, count(j) AS journey_count,
       avg(j.food_satisfaction_score) AS avg_food_satisfaction"),
    template!("fleet.type", AnalyzeFleet, ["fleet_type"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE f.fleet_type_description CONTAINS $fleet_type
RETURN f.fleet_type_description AS fleet_type, count(DISTINCT f) AS flight_count,
       count(j) AS journey_count, avg(j.actual_flown_miles) AS avg_miles,
       avg(j.number_of_legs) AS avg_legs, avg(j.arrival_delay_minutes) AS avg_delay_minutes"),
    template!("fleet.class", AnalyzeFleet, ["class"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE j.passenger_class = $class
RETURN f.fleet_type_description AS fleet_type, count(j) AS journey_count
ORDER BY journey_count DESC"),
    template!("fleet.airport", AnalyzeFleet, ["dest"], "\
MATCH (f:Flight)-[:ARRIVES_AT]->(a:Airport {station_code: $dest})
RETURN f.fleet_type_description AS fleet_type, count(f) AS arrivals
ORDER BY arrivals DESC"),
    template!("fleet.delay_prone", AnalyzeFleet, ["min_delay"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE j.arrival_delay_minutes >= $min_delay
RETURN f.fleet_type_description AS fleet_type, count(j) AS delayed_journeys
ORDER BY delayed_journeys DESC"),
    template!("fleet.short_haul", AnalyzeFleet, ["max_miles"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WITH f.fleet_type_description AS fleet_type, max(j.actual_flown_miles) AS longest_miles
WHERE longest_miles <= $max_miles
RETURN fleet_type, longest_miles
ORDER BY longest_miles"),
    template!("fleet.long_haul", AnalyzeFleet, ["min_miles"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE j.actual_flown_miles >= $min_miles
RETURN f.fleet_type_description AS fleet_type, count(j) AS journey_count,
       avg(j.actual_flown_miles) AS avg_miles
ORDER BY journey_count DESC"),
    template!("fleet.multi_leg", AnalyzeFleet, ["min_legs"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
WHERE j.number_of_legs >= $min_legs
RETURN f.fleet_type_description AS fleet_type, count(j) AS journey_count
ORDER BY journey_count DESC"),
    template!("fleet.overview", AnalyzeFleet, [], "\
MATCH (j:Journey)-[:ON]->(f:Flight)
RETURN f.fleet_type_description AS fleet_type, count(DISTINCT f) AS flight_count,
       avg(j.actual_flown_miles) AS avg_miles, avg(j.number_of_legs) AS avg_legs,
       sum(j.actual_flown_miles) AS total_miles
ORDER BY total_miles DESC"),

    // =========================================================
    // Network
    // =========================================================
    template!("network.route_fleet", SearchNetwork, ["origin", "dest", "fleet_type"], "\
MATCH (f:Flight)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin}),
      (f)-[:ARRIVES_AT]->(d:Airport {station_code: $dest})
WHERE f.fleet_type_description CONTAINS $fleet_type
RETURN f.flight_number AS flight_number, f.fleet_type_description AS fleet_type"),
    template!("network.route", SearchNetwork, ["origin", "dest"], "\
MATCH (f:Flight)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin}),
      (f)-[:ARRIVES_AT]->(d:Airport {station_code: $dest})
RETURN o.station_code AS origin, d.station_code AS dest, count(f) AS flight_count,
       collect(DISTINCT f.fleet_type_description) AS fleet_types"),
    template!("network.origin", SearchNetwork, ["origin"], "\
MATCH (f:Flight)-[:DEPARTS_FROM]->(o:Airport {station_code: $origin}), (f)-[:ARRIVES_AT]->(d:Airport)
RETURN d.station_code AS dest, count(f) AS flight_count
ORDER BY flight_count DESC"),
    template!("network.dest", SearchNetwork, ["dest"], "\
MATCH (f:Flight)-[:ARRIVES_AT]->(d:Airport {station_code: $dest}), (f)-[:DEPARTS_FROM]->(o:Airport)
RETURN o.station_code AS origin, count(f) AS flight_count
ORDER BY flight_count DESC"),
    template!("network.connecting", SearchNetwork, ["min_legs"], "\
MATCH (j:Journey)-[:ON]->(f:Flight)-[:DEPARTS_FROM]->(o:Airport)
WHERE j.number_of_legs >= $min_legs
RETURN o.station_code AS origin, count(j) AS journey_count
ORDER BY journey_count DESC LIMIT 50"),
    template!("network.overview", SearchNetwork, [], "\
MATCH (a:Airport)<-[:ARRIVES_AT|DEPARTS_FROM]-(f:Flight)
RETURN a.station_code AS station_code, count(f) AS degree
ORDER BY degree DESC LIMIT 50"),

    // =========================================================
    // Details (no default: a key is always needed)
    // =========================================================
    template!("details.passenger_feedback", LookupDetails, ["record_locator", "feedback_id"], "\
MATCH (p:Passenger {record_locator: $record_locator})-[:TOOK]->(j:Journey {feedback_ID: $feedback_id})-[:ON]->(f:Flight)
RETURN p, j, f"),
    template!("details.passenger", LookupDetails, ["record_locator"], "\
MATCH (p:Passenger {record_locator: $record_locator})-[:TOOK]->(j:Journey)-[:ON]->(f:Flight)
RETURN p, j, f"),
    template!("details.feedback", LookupDetails, ["feedback_id"], "\
MATCH (p:Passenger)-[:TOOK]->(j:Journey {feedback_ID: $feedback_id})-[:ON]->(f:Flight)
OPTIONAL MATCH (f)-[:DEPARTS_FROM]->(o:Airport)
OPTIONAL MATCH (f)-[:ARRIVES_AT]->(d:Airport)
RETURN p, j, f, o.station_code AS origin, d.station_code AS dest"),
];

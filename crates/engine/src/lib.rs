//! FlightGraph Query Resolution Engine
//!
//! Turns a classified intent plus extracted entities into a parameterized
//! graph query, runs it, and returns plain records.

pub mod entities;
pub mod executor;
pub mod fallback;
pub mod parameters;
pub mod resolver;
pub mod serializer;
pub mod templates;

pub use entities::{normalize, EntityBag, EntityValue, RawEntities};
pub use executor::{QueryExecutor, QuerySource, ResolvedQuery};
pub use parameters::{Family, ParameterBag, ParameterInferencer};
pub use resolver::{QueryEngine, Resolution, UNKNOWN_INTENT};
pub use serializer::ResultRow;
pub use templates::{find_template, Intent, QueryTemplate, TemplateRegistry};

//! Count command implementation.

use crate::filter::parse_filter;
use entiodata_core::{InMemoryProducer, QueryInfo};
use serde::Serialize;

/// Count result.
#[derive(Debug, Serialize)]
pub struct CountResult {
    /// Entity set counted.
    pub entity_set: String,
    /// Number of matching entities.
    pub count: usize,
}

/// Runs the count command.
pub fn run(
    producer: &InMemoryProducer,
    set: &str,
    filter: Option<&str>,
    top: Option<usize>,
    skip: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut query = QueryInfo::new();
    if let Some(filter) = filter {
        query.filter = Some(parse_filter(filter)?);
    }
    query.top = top;
    query.skip = skip;

    let result = CountResult {
        entity_set: set.to_string(),
        count: producer.get_entities_count(set, &query)?,
    };
    match format {
        "json" => println!("{}", serde_json::to_string_pretty(&result)?),
        _ => println!("{}", result.count),
    }
    Ok(())
}

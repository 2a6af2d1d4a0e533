//! Query command implementation.

use crate::filter::{parse_filter, parse_order_by};
use entiodata_core::query::PropertyPath;
use entiodata_core::{InMemoryProducer, InlineCount, QueryInfo};
use tracing::info;

/// Options of the query command.
#[derive(Debug, Default)]
pub struct QueryArgs {
    /// Filter expression.
    pub filter: Option<String>,
    /// Ordering list.
    pub order_by: Option<String>,
    /// Maximum number of entities.
    pub top: Option<usize>,
    /// Number of entities to skip.
    pub skip: Option<usize>,
    /// Resume after this key string.
    pub skip_token: Option<String>,
    /// Request an inline count.
    pub inline_count: bool,
    /// Comma-separated selected paths.
    pub select: Option<String>,
    /// Comma-separated expanded paths.
    pub expand: Option<String>,
}

impl QueryArgs {
    /// Builds the query descriptor.
    pub fn to_query(&self) -> Result<QueryInfo, Box<dyn std::error::Error>> {
        let mut query = QueryInfo::new();
        if let Some(filter) = &self.filter {
            query.filter = Some(parse_filter(filter)?);
        }
        if let Some(order_by) = &self.order_by {
            query.order_by = parse_order_by(order_by)?;
        }
        query.top = self.top;
        query.skip = self.skip;
        query.skip_token.clone_from(&self.skip_token);
        if self.inline_count {
            query.inline_count = InlineCount::AllPages;
        }
        query.select = paths(self.select.as_deref());
        query.expand = paths(self.expand.as_deref());
        Ok(query)
    }
}

fn paths(list: Option<&str>) -> Vec<PropertyPath> {
    list.map(|list| {
        list.split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(PropertyPath::parse)
            .collect()
    })
    .unwrap_or_default()
}

/// Runs the query command.
pub fn run(
    producer: &InMemoryProducer,
    set: &str,
    args: &QueryArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let query = args.to_query()?;
    let page = producer.get_entities(set, &query)?;
    info!(
        "{} entities from {}{}",
        page.entities.len(),
        set,
        if page.skip_token.is_some() { ", more available" } else { "" }
    );
    println!("{}", serde_json::to_string_pretty(&page)?);
    Ok(())
}

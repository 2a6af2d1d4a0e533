//! Query descriptors.

use super::expr::{Expr, OrderBy, PropertyPath};

/// Whether a total count accompanies a result page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InlineCount {
    /// No count.
    #[default]
    None,
    /// Count every entity that passes the filter.
    AllPages,
}

/// Query options for one request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryInfo {
    /// Filter predicate.
    pub filter: Option<Expr>,
    /// Ordering keys, most significant first.
    pub order_by: Vec<OrderBy>,
    /// Maximum number of entities requested.
    pub top: Option<usize>,
    /// Number of entities to skip.
    pub skip: Option<usize>,
    /// Resume after the entity with this key string.
    pub skip_token: Option<String>,
    /// Inline count request.
    pub inline_count: InlineCount,
    /// Selected property paths; empty selects everything.
    pub select: Vec<PropertyPath>,
    /// Expanded navigation paths.
    pub expand: Vec<PropertyPath>,
}

impl QueryInfo {
    /// Creates an empty query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the filter.
    #[must_use]
    pub fn filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Appends an ordering key.
    #[must_use]
    pub fn order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    /// Sets `top`.
    #[must_use]
    pub const fn top(mut self, top: usize) -> Self {
        self.top = Some(top);
        self
    }

    /// Sets `skip`.
    #[must_use]
    pub const fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Sets the skip token.
    #[must_use]
    pub fn skip_token(mut self, token: impl Into<String>) -> Self {
        self.skip_token = Some(token.into());
        self
    }

    /// Requests an inline count.
    #[must_use]
    pub const fn inline_count(mut self, count: InlineCount) -> Self {
        self.inline_count = count;
        self
    }

    /// Adds a selected path.
    #[must_use]
    pub fn select(mut self, path: &str) -> Self {
        self.select.push(PropertyPath::parse(path));
        self
    }

    /// Adds an expanded path.
    #[must_use]
    pub fn expand(mut self, path: &str) -> Self {
        self.expand.push(PropertyPath::parse(path));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_pattern() {
        let query = QueryInfo::new()
            .filter(Expr::property("Id").gt(Expr::literal(1)))
            .order_by(OrderBy::desc(Expr::property("Total")))
            .top(5)
            .skip(2)
            .skip_token("7")
            .inline_count(InlineCount::AllPages)
            .select("Id")
            .expand("Items/Product");

        assert!(query.filter.is_some());
        assert_eq!(query.order_by.len(), 1);
        assert_eq!(query.top, Some(5));
        assert_eq!(query.skip, Some(2));
        assert_eq!(query.skip_token.as_deref(), Some("7"));
        assert_eq!(query.inline_count, InlineCount::AllPages);
        assert_eq!(query.expand[0].segments(), ["Items", "Product"]);
    }

    #[test]
    fn default_is_unrestricted() {
        let query = QueryInfo::default();
        assert!(query.filter.is_none());
        assert!(query.select.is_empty());
        assert_eq!(query.inline_count, InlineCount::None);
    }
}

//! Select/expand tracking during materialization.

use super::expr::PropertyPath;

/// Tracks the current navigation path while materializing an entity graph
/// and answers select/expand questions relative to it.
#[derive(Debug, Clone, Default)]
pub struct SelectExpandState {
    select: Vec<Vec<String>>,
    expand: Vec<Vec<String>>,
    current: Vec<String>,
}

impl SelectExpandState {
    /// Creates a state rooted at the top-level entity.
    pub fn new(select: &[PropertyPath], expand: &[PropertyPath]) -> Self {
        Self {
            select: select.iter().map(|p| p.segments().to_vec()).collect(),
            expand: expand.iter().map(|p| p.segments().to_vec()).collect(),
            current: Vec::new(),
        }
    }

    /// Expands every navigation listed, selecting everything.
    pub fn expand_all(expand: &[PropertyPath]) -> Self {
        Self::new(&[], expand)
    }

    /// Enters a navigation property.
    pub fn navigate(&mut self, name: &str) {
        self.current.push(name.to_string());
    }

    /// Leaves the innermost navigation property.
    pub fn pop(&mut self) {
        self.current.pop();
    }

    /// Current navigation depth.
    pub fn depth(&self) -> usize {
        self.current.len()
    }

    fn candidate<'s>(&'s self, name: &'s str) -> Vec<&'s str> {
        self.current
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(name))
            .collect()
    }

    /// Whether `name` at the current path is selected.
    ///
    /// A property is selected when nothing is selected explicitly, when a
    /// select path runs through it, when it lies under a selected path, or
    /// when its parent path is selected with `*`.
    pub fn is_selected(&self, name: &str) -> bool {
        if self.select.is_empty() {
            return true;
        }
        let candidate = self.candidate(name);
        self.select.iter().any(|path| {
            starts_with(path, &candidate)
                || starts_with(&candidate, path)
                || (path.len() == candidate.len()
                    && path.last().is_some_and(|s| s == "*")
                    && starts_with(&candidate, &path[..path.len() - 1]))
        })
    }

    /// Whether navigation `name` at the current path is expanded.
    pub fn is_expanded(&self, name: &str) -> bool {
        let candidate = self.candidate(name);
        self.expand.iter().any(|path| starts_with(path, &candidate))
    }
}

fn starts_with<A: AsRef<str>, B: AsRef<str>>(path: &[A], prefix: &[B]) -> bool {
    path.len() >= prefix.len()
        && path
            .iter()
            .zip(prefix)
            .all(|(a, b)| a.as_ref() == b.as_ref())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(list: &[&str]) -> Vec<PropertyPath> {
        list.iter().map(|p| PropertyPath::parse(p)).collect()
    }

    #[test]
    fn empty_select_selects_everything() {
        let state = SelectExpandState::new(&[], &[]);
        assert!(state.is_selected("Anything"));
        assert!(!state.is_expanded("Anything"));
    }

    #[test]
    fn explicit_select() {
        let state = SelectExpandState::new(&paths(&["Id", "Customer/Name"]), &[]);
        assert!(state.is_selected("Id"));
        assert!(state.is_selected("Customer"));
        assert!(!state.is_selected("Total"));
    }

    #[test]
    fn select_applies_within_subtree() {
        let mut state =
            SelectExpandState::new(&paths(&["Id", "Customer/Name"]), &paths(&["Customer"]));
        assert!(state.is_expanded("Customer"));
        state.navigate("Customer");
        assert!(state.is_selected("Name"));
        assert!(!state.is_selected("City"));
        state.pop();
        assert_eq!(state.depth(), 0);
    }

    #[test]
    fn selected_navigation_selects_children() {
        let mut state = SelectExpandState::new(&paths(&["Customer"]), &paths(&["Customer"]));
        state.navigate("Customer");
        assert!(state.is_selected("City"));
    }

    #[test]
    fn star_selects_siblings() {
        let mut state = SelectExpandState::new(&paths(&["Items/*"]), &paths(&["Items"]));
        assert!(state.is_selected("Items"));
        state.navigate("Items");
        assert!(state.is_selected("Sku"));
    }

    #[test]
    fn nested_candidates_borrow_the_name() {
        let mut state = SelectExpandState::new(&paths(&["Items/Sku"]), &paths(&["Items"]));
        state.navigate("Items");
        let name = String::from("Sku");
        assert!(state.is_selected(&name));
        assert!(!state.is_selected(&String::from("Qty")));
    }

    #[test]
    fn nested_expand() {
        let mut state = SelectExpandState::expand_all(&paths(&["Items/Product"]));
        assert!(state.is_expanded("Items"));
        state.navigate("Items");
        assert!(state.is_expanded("Product"));
        assert!(!state.is_expanded("Supplier"));
    }
}

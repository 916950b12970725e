//! The hash-indexed child-map owned by each tree node.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::tree::Node;

/// Maps a folder's immediate child names to their nodes.
pub(crate) struct ChildMap(HashMap<String, Node>);

impl ChildMap {
    pub(crate) fn new() -> Self {
        ChildMap(HashMap::new())
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Node> {
        self.0.get(name)
    }

    /// Inserts `node` under `name`. Fails (returning `node` back) if the
    /// name is already taken, so the caller can free the candidate or
    /// reuse it elsewhere (as `Tree::move_to` does when compensating a
    /// failed move).
    pub(crate) fn insert(&mut self, name: String, node: Node) -> Result<(), Node> {
        match self.0.entry(name) {
            Entry::Occupied(_) => Err(node),
            Entry::Vacant(slot) => {
                slot.insert(node);
                Ok(())
            }
        }
    }

    pub(crate) fn remove(&mut self, name: &str) -> Option<Node> {
        self.0.remove(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterates over `(name, node)` pairs, in arbitrary order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = (&str, &Node)> {
        self.0.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Renders the child-map's keys as a comma-separated list. Order is
    /// not semantically meaningful but is sorted for reproducibility.
    pub(crate) fn to_comma_list(&self) -> String {
        let mut names: Vec<&str> = self.0.keys().map(String::as_str).collect();
        names.sort_unstable();
        names.join(",")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::Node;

    #[test]
    fn insert_rejects_duplicate_and_hands_node_back() {
        let mut map = ChildMap::new();
        assert!(map.insert("a".to_string(), Node::new_empty()).is_ok());
        assert!(map.insert("a".to_string(), Node::new_empty()).is_err());
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn comma_list_is_sorted() {
        let mut map = ChildMap::new();
        map.insert("c".to_string(), Node::new_empty()).unwrap();
        map.insert("a".to_string(), Node::new_empty()).unwrap();
        map.insert("b".to_string(), Node::new_empty()).unwrap();
        assert_eq!(map.to_comma_list(), "a,b,c");
    }

    #[test]
    fn remove_then_get_is_none() {
        let mut map = ChildMap::new();
        map.insert("a".to_string(), Node::new_empty()).unwrap();
        assert!(map.remove("a").is_some());
        assert!(map.get("a").is_none());
        assert!(map.remove("a").is_none());
    }

    #[test]
    fn iter_visits_every_entry() {
        let mut map = ChildMap::new();
        map.insert("a".to_string(), Node::new_empty()).unwrap();
        map.insert("b".to_string(), Node::new_empty()).unwrap();
        let mut names: Vec<&str> = map.iter().map(|(name, _)| name).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b"]);
    }
}

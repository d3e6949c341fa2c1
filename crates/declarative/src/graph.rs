//! Dependency ordering between resource instances

use crate::error::{EngineError, Result};
use crate::types::Address;
use std::collections::{BTreeMap, BTreeSet};

/// Directed graph where an edge `a -> b` means `a` depends on `b`.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    edges: BTreeMap<Address, BTreeSet<Address>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an adjacency map. Edges to addresses outside the map are
    /// ignored.
    pub fn from_map(map: BTreeMap<Address, BTreeSet<Address>>) -> Self {
        let nodes: BTreeSet<Address> = map.keys().cloned().collect();
        let edges = map
            .into_iter()
            .map(|(node, deps)| {
                let deps = deps
                    .into_iter()
                    .filter(|d| nodes.contains(d) && *d != node)
                    .collect();
                (node, deps)
            })
            .collect();
        Self { edges }
    }

    pub fn add_node(&mut self, node: Address) {
        self.edges.entry(node).or_default();
    }

    pub fn add_edge(&mut self, from: Address, to: Address) {
        self.edges.entry(to.clone()).or_default();
        if from != to {
            self.edges.entry(from).or_default().insert(to);
        }
    }

    pub fn contains(&self, node: &Address) -> bool {
        self.edges.contains_key(node)
    }

    /// Nodes grouped so that every node comes after all of its dependencies.
    /// Nodes within one level are independent and sorted.
    pub fn levels(&self) -> Result<Vec<Vec<Address>>> {
        let mut remaining: BTreeMap<&Address, BTreeSet<&Address>> = self
            .edges
            .iter()
            .map(|(node, deps)| (node, deps.iter().collect()))
            .collect();
        let mut levels = Vec::new();

        while !remaining.is_empty() {
            let ready: Vec<&Address> = remaining
                .iter()
                .filter(|(_, deps)| deps.is_empty())
                .map(|(node, _)| *node)
                .collect();
            if ready.is_empty() {
                return Err(EngineError::Cycle(
                    remaining.keys().map(ToString::to_string).collect(),
                ));
            }
            for node in &ready {
                remaining.remove(*node);
            }
            for deps in remaining.values_mut() {
                for node in &ready {
                    deps.remove(*node);
                }
            }
            levels.push(ready.into_iter().cloned().collect());
        }

        Ok(levels)
    }

    /// Levels in teardown order: dependents before their dependencies.
    pub fn reverse_levels(&self) -> Result<Vec<Vec<Address>>> {
        let mut levels = self.levels()?;
        levels.reverse();
        Ok(levels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(s: &str) -> Address {
        s.parse().unwrap()
    }

    #[test]
    fn test_levels_follow_dependencies() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(addr("alias.a"), addr("entity.a"));
        graph.add_edge(addr("alias.a"), addr("auth.github"));
        graph.add_edge(addr("alias.b"), addr("entity.b"));
        graph.add_node(addr("team.dev"));

        let levels = graph.levels().unwrap();
        assert_eq!(levels.len(), 2);
        assert_eq!(
            levels[0],
            vec![
                addr("auth.github"),
                addr("entity.a"),
                addr("entity.b"),
                addr("team.dev")
            ]
        );
        assert_eq!(levels[1], vec![addr("alias.a"), addr("alias.b")]);

        let reversed = graph.reverse_levels().unwrap();
        assert_eq!(reversed[0], vec![addr("alias.a"), addr("alias.b")]);
    }

    #[test]
    fn test_cycle_is_reported() {
        let mut graph = DependencyGraph::new();
        graph.add_edge(addr("a.x"), addr("b.y"));
        graph.add_edge(addr("b.y"), addr("a.x"));
        graph.add_node(addr("c.z"));

        match graph.levels() {
            Err(EngineError::Cycle(nodes)) => assert_eq!(nodes, vec!["a.x", "b.y"]),
            other => panic!("Expected cycle, got {other:?}"),
        }
    }

    #[test]
    fn test_from_map_drops_dangling_edges() {
        let map = BTreeMap::from([(addr("a.x"), BTreeSet::from([addr("gone.y")]))]);
        let graph = DependencyGraph::from_map(map);
        assert_eq!(graph.levels().unwrap(), vec![vec![addr("a.x")]]);
    }
}

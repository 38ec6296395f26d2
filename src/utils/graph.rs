use std::collections::{BTreeMap, BTreeSet};

/// Graph structure:
/// A map from each node to the set of nodes it points to. Ordered
/// containers keep every traversal deterministic, so passes built on top of
/// it produce the same output on every run.
#[derive(Clone, Debug, Default)]
pub struct Graph<T: Ord>(BTreeMap<T, BTreeSet<T>>);

impl<T: Ord + Clone + Copy> Graph<T> {
  pub fn new() -> Self {
    Graph(BTreeMap::new())
  }

  /// Return the successors of a node
  ///
  /// # Return
  /// If the node does not exist, return None
  /// If there is no neighbor for this node, return an empty set
  pub fn neighbors(&self, node: &T) -> Option<&BTreeSet<T>> {
    self.0.get(node)
  }

  pub fn contains(&self, node: &T) -> bool {
    self.0.contains_key(node)
  }

  /// All nodes in ascending order
  pub fn nodes(&self) -> impl Iterator<Item = &T> {
    self.0.keys()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  /// Idempotently add a node into the graph
  pub fn add_node(&mut self, node: T) {
    self.0.entry(node).or_default();
  }

  /// Add an edge between two nodes, i.e. node1 and node2
  pub fn add_graph_edge(&mut self, node1: T, node2: T) {
    self.add_directed_edge(node1, node2);
    self.add_directed_edge(node2, node1);
  }

  pub fn add_directed_edge(&mut self, from: T, to: T) {
    self.add_node(to);
    self.0.entry(from).or_default().insert(to);
  }

  pub fn remove_directed_edge(&mut self, from: &T, to: &T) {
    if let Some(succs) = self.0.get_mut(from) {
      succs.remove(to);
    }
  }

  pub fn remove_node(&mut self, node: T) {
    self.0.remove(&node);
    for (_, neighbors) in self.0.iter_mut() {
      neighbors.remove(&node);
    }
  }

  /// Number of edges pointing at `node`.
  pub fn in_degree(&self, node: &T) -> usize {
    self.0.values().filter(|succs| succs.contains(node)).count()
  }

  /// Nodes with no incoming edge, in ascending order.
  pub fn sources(&self) -> Vec<T> {
    self
      .0
      .keys()
      .filter(|n| self.in_degree(n) == 0)
      .copied()
      .collect()
  }
}

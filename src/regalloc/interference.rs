use serde::Serialize;

use crate::{ssa::SsaMethod, utils::BitVector};

use super::Liveness;

/// Interference between SSA registers, one adjacency bit-vector per
/// register. Edges are between register numbers; slot widths are resolved
/// by the allocator when it looks at the neighbors' assigned slots.
#[derive(Debug, Clone)]
pub struct InterferenceGraph {
  adjacency: Vec<BitVector>,
  degrees: Vec<u32>,
}

#[derive(Serialize)]
struct NodeDump {
  register: u32,
  degree: u32,
  neighbors: Vec<usize>,
}

impl InterferenceGraph {
  pub fn new(num_regs: u32) -> Self {
    let n = num_regs as usize;
    InterferenceGraph {
      adjacency: vec![BitVector::new(n); n],
      degrees: vec![0; n],
    }
  }

  /// Build the interference graph from the liveness analysis result.
  ///
  /// Each reachable block is walked backwards from its live-out set: a
  /// definition interferes with everything live right after it. Phi
  /// results interfere with the block's live-in set and with each other,
  /// since all phis of a block are assigned at once on entry.
  pub fn from_liveness(liveness: &Liveness, method: &SsaMethod) -> Self {
    let mut graph = InterferenceGraph::new(liveness.num_regs());
    for b in method.reverse_postorder() {
      let block = method.block(b);
      let mut live = liveness.live_out(b).clone();
      for insn in block.normal_insns().rev() {
        if let Some(result) = insn.result {
          let reg = result.reg() as usize;
          live.clear(reg);
          graph.add_edges(reg, &live);
        }
        for src in &insn.sources {
          live.set(src.reg() as usize);
        }
      }

      let phi_results = block
        .phis()
        .map(|phi| phi.result.reg() as usize)
        .collect::<Vec<_>>();
      for &reg in &phi_results {
        live.set(reg);
      }
      for &reg in &phi_results {
        graph.add_edges(reg, &live);
      }
    }

    log::debug!(
      "interference: {} regs, {} edges",
      graph.num_regs(),
      graph.degrees.iter().map(|d| *d as usize).sum::<usize>() / 2
    );
    graph
  }

  pub fn num_regs(&self) -> u32 {
    self.adjacency.len() as u32
  }

  pub fn add_edge(&mut self, a: usize, b: usize) {
    if a == b || self.adjacency[a].get(b) {
      return;
    }
    self.adjacency[a].set(b);
    self.adjacency[b].set(a);
    self.degrees[a] += 1;
    self.degrees[b] += 1;
  }

  /// Adds an edge between `reg` and every register in `live`.
  pub fn add_edges(&mut self, reg: usize, live: &BitVector) {
    for other in live.iter() {
      self.add_edge(reg, other);
    }
  }

  pub fn neighbors(&self, reg: u32) -> &BitVector {
    &self.adjacency[reg as usize]
  }

  pub fn degree(&self, reg: u32) -> u32 {
    self.degrees[reg as usize]
  }

  pub fn interferes(&self, a: u32, b: u32) -> bool {
    self.adjacency[a as usize].get(b as usize)
  }

  /// JSON listing of every register with its degree and neighbors.
  pub fn dump(&self) -> serde_json::Result<String> {
    let nodes = self
      .adjacency
      .iter()
      .zip(self.degrees.iter())
      .enumerate()
      .map(|(reg, (adj, degree))| NodeDump {
        register: reg as u32,
        degree: *degree,
        neighbors: adj.iter().collect(),
      })
      .collect::<Vec<_>>();
    serde_json::to_string(&nodes)
  }
}

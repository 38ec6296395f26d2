use std::collections::BTreeSet;

use crate::insn::Insn;

use super::{PhiInsn, SsaInsn};

/// A basic block of an SSA method.
///
/// Instructions are a phi prefix followed by normal instructions; the last
/// normal instruction transfers control. Blocks refer to each other by index
/// into the owning method's block list.
#[derive(Debug, Clone)]
pub struct SsaBasicBlock {
  pub(crate) index: usize,
  pub(crate) label: u32,
  pub(crate) insns: Vec<SsaInsn>,
  pub(crate) predecessors: BTreeSet<usize>,
  pub(crate) successors: Vec<usize>,
  pub(crate) primary_successor: Option<usize>,
  pub(crate) reachable: bool,
}

impl SsaBasicBlock {
  pub(crate) fn new(index: usize, label: u32) -> Self {
    SsaBasicBlock {
      index,
      label,
      insns: vec![],
      predecessors: BTreeSet::new(),
      successors: vec![],
      primary_successor: None,
      reachable: false,
    }
  }

  pub fn index(&self) -> usize {
    self.index
  }

  pub fn label(&self) -> u32 {
    self.label
  }

  pub fn insns(&self) -> &[SsaInsn] {
    &self.insns
  }

  pub fn phis(&self) -> impl Iterator<Item = &PhiInsn> {
    self.insns.iter().map_while(SsaInsn::as_phi)
  }

  pub fn phi_count(&self) -> usize {
    self.insns.iter().take_while(|i| i.is_phi()).count()
  }

  pub fn normal_insns(&self) -> impl DoubleEndedIterator<Item = &Insn> {
    self.insns.iter().filter_map(SsaInsn::as_normal)
  }

  pub fn last_insn(&self) -> Option<&Insn> {
    self.insns.last().and_then(SsaInsn::as_normal)
  }

  pub fn predecessors(&self) -> &BTreeSet<usize> {
    &self.predecessors
  }

  pub fn successors(&self) -> &[usize] {
    &self.successors
  }

  pub fn primary_successor(&self) -> Option<usize> {
    self.primary_successor
  }

  pub fn is_reachable(&self) -> bool {
    self.reachable
  }

  pub(crate) fn remove_all_phis(&mut self) {
    self.insns.retain(|i| !i.is_phi());
  }

  /// Inserts `moves` right before the block's final instruction.
  pub(crate) fn insert_before_last(&mut self, moves: Vec<Insn>) {
    let at = self.insns.len().saturating_sub(1);
    self
      .insns
      .splice(at..at, moves.into_iter().map(SsaInsn::Normal));
  }

  /// Inserts `moves` after the phi prefix.
  pub(crate) fn insert_at_beginning(&mut self, moves: Vec<Insn>) {
    let at = self.phi_count();
    self
      .insns
      .splice(at..at, moves.into_iter().map(SsaInsn::Normal));
  }

  /// Redirects this block's edges from `old` to `new`, keeping the primary
  /// successor in step. Predecessor sets are maintained by the method.
  pub(crate) fn replace_successor_edges(&mut self, old: usize, new: usize) {
    for succ in self.successors.iter_mut() {
      if *succ == old {
        *succ = new;
      }
    }
    if self.primary_successor == Some(old) {
      self.primary_successor = Some(new);
    }
  }

  pub fn display(&self) -> String {
    let mut res = format!("block {} (b{})", self.label, self.index);
    if !self.predecessors.is_empty() {
      let preds = self
        .predecessors
        .iter()
        .map(|p| format!("b{}", p))
        .collect::<Vec<_>>();
      res.push_str(&format!(" preds: {}", preds.join(", ")));
    }
    res.push('\n');
    for insn in &self.insns {
      res.push_str(&format!("\t{}\n", insn));
    }
    if !self.successors.is_empty() {
      let succs = self
        .successors
        .iter()
        .map(|s| {
          if Some(*s) == self.primary_successor {
            format!("b{}*", s)
          } else {
            format!("b{}", s)
          }
        })
        .collect::<Vec<_>>();
      res.push_str(&format!("\tsuccs: {}\n", succs.join(", ")));
    }
    res
  }
}

use std::collections::HashSet;

use anyhow::{anyhow, Result};

use crate::insn::{Insn, RegSpec};

use super::{PhiInsn, SsaBasicBlock, SsaInsn, SsaMethod};

/// Assembles an [`SsaMethod`] block by block. Predecessor sets, the
/// register count and reachability are derived in [`SsaMethodBuilder::build`].
#[derive(Debug, Default)]
pub struct SsaMethodBuilder {
  blocks: Vec<SsaBasicBlock>,
  entry: Option<usize>,
  exit: Option<usize>,
  param_width: u32,
  params_at_top: bool,
}

impl SsaMethodBuilder {
  pub fn new(param_width: u32) -> Self {
    SsaMethodBuilder {
      param_width,
      params_at_top: true,
      ..Default::default()
    }
  }

  /// Whether lowering moves the parameters to the top of the frame once
  /// registers are allocated. On by default.
  pub fn params_at_top(&mut self, params_at_top: bool) {
    self.params_at_top = params_at_top;
  }

  /// Adds an empty block and returns its index. The first block added is
  /// the entry unless [`SsaMethodBuilder::set_entry`] says otherwise.
  pub fn add_block(&mut self, label: u32) -> usize {
    let index = self.blocks.len();
    self.blocks.push(SsaBasicBlock::new(index, label));
    index
  }

  /// Adds the synthetic exit block.
  pub fn add_exit_block(&mut self, label: u32) -> usize {
    let index = self.add_block(label);
    self.exit = Some(index);
    index
  }

  pub fn set_entry(&mut self, block: usize) {
    self.entry = Some(block);
  }

  /// Appends a phi. `operands` pairs each predecessor block index with the
  /// register read along that edge.
  pub fn phi(&mut self, block: usize, result: RegSpec, operands: &[(usize, RegSpec)]) {
    let mut phi = PhiInsn::new(result);
    for (pred, source) in operands {
      phi.add_operand(*pred, *source);
    }
    let insns = &mut self.blocks[block].insns;
    let at = insns.iter().take_while(|i| i.is_phi()).count();
    insns.insert(at, SsaInsn::Phi(phi));
  }

  pub fn insn(&mut self, block: usize, insn: Insn) {
    self.blocks[block].insns.push(SsaInsn::Normal(insn));
  }

  pub fn insns(&mut self, block: usize, insns: impl IntoIterator<Item = Insn>) {
    for insn in insns {
      self.insn(block, insn);
    }
  }

  /// Sets the ordered successor list and the primary (fall-through or
  /// unconditional) successor.
  pub fn successors(&mut self, block: usize, succs: &[usize], primary: Option<usize>) {
    let b = &mut self.blocks[block];
    b.successors = succs.to_vec();
    b.primary_successor = primary;
  }

  pub fn build(mut self) -> Result<SsaMethod> {
    if self.blocks.is_empty() {
      return Err(anyhow!("method has no blocks"));
    }
    let nblocks = self.blocks.len();
    let entry = self.entry.unwrap_or(0);
    if entry >= nblocks {
      return Err(anyhow!("entry block {} does not exist", entry));
    }

    let mut labels = HashSet::new();
    for block in &self.blocks {
      if !labels.insert(block.label) {
        return Err(anyhow!("duplicate block label {}", block.label));
      }
      for succ in &block.successors {
        if *succ >= nblocks {
          return Err(anyhow!(
            "block {} has successor {} out of range",
            block.label,
            succ
          ));
        }
      }
      if let Some(primary) = block.primary_successor {
        if !block.successors.contains(&primary) {
          return Err(anyhow!(
            "block {} has primary successor {} outside its successor list",
            block.label,
            primary
          ));
        }
      }
      for phi in block.phis() {
        if let Some(op) = phi.operands.iter().find(|op| op.pred >= nblocks) {
          return Err(anyhow!(
            "phi {} in block {} names predecessor {} out of range",
            phi.result,
            block.label,
            op.pred
          ));
        }
      }
    }

    let edges = self
      .blocks
      .iter()
      .flat_map(|b| b.successors.iter().map(move |s| (b.index, *s)))
      .collect::<Vec<_>>();
    for (from, to) in edges {
      self.blocks[to].predecessors.insert(from);
    }

    let reg_count = self
      .blocks
      .iter()
      .flat_map(|b| b.insns.iter())
      .flat_map(|i| i.sources().into_iter().chain(i.result()))
      .map(|spec| spec.reg() + 1)
      .max()
      .unwrap_or(0);

    let mut method = SsaMethod {
      blocks: self.blocks,
      entry,
      exit: self.exit,
      reg_count,
      param_width: self.param_width,
      params_at_top: self.params_at_top,
      spare_register_base: reg_count,
      borrowed_spare_registers: 0,
    };
    method.compute_reachability();
    Ok(method)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn derives_predecessors_and_register_count() {
    let mut b = SsaMethodBuilder::new(1);
    let b0 = b.add_block(10);
    let b1 = b.add_block(11);
    let exit = b.add_exit_block(12);
    b.insns(b0, vec![Insn::param(RegSpec::narrow(0), 0), Insn::goto()]);
    b.successors(b0, &[b1], Some(b1));
    b.phi(b1, RegSpec::wide(4), &[(b0, RegSpec::narrow(0))]);
    b.insn(b1, Insn::ret(None));
    b.successors(b1, &[exit], Some(exit));
    let method = b.build().unwrap();

    assert_eq!(method.reg_count(), 5);
    assert_eq!(method.param_width(), 1);
    assert_eq!(method.exit(), Some(exit));
    assert!(method.block(b1).predecessors().contains(&b0));
    assert!(method.block(exit).predecessors().contains(&b1));
    assert_eq!(method.block(b1).phi_count(), 1);
  }

  #[test]
  fn phis_stay_ahead_of_normal_insns() {
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    b.insn(b0, Insn::ret(None));
    b.phi(b0, RegSpec::narrow(1), &[]);
    let method = b.build().unwrap();
    assert!(method.block(b0).insns()[0].is_phi());
    assert!(method.block(b0).last_insn().is_some());
  }

  #[test]
  fn rejects_bad_successor() {
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    b.successors(b0, &[7], None);
    assert!(b.build().is_err());
  }

  #[test]
  fn rejects_duplicate_labels() {
    let mut b = SsaMethodBuilder::new(0);
    b.add_block(3);
    b.add_block(3);
    assert!(b.build().is_err());
  }
}

use std::collections::BTreeMap;

use super::RopBasicBlock;

/// A lowered method over physical registers. Immutable once built; the
/// entry is identified by label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RopMethod {
  blocks: Vec<RopBasicBlock>,
  first_label: u32,
  reg_count: u32,
  /// label -> position in `blocks`
  by_label: BTreeMap<u32, usize>,
}

impl RopMethod {
  pub(crate) fn new(blocks: Vec<RopBasicBlock>, first_label: u32, reg_count: u32) -> Self {
    let by_label = blocks
      .iter()
      .enumerate()
      .map(|(idx, b)| (b.label(), idx))
      .collect();
    RopMethod {
      blocks,
      first_label,
      reg_count,
      by_label,
    }
  }

  pub fn blocks(&self) -> &[RopBasicBlock] {
    &self.blocks
  }

  pub fn first_label(&self) -> u32 {
    self.first_label
  }

  pub fn reg_count(&self) -> u32 {
    self.reg_count
  }

  pub fn block_for_label(&self, label: u32) -> Option<&RopBasicBlock> {
    self.by_label.get(&label).map(|idx| &self.blocks[*idx])
  }

  /// Labels of the blocks with an edge to `label`, ascending.
  pub fn predecessors_of(&self, label: u32) -> Vec<u32> {
    let mut preds = self
      .blocks
      .iter()
      .filter(|b| b.successors().contains(&label))
      .map(|b| b.label())
      .collect::<Vec<_>>();
    preds.sort_unstable();
    preds
  }

  /// Labels of the blocks that leave the method (no successors).
  pub fn exit_predecessors(&self) -> Vec<u32> {
    self
      .blocks
      .iter()
      .filter(|b| b.successors().is_empty())
      .map(|b| b.label())
      .collect()
  }

  pub(crate) fn into_blocks(self) -> Vec<RopBasicBlock> {
    self.blocks
  }
}

impl std::fmt::Display for RopMethod {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    writeln!(
      f,
      "rop method: first block {}, {} regs",
      self.first_label, self.reg_count
    )?;
    for block in &self.blocks {
      write!(f, "{}", block)?;
    }
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use crate::insn::{Insn, RegSpec};

  use super::*;

  #[test]
  fn queries_by_label() {
    let method = RopMethod::new(
      vec![
        RopBasicBlock::new(7, vec![Insn::goto()], vec![9], Some(9)),
        RopBasicBlock::new(8, vec![Insn::goto()], vec![9], Some(9)),
        RopBasicBlock::new(9, vec![Insn::ret(Some(RegSpec::narrow(0)))], vec![], None),
      ],
      7,
      1,
    );
    assert_eq!(method.block_for_label(8).map(|b| b.label()), Some(8));
    assert!(method.block_for_label(1).is_none());
    assert_eq!(method.predecessors_of(9), vec![7, 8]);
    assert_eq!(method.exit_predecessors(), vec![9]);

    let listing = method.to_string();
    assert!(listing.starts_with("rop method: first block 7, 1 regs"));
    assert!(listing.contains("succs: 9*"));
  }
}

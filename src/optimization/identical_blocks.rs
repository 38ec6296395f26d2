use std::collections::BTreeMap;

use crate::{
  insn::Opcode,
  rop::{RopBasicBlock, RopMethod},
};

/// Merges blocks with equal instructions that lead to the same single
/// successor, keeping one copy and pointing the others' predecessors at it.
///
/// Runs until nothing merges, so running it again is a no-op.
pub(crate) fn merge_identical_blocks(mut method: RopMethod) -> RopMethod {
  loop {
    let replacements = find_duplicates(&method);
    if replacements.is_empty() {
      return method;
    }
    log::debug!("merging {} identical blocks", replacements.len());
    method = redirect(method, &replacements);
  }
}

fn is_candidate(block: &RopBasicBlock, target: u32) -> bool {
  block.label() != target
    && block.successors() == [target]
    && block.insns().first().map_or(true, |i| i.opcode != Opcode::MoveResult)
}

/// duplicate label -> label of the block it merges into
fn find_duplicates(method: &RopMethod) -> BTreeMap<u32, u32> {
  let mut replacements = BTreeMap::new();
  for target in method.blocks().iter().map(RopBasicBlock::label) {
    let candidates = method
      .predecessors_of(target)
      .into_iter()
      .filter_map(|label| method.block_for_label(label))
      .filter(|b| is_candidate(b, target))
      .collect::<Vec<_>>();

    let mut merged = vec![false; candidates.len()];
    for i in 0..candidates.len() {
      if merged[i] {
        continue;
      }
      let group = (i..candidates.len())
        .filter(|j| !merged[*j] && candidates[*j].insns() == candidates[i].insns())
        .collect::<Vec<_>>();
      if group.len() < 2 {
        continue;
      }
      // the entry must survive, so it is the one kept when present
      let keep = group
        .iter()
        .copied()
        .find(|j| candidates[*j].label() == method.first_label())
        .unwrap_or(i);
      for j in group {
        merged[j] = true;
        if j != keep {
          replacements.insert(candidates[j].label(), candidates[keep].label());
        }
      }
    }
  }
  replacements
}

fn redirect(method: RopMethod, replacements: &BTreeMap<u32, u32>) -> RopMethod {
  let first_label = method.first_label();
  let reg_count = method.reg_count();
  let blocks = method
    .into_blocks()
    .into_iter()
    .filter(|b| !replacements.contains_key(&b.label()))
    .map(|b| {
      replacements
        .iter()
        .fold(b, |b, (old, new)| b.with_successor_replaced(*old, *new))
    })
    .collect();
  RopMethod::new(blocks, first_label, reg_count)
}

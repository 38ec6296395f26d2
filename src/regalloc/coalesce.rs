// Finds the register copies the first-fit allocator may coalesce
use std::collections::BTreeMap;

use crate::{insn::Opcode, ssa::SsaMethod};

/// Every `move` whose source is defined in the same block as the move,
/// as `result -> source`. Copies across blocks are left alone.
pub(crate) fn local_copies(method: &SsaMethod) -> BTreeMap<u32, u32> {
  let def_blocks = method.definition_blocks();
  let mut copies = BTreeMap::new();
  for block in method.blocks().iter().filter(|b| b.is_reachable()) {
    for insn in block.normal_insns() {
      if insn.opcode != Opcode::Move {
        continue;
      }
      if let (Some(result), [source]) = (insn.result, insn.sources.as_slice()) {
        if def_blocks[source.reg() as usize] == Some(block.index()) {
          copies.insert(result.reg(), source.reg());
        }
      }
    }
  }
  log::trace!("{} local copies are coalescing candidates", copies.len());
  copies
}

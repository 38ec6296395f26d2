use crate::{
  insn::Category,
  regalloc::RegisterMapper,
  utils::BitVector,
};

use super::{SsaBasicBlock, SsaInsn};

/// A method body in SSA form over an unbounded set of virtual registers.
///
/// Owns its blocks exclusively; blocks address each other by index. The
/// optional exit block is synthetic: it is never emitted and must stay
/// empty.
#[derive(Debug, Clone)]
pub struct SsaMethod {
  pub(crate) blocks: Vec<SsaBasicBlock>,
  pub(crate) entry: usize,
  pub(crate) exit: Option<usize>,
  /// Number of register numbers in use (SSA names before allocation,
  /// physical slots afterwards).
  pub(crate) reg_count: u32,
  /// Width in slots of the incoming parameters.
  pub(crate) param_width: u32,
  /// Whether the parameters end up in the highest slots.
  pub(crate) params_at_top: bool,
  pub(crate) spare_register_base: u32,
  pub(crate) borrowed_spare_registers: u32,
}

impl SsaMethod {
  pub fn blocks(&self) -> &[SsaBasicBlock] {
    &self.blocks
  }

  pub fn block(&self, index: usize) -> &SsaBasicBlock {
    &self.blocks[index]
  }

  pub(crate) fn block_mut(&mut self, index: usize) -> &mut SsaBasicBlock {
    &mut self.blocks[index]
  }

  pub fn entry(&self) -> usize {
    self.entry
  }

  pub fn exit(&self) -> Option<usize> {
    self.exit
  }

  pub fn exit_block(&self) -> Option<&SsaBasicBlock> {
    self.exit.map(|idx| &self.blocks[idx])
  }

  pub fn reg_count(&self) -> u32 {
    self.reg_count
  }

  pub fn param_width(&self) -> u32 {
    self.param_width
  }

  pub fn params_at_top(&self) -> bool {
    self.params_at_top
  }

  /// Marks every block reachable from the entry by a depth-first walk.
  pub fn compute_reachability(&mut self) {
    let order = self.depth_first_order();
    for block in self.blocks.iter_mut() {
      block.reachable = false;
    }
    for idx in order {
      self.blocks[idx].reachable = true;
    }
  }

  /// Preorder depth-first walk from the entry, visiting successors in
  /// list order. Only reachable blocks appear.
  pub fn depth_first_order(&self) -> Vec<usize> {
    let mut visited = vec![false; self.blocks.len()];
    let mut order = vec![];
    let mut stack = vec![self.entry];
    while let Some(idx) = stack.pop() {
      if visited[idx] {
        continue;
      }
      visited[idx] = true;
      order.push(idx);
      for succ in self.blocks[idx].successors.iter().rev() {
        if !visited[*succ] {
          stack.push(*succ);
        }
      }
    }
    order
  }

  /// Reverse postorder of the blocks reachable from the entry.
  pub fn reverse_postorder(&self) -> Vec<usize> {
    let mut visited = vec![false; self.blocks.len()];
    let mut postorder = vec![];
    // (block, next successor position to explore)
    let mut stack = vec![(self.entry, 0)];
    visited[self.entry] = true;
    while let Some((idx, pos)) = stack.pop() {
      let succs = &self.blocks[idx].successors;
      if pos < succs.len() {
        stack.push((idx, pos + 1));
        let succ = succs[pos];
        if !visited[succ] {
          visited[succ] = true;
          stack.push((succ, 0));
        }
      } else {
        postorder.push(idx);
      }
    }
    postorder.reverse();
    postorder
  }

  /// Category of every register number, taken from its definition (or a
  /// use, for registers that are never defined).
  pub fn register_categories(&self) -> Vec<Category> {
    let mut categories = vec![Category::One; self.reg_count as usize];
    for block in &self.blocks {
      for insn in &block.insns {
        for spec in insn.sources().into_iter().chain(insn.result()) {
          if spec.category() == Category::Two {
            categories[spec.reg() as usize] = Category::Two;
          }
        }
      }
    }
    categories
  }

  /// Block index defining each register, if any.
  pub fn definition_blocks(&self) -> Vec<Option<usize>> {
    let mut defs = vec![None; self.reg_count as usize];
    for block in &self.blocks {
      for insn in &block.insns {
        if let Some(result) = insn.result() {
          defs[result.reg() as usize] = Some(block.index);
        }
      }
    }
    defs
  }

  /// Registers in the order their definitions are met walking reachable
  /// blocks in reverse postorder, followed by every remaining register in
  /// ascending order.
  pub fn definition_order(&self) -> Vec<u32> {
    let mut seen = BitVector::new(self.reg_count as usize);
    let mut order = vec![];
    for idx in self.reverse_postorder() {
      for insn in &self.blocks[idx].insns {
        if let Some(result) = insn.result() {
          let reg = result.reg() as usize;
          if !seen.get(reg) {
            seen.set(reg);
            order.push(result.reg());
          }
        }
      }
    }
    for reg in 0..self.reg_count {
      if !seen.get(reg as usize) {
        order.push(reg);
      }
    }
    order
  }

  /// Applies `mapper` to every operand of every instruction (phis
  /// included), then drops moves that became register-to-itself copies.
  pub fn map_registers(&mut self, mapper: &RegisterMapper) {
    for block in self.blocks.iter_mut() {
      for insn in block.insns.iter_mut() {
        insn.map_registers(|spec| mapper.map(spec));
      }
      block
        .insns
        .retain(|insn| !matches!(insn, SsaInsn::Normal(i) if i.is_identity_move()));
    }
    self.reg_count = mapper.new_reg_count();
    self.spare_register_base = self.reg_count;
    self.borrowed_spare_registers = 0;
  }

  /// Redirects `block`'s edges to `old` towards `new`, updating both
  /// predecessor sets.
  pub(crate) fn replace_successor(&mut self, block: usize, old: usize, new: usize) {
    if old == new {
      return;
    }
    self.blocks[block].replace_successor_edges(old, new);
    self.blocks[old].predecessors.remove(&block);
    self.blocks[new].predecessors.insert(block);
  }

  /// Hands out a register above every allocated one, for short-lived
  /// temporaries. The register count grows to cover it.
  pub(crate) fn borrow_spare_register(&mut self, category: Category) -> u32 {
    let reg = self.spare_register_base + self.borrowed_spare_registers;
    self.borrowed_spare_registers += category.width();
    self.reg_count = self.reg_count.max(reg + category.width());
    reg
  }

  /// Makes every borrowed spare register available again.
  pub(crate) fn return_spare_registers(&mut self) {
    self.borrowed_spare_registers = 0;
  }

  pub fn display(&self) -> String {
    let mut res = format!(
      "ssa method: {} blocks, {} regs, params {}\n",
      self.blocks.len(),
      self.reg_count,
      self.param_width
    );
    for block in &self.blocks {
      res.push_str(&block.display());
    }
    res
  }
}

// SsaMethod -> per-block use/def sets -> backward fixpoint -> live-in/live-out

use crate::{ssa::SsaMethod, utils::BitVector};

/// Per-block liveness of an SSA method.
///
/// Phi operands are not uses of the phi's own block: the source for
/// predecessor `p` is live out of `p` only. Phi results are definitions of
/// the block holding the phi.
#[derive(Debug, Clone)]
pub struct Liveness {
  live_in: Vec<BitVector>,
  live_out: Vec<BitVector>,
  num_regs: u32,
  /// Number of full passes taken to reach the fixpoint.
  passes: usize,
}

impl Liveness {
  /// Runs the backward dataflow over the blocks reachable from the entry,
  /// visiting them in reverse postorder until no live-in set changes.
  pub fn from_method(method: &SsaMethod) -> Self {
    let nregs = method.reg_count() as usize;
    let nblocks = method.blocks().len();
    let (uses, defs) = Self::block_uses_and_defs(method);
    let phi_uses = Self::phi_uses_by_predecessor(method);
    let order = method.reverse_postorder();

    let mut live_in = vec![BitVector::new(nregs); nblocks];
    let mut live_out = vec![BitVector::new(nregs); nblocks];
    let mut passes = 0;
    let mut changed = true;
    while changed {
      changed = false;
      passes += 1;
      for &b in &order {
        let mut out = phi_uses[b].clone();
        for &succ in method.block(b).successors() {
          out.union_with(&live_in[succ]);
        }
        let mut inn = out.clone();
        inn.difference_with(&defs[b]);
        inn.union_with(&uses[b]);
        if inn != live_in[b] {
          live_in[b] = inn;
          changed = true;
        }
        live_out[b] = out;
      }
    }

    log::debug!(
      "liveness: {} blocks, {} regs, fixpoint after {} passes",
      order.len(),
      nregs,
      passes
    );

    Liveness {
      live_in,
      live_out,
      num_regs: nregs as u32,
      passes,
    }
  }

  /// Upward-exposed uses and definitions of each block.
  fn block_uses_and_defs(method: &SsaMethod) -> (Vec<BitVector>, Vec<BitVector>) {
    let nregs = method.reg_count() as usize;
    let mut uses = vec![BitVector::new(nregs); method.blocks().len()];
    let mut defs = vec![BitVector::new(nregs); method.blocks().len()];
    for block in method.blocks() {
      let (used, defined) = (&mut uses[block.index()], &mut defs[block.index()]);
      for phi in block.phis() {
        defined.set(phi.result.reg() as usize);
      }
      for insn in block.normal_insns() {
        for src in &insn.sources {
          let reg = src.reg() as usize;
          if !defined.get(reg) {
            used.set(reg);
          }
        }
        if let Some(result) = insn.result {
          defined.set(result.reg() as usize);
        }
      }
    }
    (uses, defs)
  }

  /// Registers read by phis along each block's outgoing edges.
  fn phi_uses_by_predecessor(method: &SsaMethod) -> Vec<BitVector> {
    let nregs = method.reg_count() as usize;
    let mut phi_uses = vec![BitVector::new(nregs); method.blocks().len()];
    for block in method.blocks() {
      for phi in block.phis() {
        for op in &phi.operands {
          phi_uses[op.pred].set(op.source.reg() as usize);
        }
      }
    }
    phi_uses
  }

  pub fn live_in(&self, block: usize) -> &BitVector {
    &self.live_in[block]
  }

  pub fn live_out(&self, block: usize) -> &BitVector {
    &self.live_out[block]
  }

  pub fn num_regs(&self) -> u32 {
    self.num_regs
  }

  pub fn passes(&self) -> usize {
    self.passes
  }
}

pub fn debug_show_liveness(method: &SsaMethod, liveness: &Liveness) {
  for block in method.blocks().iter().filter(|b| b.is_reachable()) {
    let show = |set: &BitVector| {
      set
        .iter()
        .map(|r| format!("v{}", r))
        .collect::<Vec<_>>()
        .join(" ")
    };
    log::trace!(
      "block {}: in [{}] out [{}]",
      block.label(),
      show(liveness.live_in(block.index())),
      show(liveness.live_out(block.index()))
    );
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    insn::{Insn, Opcode, RegSpec},
    ssa::SsaMethodBuilder,
  };

  use super::*;

  fn live(set: &BitVector) -> Vec<usize> {
    set.iter().collect()
  }

  #[test]
  fn straight_line() {
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    let b1 = b.add_block(1);
    let exit = b.add_exit_block(2);
    b.insns(
      b0,
      vec![
        Insn::konst(RegSpec::narrow(0), 1),
        Insn::konst(RegSpec::narrow(1), 2),
        Insn::goto(),
      ],
    );
    b.successors(b0, &[b1], Some(b1));
    b.insns(
      b1,
      vec![
        Insn::binop(Opcode::Add, RegSpec::narrow(2), RegSpec::narrow(0), RegSpec::narrow(1)),
        Insn::ret(Some(RegSpec::narrow(2))),
      ],
    );
    b.successors(b1, &[exit], Some(exit));
    let method = b.build().unwrap();
    let liveness = Liveness::from_method(&method);

    assert!(liveness.live_in(b0).is_empty());
    assert_eq!(live(liveness.live_out(b0)), vec![0, 1]);
    assert_eq!(live(liveness.live_in(b1)), vec![0, 1]);
    assert!(liveness.live_out(b1).is_empty());
  }

  #[test]
  fn loop_carries_values_around_back_edge() {
    // b0: v0 = 0; goto b1
    // b1: v1 = phi(b0: v0, b2: v2); if-eqz v1 -> b2 | b3
    // b2: v2 = add v1, v3; goto b1   (v3 defined in b0)
    // b3: return v1
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    let b1 = b.add_block(1);
    let b2 = b.add_block(2);
    let b3 = b.add_block(3);
    let exit = b.add_exit_block(4);
    b.insns(
      b0,
      vec![
        Insn::konst(RegSpec::narrow(0), 0),
        Insn::konst(RegSpec::narrow(3), 1),
        Insn::goto(),
      ],
    );
    b.successors(b0, &[b1], Some(b1));
    b.phi(b1, RegSpec::narrow(1), &[(b0, RegSpec::narrow(0)), (b2, RegSpec::narrow(2))]);
    b.insn(b1, Insn::branch(Opcode::IfEqz, vec![RegSpec::narrow(1)]));
    b.successors(b1, &[b2, b3], Some(b2));
    b.insns(
      b2,
      vec![
        Insn::binop(Opcode::Add, RegSpec::narrow(2), RegSpec::narrow(1), RegSpec::narrow(3)),
        Insn::goto(),
      ],
    );
    b.successors(b2, &[b1], Some(b1));
    b.insn(b3, Insn::ret(Some(RegSpec::narrow(1))));
    b.successors(b3, &[exit], Some(exit));
    let method = b.build().unwrap();
    let liveness = Liveness::from_method(&method);

    // v3 must survive the whole loop; v0 only reaches the phi edge.
    assert_eq!(live(liveness.live_out(b0)), vec![0, 3]);
    assert_eq!(live(liveness.live_in(b1)), vec![3]);
    assert_eq!(live(liveness.live_out(b1)), vec![1, 3]);
    assert_eq!(live(liveness.live_out(b2)), vec![2, 3]);
    assert_eq!(live(liveness.live_in(b3)), vec![1]);
    assert!(liveness.passes() >= 2);
  }
}

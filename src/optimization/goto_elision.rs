use crate::ssa::{SsaBasicBlock, SsaMethod};

fn is_goto_only(block: &SsaBasicBlock) -> bool {
  block.insns().len() == 1 && block.last_insn().map_or(false, |i| i.is_plain_goto())
}

/// Removes every block whose body is a lone `goto`, pointing its
/// predecessors at the goto's target.
///
/// Blocks are visited in depth-first preorder and predecessors are
/// redirected eagerly, so a chain of such blocks collapses in one run.
/// The entry block is kept.
pub(crate) fn elide_gotos(mut method: SsaMethod) -> SsaMethod {
  let mut removed = 0;
  for idx in method.depth_first_order() {
    if idx == method.entry() || !is_goto_only(method.block(idx)) {
      continue;
    }
    let target = match method.block(idx).primary_successor() {
      Some(target) if target != idx => target,
      _ => continue,
    };

    let preds = method
      .block(idx)
      .predecessors()
      .iter()
      .copied()
      .collect::<Vec<_>>();
    for pred in preds {
      method.replace_successor(pred, idx, target);
    }

    let block = method.block_mut(idx);
    block.successors.clear();
    block.primary_successor = None;
    method.block_mut(target).predecessors.remove(&idx);
    log::trace!("elided goto block b{} -> b{}", idx, target);
    removed += 1;
  }

  method.compute_reachability();
  log::debug!("goto elision removed {} blocks", removed);
  method
}

#[cfg(test)]
mod tests {
  use crate::{
    insn::{Insn, Opcode, RegSpec},
    ssa::SsaMethodBuilder,
  };

  use super::*;

  // b0 -> b1(goto b2) -> b2(goto b3) -> b3: return
  fn goto_chain() -> SsaMethod {
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(10);
    let b1 = b.add_block(11);
    let b2 = b.add_block(12);
    let b3 = b.add_block(13);
    let exit = b.add_exit_block(14);
    b.insns(b0, vec![Insn::konst(RegSpec::narrow(0), 1), Insn::goto()]);
    b.successors(b0, &[b1], Some(b1));
    b.insn(b1, Insn::goto());
    b.successors(b1, &[b2], Some(b2));
    b.insn(b2, Insn::goto());
    b.successors(b2, &[b3], Some(b3));
    b.insn(b3, Insn::ret(Some(RegSpec::narrow(0))));
    b.successors(b3, &[exit], Some(exit));
    b.build().unwrap()
  }

  fn reachable(method: &SsaMethod) -> Vec<usize> {
    method
      .blocks()
      .iter()
      .filter(|b| b.is_reachable())
      .map(|b| b.index())
      .collect()
  }

  #[test]
  fn chain_collapses_in_one_run() {
    let method = elide_gotos(goto_chain());
    assert_eq!(method.block(0).successors(), &[3]);
    assert_eq!(method.block(0).primary_successor(), Some(3));
    assert_eq!(method.block(3).predecessors().iter().collect::<Vec<_>>(), vec![&0]);
    assert_eq!(reachable(&method), vec![0, 3, 4]);
  }

  #[test]
  fn second_run_is_a_no_op() {
    let once = elide_gotos(goto_chain());
    let twice = elide_gotos(once.clone());
    for (a, b) in once.blocks().iter().zip(twice.blocks()) {
      assert_eq!(a.successors(), b.successors());
      assert_eq!(a.predecessors(), b.predecessors());
      assert_eq!(a.is_reachable(), b.is_reachable());
    }
  }

  #[test]
  fn branch_targets_are_redirected() {
    // b0: if-eqz -> b1 | b2, b1: goto b2, b2: return
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    let b1 = b.add_block(1);
    let b2 = b.add_block(2);
    b.insns(
      b0,
      vec![
        Insn::konst(RegSpec::narrow(0), 0),
        Insn::branch(Opcode::IfEqz, vec![RegSpec::narrow(0)]),
      ],
    );
    b.successors(b0, &[b1, b2], Some(b1));
    b.insn(b1, Insn::goto());
    b.successors(b1, &[b2], Some(b2));
    b.insn(b2, Insn::ret(None));
    let method = elide_gotos(b.build().unwrap());
    assert_eq!(method.block(0).successors(), &[2, 2]);
    assert_eq!(method.block(0).primary_successor(), Some(2));
    assert!(!method.block(1).is_reachable());
  }

  #[test]
  fn self_loop_is_kept() {
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    let b1 = b.add_block(1);
    b.insn(b0, Insn::goto());
    b.successors(b0, &[b1], Some(b1));
    b.insn(b1, Insn::goto());
    b.successors(b1, &[b1], Some(b1));
    let method = elide_gotos(b.build().unwrap());
    assert_eq!(method.block(0).successors(), &[1]);
    assert!(method.block(1).is_reachable());
  }
}

// phi r <- (p: s) ... => parallel copy group per incoming edge => ordered moves

use std::collections::{BTreeMap, BTreeSet};

use crate::{
  error::{InvariantViolation, ViolationKind},
  insn::{Insn, RegSpec},
  ssa::{SsaBasicBlock, SsaMethod},
  utils::Graph,
};

/// One copy of a group that must behave as if all copies ran at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ParallelMove {
  pub dest: RegSpec,
  pub source: RegSpec,
}

/// Where the moves of one edge go.
enum Placement {
  /// Before the `goto` ending the predecessor.
  BeforeLast(usize),
  /// After the phis of the successor, which has no other predecessor.
  AtBeginning(usize),
}

/// Replaces every phi with moves along its incoming edges.
///
/// All phis of a block read their operands at once on entry, so the moves
/// for one edge form a parallel copy group and are ordered by
/// [`schedule_parallel_moves`].
pub(crate) fn eliminate_phis(mut method: SsaMethod) -> Result<SsaMethod, InvariantViolation> {
  // (phi block, predecessor) -> copies on that edge
  let mut groups: BTreeMap<(usize, usize), Vec<ParallelMove>> = BTreeMap::new();
  for block in method.blocks().iter().filter(|b| b.is_reachable()) {
    if block.phi_count() == 0 {
      continue;
    }
    check_phi_predecessors(&method, block)?;
    for phi in block.phis() {
      for op in &phi.operands {
        if !method.block(op.pred).is_reachable() {
          continue;
        }
        groups
          .entry((block.index(), op.pred))
          .or_default()
          .push(ParallelMove {
            dest: phi.result,
            source: op.source,
          });
      }
    }
  }

  let mut num_moves = 0;
  for ((block, pred), moves) in groups {
    let placement = placement(&method, block, pred)?;
    let insns = schedule_parallel_moves(&mut method, moves);
    method.return_spare_registers();
    num_moves += insns.len();
    match placement {
      Placement::BeforeLast(idx) => method.block_mut(idx).insert_before_last(insns),
      Placement::AtBeginning(idx) => method.block_mut(idx).insert_at_beginning(insns),
    }
  }
  for block in method.blocks.iter_mut() {
    block.remove_all_phis();
  }

  log::debug!(
    "phi elimination inserted {} moves, {} regs",
    num_moves,
    method.reg_count()
  );
  Ok(method)
}

fn reachable_predecessors(method: &SsaMethod, block: &SsaBasicBlock) -> BTreeSet<usize> {
  block
    .predecessors()
    .iter()
    .copied()
    .filter(|p| method.block(*p).is_reachable())
    .collect()
}

/// Every phi names only real predecessors, and covers every reachable one.
fn check_phi_predecessors(method: &SsaMethod, block: &SsaBasicBlock) -> Result<(), InvariantViolation> {
  let reachable = reachable_predecessors(method, block);
  for phi in block.phis() {
    let named = phi.predecessors();
    if !named.is_subset(block.predecessors()) || !reachable.is_subset(&named) {
      log::debug!(
        "phi {} in block {} names {:?}, predecessors are {:?}",
        phi.result,
        block.label(),
        named,
        block.predecessors()
      );
      return Err(InvariantViolation::new(
        block.label(),
        ViolationKind::PhiPredecessorMismatch,
      ));
    }
  }
  Ok(())
}

fn placement(method: &SsaMethod, block: usize, pred: usize) -> Result<Placement, InvariantViolation> {
  let from = method.block(pred);
  if from.last_insn().map_or(false, Insn::is_plain_goto) && from.successors().iter().all(|s| *s == block) {
    return Ok(Placement::BeforeLast(pred));
  }
  let to = method.block(block);
  if reachable_predecessors(method, to).len() == 1 {
    Ok(Placement::AtBeginning(block))
  } else {
    Err(InvariantViolation::new(to.label(), ViolationKind::CriticalEdge))
  }
}

/// Orders a parallel copy group into sequential moves.
///
/// A move may run once no pending move still reads the slots it writes.
/// When every pending move waits on another, one of them has its source
/// parked in a spare register first, which breaks the cycle. Copies onto
/// the same register are dropped.
pub(crate) fn schedule_parallel_moves(method: &mut SsaMethod, moves: Vec<ParallelMove>) -> Vec<Insn> {
  let mut moves = moves
    .into_iter()
    .filter(|m| m.dest.reg() != m.source.reg())
    .collect::<Vec<_>>();

  // x -> y: x reads a slot y writes, so x has to go first
  let mut deps = Graph::new();
  for x in 0..moves.len() {
    deps.add_node(x);
    for y in 0..moves.len() {
      if x != y && moves[x].source.overlaps(&moves[y].dest) {
        deps.add_directed_edge(x, y);
      }
    }
  }

  let mut insns = vec![];
  while !deps.is_empty() {
    if let Some(&x) = deps.sources().first() {
      insns.push(Insn::mov(moves[x].dest, moves[x].source));
      deps.remove_node(x);
      continue;
    }

    let x = deps
      .nodes()
      .copied()
      .find(|x| deps.neighbors(x).map_or(false, |succs| !succs.is_empty()))
      .unwrap_or_else(|| unreachable!("blocked parallel copy without a dependency"));
    let source = moves[x].source;
    let temp = RegSpec(method.borrow_spare_register(source.category()), source.category());
    log::trace!("breaking copy cycle through {}", temp);
    insns.push(Insn::mov(temp, source));
    moves[x].source = temp;
    let succs = deps.neighbors(&x).cloned().unwrap_or_default();
    for y in succs {
      deps.remove_directed_edge(&x, &y);
    }
  }
  insns
}

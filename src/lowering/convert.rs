use crate::{
  error::{InvariantViolation, ViolationKind},
  insn::Branchingness,
  rop::{RopBasicBlock, RopMethod},
  ssa::{SsaBasicBlock, SsaMethod},
};

/// Builds the ROP method from the reachable blocks of a phi-free SSA
/// method. The synthetic exit block is dropped; its predecessors end up
/// with no successors.
pub(crate) fn convert_to_rop(method: &SsaMethod) -> Result<RopMethod, InvariantViolation> {
  if let Some(exit) = method.exit_block() {
    if !exit.insns().is_empty() {
      return Err(InvariantViolation::new(
        exit.label(),
        ViolationKind::NonEmptyExitBlock,
      ));
    }
  }

  let blocks = method
    .blocks()
    .iter()
    .filter(|b| b.is_reachable() && Some(b.index()) != method.exit())
    .map(|b| convert_block(method, b))
    .collect::<Result<Vec<_>, _>>()?;

  let first_label = method.block(method.entry()).label();
  Ok(RopMethod::new(blocks, first_label, method.reg_count()))
}

fn convert_block(method: &SsaMethod, block: &SsaBasicBlock) -> Result<RopBasicBlock, InvariantViolation> {
  let insns = block
    .normal_insns()
    .filter(|i| !i.is_identity_move())
    .cloned()
    .collect::<Vec<_>>();

  let (successors, primary) = match method.exit() {
    Some(exit) if block.successors().contains(&exit) => {
      check_exit_predecessor(block, exit)?;
      (vec![], None)
    }
    _ => (
      block
        .successors()
        .iter()
        .map(|s| method.block(*s).label())
        .collect(),
      block.primary_successor().map(|s| method.block(s).label()),
    ),
  };

  Ok(RopBasicBlock::new(block.label(), insns, successors, primary))
}

/// A block flowing into the exit must go nowhere else and must end the
/// method.
fn check_exit_predecessor(block: &SsaBasicBlock, exit: usize) -> Result<(), InvariantViolation> {
  if block.successors().iter().any(|s| *s != exit) {
    return Err(InvariantViolation::new(
      block.label(),
      ViolationKind::ExitPredecessorHasOtherSuccessors,
    ));
  }
  match block.last_insn().map(|i| i.branchingness()) {
    Some(Branchingness::Return) | Some(Branchingness::Throw) => Ok(()),
    _ => Err(InvariantViolation::new(
      block.label(),
      ViolationKind::ExitPredecessorMissingTerminator,
    )),
  }
}

#[cfg(test)]
mod tests {
  use crate::{
    insn::{Insn, Opcode, RegSpec},
    ssa::SsaMethodBuilder,
  };

  use super::*;

  #[test]
  fn return_into_exit_passes() {
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(3);
    let b1 = b.add_block(4);
    let unreachable = b.add_block(5);
    let exit = b.add_exit_block(6);
    b.insns(
      b0,
      vec![
        Insn::konst(RegSpec::narrow(0), 1),
        Insn::mov(RegSpec::narrow(0), RegSpec::narrow(0)),
        Insn::goto(),
      ],
    );
    b.successors(b0, &[b1], Some(b1));
    b.insn(b1, Insn::ret(Some(RegSpec::narrow(0))));
    b.successors(b1, &[exit], Some(exit));
    b.insn(unreachable, Insn::ret(None));
    let rop = convert_to_rop(&b.build().unwrap()).unwrap();

    assert_eq!(rop.first_label(), 3);
    assert_eq!(rop.blocks().len(), 2);
    let head = rop.block_for_label(3).unwrap();
    assert_eq!(head.insns().len(), 2);
    assert_eq!(head.successors(), &[4]);
    assert_eq!(head.primary_successor(), Some(4));
    let tail = rop.block_for_label(4).unwrap();
    assert!(tail.successors().is_empty());
    assert_eq!(tail.primary_successor(), None);
    assert_eq!(rop.exit_predecessors(), vec![4]);
  }

  #[test]
  fn exit_with_another_successor_is_rejected() {
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    let b1 = b.add_block(1);
    let exit = b.add_exit_block(2);
    b.insns(
      b0,
      vec![
        Insn::konst(RegSpec::narrow(0), 1),
        Insn::branch(Opcode::IfEqz, vec![RegSpec::narrow(0)]),
      ],
    );
    b.successors(b0, &[exit, b1], Some(b1));
    b.insn(b1, Insn::ret(None));
    b.successors(b1, &[exit], Some(exit));
    let err = convert_to_rop(&b.build().unwrap()).unwrap_err();
    assert_eq!(
      err,
      InvariantViolation::new(0, ViolationKind::ExitPredecessorHasOtherSuccessors)
    );
  }

  #[test]
  fn exit_predecessor_must_return_or_throw() {
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    let exit = b.add_exit_block(1);
    b.insn(b0, Insn::goto());
    b.successors(b0, &[exit], Some(exit));
    let err = convert_to_rop(&b.build().unwrap()).unwrap_err();
    assert_eq!(err.kind, ViolationKind::ExitPredecessorMissingTerminator);

    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    let exit = b.add_exit_block(1);
    b.insns(b0, vec![Insn::konst(RegSpec::narrow(0), 1), Insn::throw(RegSpec::narrow(0))]);
    b.successors(b0, &[exit], Some(exit));
    assert!(convert_to_rop(&b.build().unwrap()).is_ok());
  }

  #[test]
  fn exit_block_must_be_empty() {
    let mut b = SsaMethodBuilder::new(0);
    let b0 = b.add_block(0);
    let exit = b.add_exit_block(9);
    b.insn(b0, Insn::ret(None));
    b.successors(b0, &[exit], Some(exit));
    b.insn(exit, Insn::new(Opcode::Nop, None, vec![]));
    let err = convert_to_rop(&b.build().unwrap()).unwrap_err();
    assert_eq!(err, InvariantViolation::new(9, ViolationKind::NonEmptyExitBlock));
  }
}

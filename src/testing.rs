//! Shared fixtures for the unit tests.

use crate::{
  insn::{Insn, Opcode, RegSpec},
  ssa::{SsaMethod, SsaMethodBuilder},
};

pub(crate) fn init_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

/// Executes the `move` instructions of `insns` on a register file. A wide
/// move copies both slots.
pub(crate) fn run_moves(regs: &mut [i64], insns: &[Insn]) {
  for insn in insns.iter().filter(|i| i.opcode == Opcode::Move) {
    let (dest, src) = (insn.result.unwrap(), insn.sources[0]);
    let values = (0..src.width())
      .map(|slot| regs[(src.reg() + slot) as usize])
      .collect::<Vec<_>>();
    for (slot, value) in values.into_iter().enumerate() {
      regs[dest.reg() as usize + slot] = value;
    }
  }
}

/// One block using registers below `reg_count`; spare registers start at
/// `reg_count`.
pub(crate) fn empty_method(reg_count: u32) -> SsaMethod {
  let mut b = SsaMethodBuilder::new(0);
  let b0 = b.add_block(0);
  b.insns(
    b0,
    vec![
      Insn::konst(RegSpec::narrow(reg_count - 1), 0),
      Insn::ret(None),
    ],
  );
  b.build().unwrap()
}

/// v0 live over insns 1-5, v1 over 2-4, v2 over 3-6:
///
/// ```text
/// v0 = const 1
/// v1 = const 2
/// v2 = const 3
/// v3 = add v1, v2
/// v4 = add v0, v3
/// v5 = add v2, v4
/// return v5
/// ```
pub(crate) fn three_overlapping_registers() -> SsaMethod {
  let r = RegSpec::narrow;
  let mut b = SsaMethodBuilder::new(0);
  let b0 = b.add_block(0);
  let exit = b.add_exit_block(1);
  b.insns(
    b0,
    vec![
      Insn::konst(r(0), 1),
      Insn::konst(r(1), 2),
      Insn::konst(r(2), 3),
      Insn::binop(Opcode::Add, r(3), r(1), r(2)),
      Insn::binop(Opcode::Add, r(4), r(0), r(3)),
      Insn::binop(Opcode::Add, r(5), r(2), r(4)),
      Insn::ret(Some(r(5))),
    ],
  );
  b.successors(b0, &[exit], Some(exit));
  b.build().unwrap()
}

/// Phi results of [`swap_loop`].
pub(crate) const SWAP_PHI_RESULTS: (u32, u32) = (2, 3);

/// A loop whose two phis swap their values on every back edge:
///
/// ```text
/// b0: v0 = const 1; v1 = const 2; goto b1
/// b1: v2 = phi(b0: v0, b2: v3); v3 = phi(b0: v1, b2: v2); if-eqz v2 -> b2 | b3
/// b2: goto b1
/// b3: return v3
/// ```
pub(crate) fn swap_loop() -> SsaMethod {
  let r = RegSpec::narrow;
  let mut b = SsaMethodBuilder::new(0);
  let b0 = b.add_block(0);
  let b1 = b.add_block(1);
  let b2 = b.add_block(2);
  let b3 = b.add_block(3);
  let exit = b.add_exit_block(4);
  b.insns(b0, vec![Insn::konst(r(0), 1), Insn::konst(r(1), 2), Insn::goto()]);
  b.successors(b0, &[b1], Some(b1));
  b.phi(b1, r(2), &[(b0, r(0)), (b2, r(3))]);
  b.phi(b1, r(3), &[(b0, r(1)), (b2, r(2))]);
  b.insn(b1, Insn::branch(Opcode::IfEqz, vec![r(2)]));
  b.successors(b1, &[b2, b3], Some(b2));
  b.insn(b2, Insn::goto());
  b.successors(b2, &[b1], Some(b1));
  b.insn(b3, Insn::ret(Some(r(3))));
  b.successors(b3, &[exit], Some(exit));
  b.build().unwrap()
}

/// [`swap_loop`] after allocation: both phis live in the registers they
/// read, so the entry edge needs no copies and the back edge is a swap.
pub(crate) fn physical_swap_loop() -> SsaMethod {
  let r = RegSpec::narrow;
  let mut b = SsaMethodBuilder::new(0);
  let b0 = b.add_block(0);
  let b1 = b.add_block(1);
  let b2 = b.add_block(2);
  let b3 = b.add_block(3);
  b.insn(b0, Insn::goto());
  b.successors(b0, &[b1], Some(b1));
  b.phi(b1, r(0), &[(b0, r(0)), (b2, r(1))]);
  b.phi(b1, r(1), &[(b0, r(1)), (b2, r(0))]);
  b.insn(b1, Insn::branch(Opcode::IfEqz, vec![r(0)]));
  b.successors(b1, &[b2, b3], Some(b2));
  b.insn(b2, Insn::goto());
  b.successors(b2, &[b1], Some(b1));
  b.insn(b3, Insn::ret(Some(r(1))));
  b.build().unwrap()
}

/// Registers `(source, copy)` of [`local_copy`].
pub(crate) const LOCAL_COPY_REGS: (u32, u32) = (1, 2);

/// ```text
/// v0 = const 1
/// v1 = const 2
/// invoke v0
/// v2 = move v1
/// return v2
/// ```
pub(crate) fn local_copy() -> SsaMethod {
  let r = RegSpec::narrow;
  let mut b = SsaMethodBuilder::new(0);
  let b0 = b.add_block(0);
  b.insns(
    b0,
    vec![
      Insn::konst(r(0), 1),
      Insn::konst(r(1), 2),
      Insn::new(Opcode::Invoke, None, vec![r(0)]),
      Insn::mov(r(2), r(1)),
      Insn::ret(Some(r(2))),
    ],
  );
  b.build().unwrap()
}

/// Two parameters, received in reverse order:
///
/// ```text
/// v0 = move-param #1
/// v1 = move-param #0
/// v2 = add v0, v1
/// v3 = move v2
/// return v3
/// ```
pub(crate) fn two_params() -> SsaMethod {
  let r = RegSpec::narrow;
  let mut b = SsaMethodBuilder::new(2);
  let b0 = b.add_block(0);
  let exit = b.add_exit_block(1);
  b.insns(
    b0,
    vec![
      Insn::param(r(0), 1),
      Insn::param(r(1), 0),
      Insn::binop(Opcode::Add, r(2), r(0), r(1)),
      Insn::mov(r(3), r(2)),
      Insn::ret(Some(r(3))),
    ],
  );
  b.successors(b0, &[exit], Some(exit));
  b.build().unwrap()
}

/// A branch whose arms only jump to the join block:
///
/// ```text
/// b0: v0 = const 0; if-eqz v0 -> b1 | b2
/// b1: goto b3
/// b2: goto b3
/// b3: return v0
/// ```
pub(crate) fn goto_diamond() -> SsaMethod {
  let r = RegSpec::narrow;
  let mut b = SsaMethodBuilder::new(0);
  let b0 = b.add_block(0);
  let b1 = b.add_block(1);
  let b2 = b.add_block(2);
  let b3 = b.add_block(3);
  let exit = b.add_exit_block(4);
  b.insns(
    b0,
    vec![
      Insn::konst(r(0), 0),
      Insn::branch(Opcode::IfEqz, vec![r(0)]),
    ],
  );
  b.successors(b0, &[b1, b2], Some(b1));
  b.insn(b1, Insn::goto());
  b.successors(b1, &[b3], Some(b3));
  b.insn(b2, Insn::goto());
  b.successors(b2, &[b3], Some(b3));
  b.insn(b3, Insn::ret(Some(r(0))));
  b.successors(b3, &[exit], Some(exit));
  b.build().unwrap()
}

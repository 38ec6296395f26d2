use std::collections::BTreeSet;
use std::fmt::{Display, Error, Formatter};

use enum_as_inner::EnumAsInner;

use crate::insn::{Insn, RegSpec};

/// One incoming value of a phi: the source register read when control
/// arrives from block `pred`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhiOperand {
  pub pred: usize,
  pub source: RegSpec,
}

/// SSA phi. Operands are keyed by predecessor block index, never by
/// position, since predecessor order is not stable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhiInsn {
  pub result: RegSpec,
  pub operands: Vec<PhiOperand>,
}

impl PhiInsn {
  pub fn new(result: RegSpec) -> Self {
    PhiInsn {
      result,
      operands: vec![],
    }
  }

  pub fn add_operand(&mut self, pred: usize, source: RegSpec) {
    self.operands.push(PhiOperand { pred, source });
  }

  pub fn source_for(&self, pred: usize) -> Option<RegSpec> {
    self
      .operands
      .iter()
      .find(|op| op.pred == pred)
      .map(|op| op.source)
  }

  pub fn predecessors(&self) -> BTreeSet<usize> {
    self.operands.iter().map(|op| op.pred).collect()
  }
}

/// An SSA instruction: a phi, or a normal instruction.
#[derive(Debug, Clone, PartialEq, Eq, EnumAsInner)]
pub enum SsaInsn {
  Phi(PhiInsn),
  Normal(Insn),
}

impl SsaInsn {
  pub fn result(&self) -> Option<RegSpec> {
    match self {
      SsaInsn::Phi(phi) => Some(phi.result),
      SsaInsn::Normal(insn) => insn.result,
    }
  }

  pub fn sources(&self) -> Vec<RegSpec> {
    match self {
      SsaInsn::Phi(phi) => phi.operands.iter().map(|op| op.source).collect(),
      SsaInsn::Normal(insn) => insn.sources.clone(),
    }
  }

  pub fn map_registers(&mut self, mut f: impl FnMut(RegSpec) -> RegSpec) {
    match self {
      SsaInsn::Phi(phi) => {
        phi.result = f(phi.result);
        for op in phi.operands.iter_mut() {
          op.source = f(op.source);
        }
      }
      SsaInsn::Normal(insn) => insn.map_registers(f),
    }
  }
}

impl Display for SsaInsn {
  fn fmt(&self, fmt: &mut Formatter) -> Result<(), Error> {
    match self {
      SsaInsn::Phi(phi) => {
        write!(fmt, "{} <- phi", phi.result)?;
        for (i, op) in phi.operands.iter().enumerate() {
          let sep = if i == 0 { " " } else { ", " };
          write!(fmt, "{}[b{}: {}]", sep, op.pred, op.source)?;
        }
        Ok(())
      }
      SsaInsn::Normal(insn) => write!(fmt, "{}", insn),
    }
  }
}

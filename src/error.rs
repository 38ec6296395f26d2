//! Fatal lowering errors.
//!
//! Lowering has exactly one error class: an upstream invariant the SSA
//! method was supposed to satisfy does not hold. These are defects in SSA
//! construction, never user input errors, and they abort the method.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ViolationKind {
  #[error("exit block must have no instructions")]
  NonEmptyExitBlock,
  #[error("exit predecessor must have no other successors")]
  ExitPredecessorHasOtherSuccessors,
  #[error("exit predecessor must end in a return or throw")]
  ExitPredecessorMissingTerminator,
  #[error("phi operands do not match the block's predecessors")]
  PhiPredecessorMismatch,
  #[error("phi move cannot be placed on a critical edge")]
  CriticalEdge,
}

/// An internal invariant violation, tagged with the offending block label.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("internal invariant violated in block {label}: {kind}")]
pub struct InvariantViolation {
  pub label: u32,
  pub kind: ViolationKind,
}

impl InvariantViolation {
  pub fn new(label: u32, kind: ViolationKind) -> Self {
    InvariantViolation { label, kind }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn message_names_the_block() {
    let err = InvariantViolation::new(12, ViolationKind::NonEmptyExitBlock);
    assert_eq!(
      err.to_string(),
      "internal invariant violated in block 12: exit block must have no instructions"
    );
  }
}

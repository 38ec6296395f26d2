use crate::insn::Insn;

/// A basic block of a lowered method, addressed by label.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RopBasicBlock {
  label: u32,
  insns: Vec<Insn>,
  successors: Vec<u32>,
  primary_successor: Option<u32>,
}

impl RopBasicBlock {
  pub fn new(
    label: u32,
    insns: Vec<Insn>,
    successors: Vec<u32>,
    primary_successor: Option<u32>,
  ) -> Self {
    RopBasicBlock {
      label,
      insns,
      successors,
      primary_successor,
    }
  }

  pub fn label(&self) -> u32 {
    self.label
  }

  pub fn insns(&self) -> &[Insn] {
    &self.insns
  }

  pub fn last_insn(&self) -> Option<&Insn> {
    self.insns.last()
  }

  pub fn successors(&self) -> &[u32] {
    &self.successors
  }

  pub fn primary_successor(&self) -> Option<u32> {
    self.primary_successor
  }

  /// Copy of this block with every edge to `old` pointing at `new`.
  pub(crate) fn with_successor_replaced(&self, old: u32, new: u32) -> Self {
    let replace = |l: u32| if l == old { new } else { l };
    RopBasicBlock {
      label: self.label,
      insns: self.insns.clone(),
      successors: self.successors.iter().map(|s| replace(*s)).collect(),
      primary_successor: self.primary_successor.map(replace),
    }
  }
}

impl std::fmt::Display for RopBasicBlock {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    writeln!(f, "block {}", self.label)?;
    for insn in &self.insns {
      writeln!(f, "\t{}", insn)?;
    }
    if !self.successors.is_empty() {
      let succs = self
        .successors
        .iter()
        .map(|s| {
          if Some(*s) == self.primary_successor {
            format!("{}*", s)
          } else {
            s.to_string()
          }
        })
        .collect::<Vec<_>>();
      writeln!(f, "\tsuccs: {}", succs.join(", "))?;
    }
    Ok(())
  }
}

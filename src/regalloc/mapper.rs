use crate::insn::RegSpec;

/// Old register number -> new register (number and category).
///
/// Built incrementally by an allocator, then applied uniformly to every
/// operand of a method. The new register count covers every slot a mapped
/// register occupies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RegisterMapper {
  old_to_new: Vec<Option<RegSpec>>,
  new_reg_count: u32,
}

impl RegisterMapper {
  pub fn new(old_reg_count: u32) -> Self {
    RegisterMapper {
      old_to_new: vec![None; old_reg_count as usize],
      new_reg_count: 0,
    }
  }

  pub fn add_mapping(&mut self, old: u32, new: RegSpec) {
    let idx = old as usize;
    if idx >= self.old_to_new.len() {
      self.old_to_new.resize(idx + 1, None);
    }
    self.old_to_new[idx] = Some(new);
    self.new_reg_count = self.new_reg_count.max(new.reg() + new.width());
  }

  pub fn get(&self, old: u32) -> Option<RegSpec> {
    self.old_to_new.get(old as usize).copied().flatten()
  }

  /// Maps `spec` to its new register, keeping its category.
  pub fn map(&self, spec: RegSpec) -> RegSpec {
    match self.get(spec.reg()) {
      Some(new) => spec.with_reg(new.reg()),
      None => panic!("no mapping specified for register {}", spec),
    }
  }

  pub fn old_reg_count(&self) -> u32 {
    self.old_to_new.len() as u32
  }

  /// Widens the new frame to at least `count` slots.
  pub fn reserve_slots(&mut self, count: u32) {
    self.new_reg_count = self.new_reg_count.max(count);
  }

  pub fn new_reg_count(&self) -> u32 {
    self.new_reg_count
  }

  /// `(old, new)` pairs in ascending old-register order.
  pub fn iter(&self) -> impl Iterator<Item = (u32, RegSpec)> + '_ {
    self
      .old_to_new
      .iter()
      .enumerate()
      .filter_map(|(old, new)| new.map(|n| (old as u32, n)))
  }
}

use serde::{Deserialize, Serialize};
use strum_macros::AsRefStr;

use crate::{
  insn::{Category, RegSpec},
  ssa::SsaMethod,
  utils::BitVector,
};

use super::{coalesce::local_copies, InterferenceGraph, RegisterMapper};

/// The register allocation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum AllocatorKind {
  /// Register `n` goes to slot `2n`; nothing is shared.
  Null,
  /// Greedy first-fit in definition order.
  FirstFit,
  /// First-fit, also giving same-block copies their source's slot.
  FirstFitLocalCombining,
}

impl AllocatorKind {
  pub fn for_flags(minimize_registers: bool) -> Self {
    if minimize_registers {
      AllocatorKind::FirstFitLocalCombining
    } else {
      AllocatorKind::FirstFit
    }
  }

  /// Whether the result of this allocator needs the parameter slots moved
  /// to the top of the frame.
  pub fn wants_params_moved_high(self) -> bool {
    !matches!(self, AllocatorKind::Null)
  }

  pub fn allocate(self, method: &SsaMethod, igraph: &InterferenceGraph) -> RegisterMapper {
    Allocator::new(self, method, igraph).allocate()
  }
}

/// The allocator maps the SSA registers of one method onto physical slots.
pub struct Allocator<'a> {
  kind: AllocatorKind,
  pub(crate) method: &'a SsaMethod,
  igraph: &'a InterferenceGraph,
  /// The category of each SSA register.
  categories: Vec<Category>,
  /// The mapping built so far.
  pub(crate) mapper: RegisterMapper,
  /// Number of registers that were given their copy source's slot.
  num_combined: usize,
}

impl<'a> Allocator<'a> {
  pub fn new(kind: AllocatorKind, method: &'a SsaMethod, igraph: &'a InterferenceGraph) -> Self {
    Allocator {
      kind,
      method,
      igraph,
      categories: method.register_categories(),
      mapper: RegisterMapper::new(method.reg_count()),
      num_combined: 0,
    }
  }

  pub fn allocate(mut self) -> RegisterMapper {
    match self.kind {
      AllocatorKind::Null => self.allocate_null(),
      AllocatorKind::FirstFit => self.allocate_first_fit(false),
      AllocatorKind::FirstFitLocalCombining => self.allocate_first_fit(true),
    }
    log::debug!(
      "{} allocator: {} regs -> {} slots, {} combined",
      self.kind.as_ref(),
      self.method.reg_count(),
      self.mapper.new_reg_count(),
      self.num_combined
    );
    self.mapper
  }

  fn allocate_null(&mut self) {
    for reg in 0..self.method.reg_count() {
      let category = self.categories[reg as usize];
      self.mapper.add_mapping(reg, RegSpec(reg * 2, category));
    }
  }

  /// Implements the greedy coloring.
  ///
  /// For each register in definition order, we collect the slots held by
  /// its already assigned neighbors and give it the lowest free run of
  /// slots wide enough for its category.
  fn allocate_first_fit(&mut self, combine: bool) {
    self.preslot_params();
    // unused parameters still own their slots
    self.mapper.reserve_slots(self.method.param_width());
    let copies = if combine {
      local_copies(self.method)
    } else {
      Default::default()
    };

    for reg in self.method.definition_order() {
      if self.mapper.get(reg).is_some() {
        continue;
      }
      let category = self.categories[reg as usize];
      let occupied = self.occupied_slots(reg);
      if let Some(&source) = copies.get(&reg) {
        if self.try_combine(reg, source, &occupied) {
          continue;
        }
      }
      let slot = first_fit(&occupied, category.width());
      log::trace!("v{} -> slot {}", reg, slot);
      self.mapper.add_mapping(reg, RegSpec(slot, category));
    }
  }

  /// Slots `reg` may not take: the parameter range and every slot of an
  /// assigned interfering register.
  fn occupied_slots(&self, reg: u32) -> BitVector {
    let param_width = self.method.param_width();
    let capacity = self.mapper.new_reg_count().max(param_width) as usize;
    let mut occupied = BitVector::new(capacity);
    for slot in 0..param_width {
      occupied.set(slot as usize);
    }
    for neighbor in self.igraph.neighbors(reg).iter() {
      if let Some(spec) = self.mapper.get(neighbor as u32) {
        for slot in spec.reg()..spec.reg() + spec.width() {
          occupied.set(slot as usize);
        }
      }
    }
    occupied
  }

  /// Gives `reg` the slot of the copy source it is defined from, if they
  /// do not interfere and the slot is free.
  fn try_combine(&mut self, reg: u32, source: u32, occupied: &BitVector) -> bool {
    let category = self.categories[reg as usize];
    if self.igraph.interferes(reg, source) || self.categories[source as usize] != category {
      return false;
    }
    let slot = match self.mapper.get(source) {
      Some(spec) => spec.reg(),
      None => return false,
    };
    if occupied.any_in_range(slot as usize, category.width() as usize) {
      return false;
    }
    log::trace!("v{} combined with v{} in slot {}", reg, source, slot);
    self.mapper.add_mapping(reg, RegSpec(slot, category));
    self.num_combined += 1;
    true
  }
}

/// Lowest slot starting a run of `width` slots all clear in `occupied`.
fn first_fit(occupied: &BitVector, width: u32) -> u32 {
  let width = width as usize;
  let mut slot = 0;
  while let Some(taken) = occupied.next_set_bit(slot) {
    if taken >= slot + width {
      break;
    }
    slot = taken + 1;
  }
  slot as u32
}

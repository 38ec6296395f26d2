// Placement of incoming parameters: pinned to the low slots while
// allocating, moved to the top of the frame afterwards.
use crate::insn::{Opcode, RegSpec};

use super::{Allocator, RegisterMapper};

impl<'a> Allocator<'a> {
  /// Maps each `move-param` result in the entry block to the slot equal to
  /// its parameter offset.
  pub(crate) fn preslot_params(&mut self) {
    let entry = self.method.block(self.method.entry());
    for insn in entry.normal_insns() {
      if insn.opcode != Opcode::MoveParam {
        continue;
      }
      if let (Some(result), Some(offset)) = (insn.result, insn.literal) {
        self
          .mapper
          .add_mapping(result.reg(), result.with_reg(offset as u32));
      }
    }
  }
}

/// Renumbering that moves the low `param_width` slots to the top of a
/// `reg_count`-slot frame and shifts everything else down. The frame is
/// never narrower than the parameters.
pub fn params_to_top(param_width: u32, reg_count: u32) -> RegisterMapper {
  let reg_count = reg_count.max(param_width);
  let mut mapper = RegisterMapper::new(reg_count);
  for reg in 0..reg_count {
    let new = if reg >= param_width {
      reg - param_width
    } else {
      reg + (reg_count - param_width)
    };
    mapper.add_mapping(reg, RegSpec::narrow(new));
  }
  mapper
}

//! SSA to ROP lowering
//!   Allocates physical registers for an SSA method, removes its phis and
//!   simplifies its control flow, producing the register-based form handed
//!   to the bytecode emitter.

pub mod config;
pub mod error;
pub mod insn;
pub mod lowering;
mod optimization;
pub mod regalloc;
pub mod rop;
pub mod ssa;
#[cfg(test)]
mod testing;
pub mod utils;

use lazy_static::lazy_static;

pub use config::LoweringConfig;
pub use error::{InvariantViolation, ViolationKind};
pub use lowering::{lower, lower_methods, lower_with_config, Stage};
pub use rop::{RopBasicBlock, RopMethod};
pub use ssa::{SsaMethod, SsaMethodBuilder};

lazy_static! {
  /// Options used by [`lower`], read once per process. Never mutated, so
  /// concurrent lowerings share it freely.
  pub static ref DEFAULT_CONFIG: LoweringConfig = LoweringConfig::from_config();
}

//! ROP form: the register-based output of lowering, over physical
//! registers, with blocks and edges addressed by label.

mod block;
mod method;

pub use block::RopBasicBlock;
pub use method::RopMethod;

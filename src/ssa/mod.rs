//! SSA form of a method body: the input of lowering.
//!
//! The method and its blocks are rewritten in place by the lowering stages
//! (register renumbering, phi removal, move insertion, goto elision), each
//! stage taking the method by value and handing it to the next.

mod block;
mod builder;
mod insn;
mod method;

pub use block::SsaBasicBlock;
pub use builder::SsaMethodBuilder;
pub use insn::{PhiInsn, PhiOperand, SsaInsn};
pub use method::SsaMethod;

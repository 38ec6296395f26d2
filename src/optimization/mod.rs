//! CFG simplification passes
//!   - Goto elision: runs on the SSA method after phi elimination, removes
//!     blocks that only jump elsewhere.
//!
//!   - Identical block merging: runs on the ROP method, folds sibling blocks
//!     with equal bodies into one. Must run after goto elision, which can
//!     expose new duplicates.

mod goto_elision;
mod identical_blocks;

pub(crate) use goto_elision::elide_gotos;
pub(crate) use identical_blocks::merge_identical_blocks;

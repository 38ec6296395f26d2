mod bitvec;
pub use bitvec::BitVector;
mod graph;
pub use graph::Graph;

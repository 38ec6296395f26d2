// The module computes liveness and the interference graph of an SSA method,
// and maps its registers onto physical slots
mod allocation;
mod coalesce;
mod interference;
mod liveness;
mod mapper;
mod params;

pub use allocation::{Allocator, AllocatorKind};
pub use interference::InterferenceGraph;
pub use liveness::{debug_show_liveness, Liveness};
pub use mapper::RegisterMapper;
pub use params::params_to_top;

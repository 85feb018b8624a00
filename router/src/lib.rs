pub mod astar;
pub mod decompose;
pub mod grid;
pub mod order;
pub mod partition;
pub mod place;
pub mod rrr;

pub use grid::EdgeGrid;
pub use rrr::{CancelToken, SolveStats, Solver};

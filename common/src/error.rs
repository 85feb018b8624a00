use crate::geom::point::Point;
use thiserror::Error;

// A codec error is a caller bug (decomposer or neighbor generation), not
// bad input data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("points {p1} and {p2} are not grid-adjacent")]
    InvalidEdge { p1: Point, p2: Point },
}

// Fatal at load time, before any routing begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InstanceError {
    #[error("grid dimensions must be positive, got {gx}x{gy}")]
    BadGrid { gx: i32, gy: i32 },

    #[error("net n{found} declared at position {expected}: net ids must be dense and 0-based")]
    NonDenseNetIds { expected: usize, found: u32 },

    #[error("net n{net}: pin {pin} lies outside the {gx}x{gy} grid")]
    PinOutOfBounds { net: u32, pin: Point, gx: i32, gy: i32 },
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Codec(#[from] CodecError),

    // Only reachable under the capacity-bounded cost model on a grid that
    // is disconnected even with the violation bound fully relaxed.
    #[error("no path between {p1} and {p2}: grid is disconnected")]
    Unroutable { p1: Point, p2: Point },
}

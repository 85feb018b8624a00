pub mod bounds;
pub mod edge;
pub mod point;

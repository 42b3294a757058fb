pub mod compliance;
pub mod feasibility;
pub mod reconstruction;
pub mod redistribution;
pub mod window;

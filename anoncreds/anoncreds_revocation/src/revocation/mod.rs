pub mod delta;
pub mod registry;
pub mod shared;
pub mod state;

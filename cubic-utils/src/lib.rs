//! # Cubic Utils
//!
//! Coordinate types and the small helpers every other cubic crate leans on.
pub mod address;
pub mod coords;
pub mod math;
mod range;
mod types;

pub use address::{AddressError, ColumnAddress, CubeAddress};
pub use range::CubeRange;
pub use types::{BlockPos, BlockStateId, ColumnPos, CubePos, LocalPos};

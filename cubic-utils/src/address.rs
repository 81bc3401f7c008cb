//! Packed 64-bit addresses for cubes and columns.
//!
//! Layout of a cube address, most significant bit first:
//!
//! ```text
//!  63            42 41            20 19          0
//! +----------------+----------------+-------------+
//! |   x (22 bits)  |   z (22 bits)  | y (20 bits) |
//! +----------------+----------------+-------------+
//! ```
//!
//! Every field is stored offset-binary (`value + 2^(bits - 1)`), so comparing
//! two addresses as unsigned integers orders them by x, then z, then y. All
//! cubes of one column therefore form a single contiguous address range, and
//! a column address is exactly the upper 44 bits of any of its cube addresses.

use std::fmt::{self, Display};
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::types::{ColumnPos, CubePos};

const X_BITS: u32 = 22;
const Z_BITS: u32 = 22;
const Y_BITS: u32 = 20;

const Y_SHIFT: u32 = 0;
const Z_SHIFT: u32 = Y_BITS;
const X_SHIFT: u32 = Y_BITS + Z_BITS;

/// Smallest addressable cube x or z coordinate.
pub const MIN_HORIZONTAL: i32 = -(1 << (X_BITS - 1));
/// Largest addressable cube x or z coordinate.
pub const MAX_HORIZONTAL: i32 = (1 << (X_BITS - 1)) - 1;
/// Smallest addressable cube y coordinate.
pub const MIN_VERTICAL: i32 = -(1 << (Y_BITS - 1));
/// Largest addressable cube y coordinate.
pub const MAX_VERTICAL: i32 = (1 << (Y_BITS - 1)) - 1;

/// An axis of a cube coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// East/west.
    X,
    /// Up/down.
    Y,
    /// North/south.
    Z,
}

impl Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Axis::X => "x",
            Axis::Y => "y",
            Axis::Z => "z",
        })
    }
}

/// Errors produced while packing coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AddressError {
    /// A coordinate does not fit in its field.
    #[error("cube {axis} coordinate {value} is outside the addressable range {min}..={max}")]
    OutOfRange {
        /// The offending axis.
        axis: Axis,
        /// The rejected value.
        value: i32,
        /// Lowest accepted value.
        min: i32,
        /// Highest accepted value.
        max: i32,
    },
}

/// A packed cube address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CubeAddress(u64);

/// A packed column address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnAddress(u64);

fn pack(axis: Axis, value: i32, bits: u32) -> Result<u64, AddressError> {
    let min = -(1 << (bits - 1));
    let max = (1 << (bits - 1)) - 1;
    if !(min..=max).contains(&value) {
        return Err(AddressError::OutOfRange {
            axis,
            value,
            min,
            max,
        });
    }
    Ok((i64::from(value) - i64::from(min)) as u64)
}

fn unpack(raw: u64, shift: u32, bits: u32) -> i32 {
    let field = (raw >> shift) & ((1 << bits) - 1);
    (field as i64 - (1i64 << (bits - 1))) as i32
}

impl CubeAddress {
    /// Packs a cube position.
    pub fn encode(pos: CubePos) -> Result<Self, AddressError> {
        let x = pack(Axis::X, pos.x(), X_BITS)?;
        let y = pack(Axis::Y, pos.y(), Y_BITS)?;
        let z = pack(Axis::Z, pos.z(), Z_BITS)?;
        Ok(Self((x << X_SHIFT) | (z << Z_SHIFT) | (y << Y_SHIFT)))
    }

    /// Unpacks the cube position.
    #[must_use]
    pub fn decode(self) -> CubePos {
        CubePos::new(
            unpack(self.0, X_SHIFT, X_BITS),
            unpack(self.0, Y_SHIFT, Y_BITS),
            unpack(self.0, Z_SHIFT, Z_BITS),
        )
    }

    /// The address of the column holding this cube.
    #[must_use]
    pub const fn column(self) -> ColumnAddress {
        ColumnAddress(self.0 >> Z_SHIFT)
    }

    /// The raw packed value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Wraps an already packed value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

impl ColumnAddress {
    /// Packs a column position.
    pub fn encode(pos: ColumnPos) -> Result<Self, AddressError> {
        let x = pack(Axis::X, pos.x(), X_BITS)?;
        let z = pack(Axis::Z, pos.z(), Z_BITS)?;
        Ok(Self((x << Z_BITS) | z))
    }

    /// Unpacks the column position.
    #[must_use]
    pub fn decode(self) -> ColumnPos {
        ColumnPos::new(
            unpack(self.0, Z_BITS, X_BITS),
            unpack(self.0, 0, Z_BITS),
        )
    }

    /// The inclusive range of cube addresses inside this column.
    #[must_use]
    pub const fn cube_range(self) -> RangeInclusive<CubeAddress> {
        let base = self.0 << Z_SHIFT;
        CubeAddress(base)..=CubeAddress(base | ((1 << Y_BITS) - 1))
    }

    /// The raw packed value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Wraps an already packed value.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

//! Small fixed-size vectors used by the position wrappers.
pub mod vector2;
pub mod vector3;

//! Geometry utilities shared by the move and energy kernels.

pub mod geometry;

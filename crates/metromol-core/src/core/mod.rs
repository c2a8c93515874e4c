//! # Core Module
//!
//! The stateless foundation of the engine: the simulation-box data model,
//! the pure pair-potential math, and the periodic-boundary geometry kernels.
//!
//! ## Architecture
//!
//! - **Simulation State** ([`models`]) - Structure-of-arrays storage for
//!   atoms, molecules, bonds, angles, and exclusion topology, plus the
//!   builder that external loaders use to assemble it
//! - **Energy Math** ([`forcefield`]) - Lennard-Jones and Coulomb pair
//!   potentials with geometric-mean parameter blending, and the decomposed
//!   energy term type
//! - **Geometry** ([`utils`]) - Minimum-image periodic distances and the
//!   translation/rotation kernels moves are built from

pub mod forcefield;
pub mod models;
pub mod utils;

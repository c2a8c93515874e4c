//! Pair-potential math for the classical force field.
//!
//! Energies are in kcal/mol with distances in Å. The potentials here are the
//! leaf functions of every energy sum in the engine: Lennard-Jones 12-6 with
//! per-pair geometric-mean blending, and Coulomb electrostatics.

pub mod potentials;
pub mod term;

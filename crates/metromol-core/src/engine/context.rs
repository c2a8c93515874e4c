//! The intermolecular pair-sweep seam.
//!
//! The step engine never walks molecule pairs itself; a [`PairSweep`] policy
//! supplies each molecule's intermolecular energy contribution. The policy is
//! the only thing that differs between brute-force, neighbour-list, and
//! cell-list configurations, so it is the one seam the engine abstracts over.

use crate::core::forcefield::potentials;
use crate::core::models::simbox::SimBox;
use itertools::Itertools;

/// Supplies the intermolecular pair-energy contribution of one molecule.
pub trait PairSweep {
    /// Energy between `mol` and every partner molecule with index at or
    /// after `start_from` (excluding `mol` itself), honouring the policy's
    /// cutoff.
    ///
    /// Called with `start_from == mol` the contributions sum to the box's
    /// intermolecular energy with each unordered pair counted once; with
    /// `start_from == 0` it yields the full contribution of one molecule for
    /// a move delta.
    fn molecule_contribution(&self, sb: &SimBox, mol: usize, start_from: usize) -> f64;
}

/// The reference sweep: every molecule pair, gated only by a primary-index
/// cutoff test.
///
/// Quadratic in the number of molecules; neighbour-list policies exist to
/// replace it, not to change its answers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BruteForceSweep {
    cutoff: f64,
}

impl BruteForceSweep {
    pub fn new(cutoff: f64) -> Self {
        Self { cutoff }
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }
}

impl PairSweep for BruteForceSweep {
    fn molecule_contribution(&self, sb: &SimBox, mol: usize, start_from: usize) -> f64 {
        let mut total = 0.0;
        for other in start_from..sb.num_molecules() {
            if other == mol {
                continue;
            }
            if sb.molecules_in_range(mol, other, self.cutoff) {
                total += intermolecular_pair_energy(sb, mol, other);
            }
        }
        total
    }
}

/// LJ + Coulomb energy over every atom pair between two molecules.
fn intermolecular_pair_energy(sb: &SimBox, mol1: usize, mol2: usize) -> f64 {
    let m1 = sb.molecules[mol1];
    let m2 = sb.molecules[mol2];

    (m1.start..m1.start + m1.len)
        .cartesian_product(m2.start..m2.start + m2.len)
        .map(|(i, j)| {
            let r2 = sb.dist_squared(i, j);
            potentials::lennard_jones(sb.sigma[i], sb.epsilon[i], sb.sigma[j], sb.epsilon[j], r2)
                + potentials::coulomb(sb.charge[i], sb.charge[j], r2.sqrt())
        })
        .sum()
}

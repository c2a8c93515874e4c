//! Intramolecular and whole-system energy sums.

use crate::core::forcefield::potentials;
use crate::core::forcefield::term::EnergyTerm;
use crate::core::models::simbox::SimBox;
use crate::engine::context::PairSweep;
use itertools::Itertools;
use tracing::{debug, instrument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Harmonic bond energy of one molecule: `K·(EQ − length)²` over the bonds
/// flagged as variable.
pub fn bond_energy(sb: &SimBox, mol: usize) -> f64 {
    let m = sb.molecules[mol];
    let mut out = 0.0;
    for b in m.bond_start..m.bond_start + m.bond_count {
        let bond = &sb.bonds[b];
        if bond.variable {
            let diff = bond.equilibrium - sb.bond_lengths[b];
            out += bond.force_constant * diff * diff;
        }
    }
    out
}

/// Harmonic angle energy of one molecule: `K·(EQ − size)²` over the angles
/// flagged as variable.
pub fn angle_energy(sb: &SimBox, mol: usize) -> f64 {
    let m = sb.molecules[mol];
    let mut out = 0.0;
    for g in m.angle_start..m.angle_start + m.angle_count {
        let angle = &sb.angles[g];
        if angle.variable {
            let diff = angle.equilibrium - sb.angle_sizes[g];
            out += angle.force_constant * diff * diff;
        }
    }
    out
}

/// Nonbonded (LJ + Coulomb) energy between the molecule's own atom pairs,
/// with 1-2/1-3 pairs masked and 1-4 pairs scaled by half.
pub fn intra_nonbonded_energy(sb: &SimBox, mol: usize) -> f64 {
    let m = sb.molecules[mol];
    let table = &sb.exclusions[m.type_id];

    let mut out = 0.0;
    for (i, j) in (m.start..m.start + m.len).tuple_combinations() {
        let fudge = table.fudge_factor(i - m.start, j - m.start);
        if fudge > 0.0 {
            let r2 = sb.dist_squared(i, j);
            let energy = potentials::lennard_jones(
                sb.sigma[i],
                sb.epsilon[i],
                sb.sigma[j],
                sb.epsilon[j],
                r2,
            ) + potentials::coulomb(sb.charge[i], sb.charge[j], r2.sqrt());
            out += fudge * energy;
        }
    }
    out
}

/// Total intramolecular energy of one molecule.
pub fn intra_energy(sb: &SimBox, mol: usize) -> f64 {
    intra_energy_terms(sb, mol).total()
}

/// Intramolecular energy decomposed into bond, angle, and nonbonded terms.
pub fn intra_energy_terms(sb: &SimBox, mol: usize) -> EnergyTerm {
    EnergyTerm::new(
        bond_energy(sb, mol),
        angle_energy(sb, mol),
        intra_nonbonded_energy(sb, mol),
    )
}

/// Combined intermolecular and intramolecular energy contribution of one
/// molecule, with the pair sweep starting its scan at `start_from`.
pub fn molecule_energy<S: PairSweep>(sb: &SimBox, sweep: &S, mol: usize, start_from: usize) -> f64 {
    sweep.molecule_contribution(sb, mol, start_from) + intra_energy(sb, mol)
}

/// Total energy of the box over the first `num_molecules` molecules.
///
/// `sub_lj` and `sub_charge` are pre-computed long-range baseline energies
/// folded into the total. Each unordered molecule pair is counted once
/// because molecule `m` only sweeps partners from `m` onward.
#[instrument(skip_all, fields(num_molecules))]
pub fn system_energy<S: PairSweep + Sync>(
    sb: &SimBox,
    sweep: &S,
    sub_lj: f64,
    sub_charge: f64,
    num_molecules: usize,
) -> f64 {
    let molecules = 0..num_molecules;

    #[cfg(feature = "parallel")]
    let total: f64 = molecules
        .into_par_iter()
        .map(|mol| molecule_energy(sb, sweep, mol, mol))
        .sum();

    #[cfg(not(feature = "parallel"))]
    let total: f64 = molecules
        .map(|mol| molecule_energy(sb, sweep, mol, mol))
        .sum();

    if tracing::enabled!(tracing::Level::DEBUG) {
        let mut inter = 0.0;
        let mut intra = EnergyTerm::default();
        for mol in 0..num_molecules {
            inter += sweep.molecule_contribution(sb, mol, mol);
            intra += intra_energy_terms(sb, mol);
        }
        debug!(
            inter,
            intra = intra.total(),
            bond = intra.bond,
            angle = intra.angle,
            nonbonded = intra.nonbonded,
            "system energy decomposition"
        );
    }

    sub_lj + sub_charge + total
}

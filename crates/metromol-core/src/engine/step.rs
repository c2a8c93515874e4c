//! The Monte Carlo step driver.
//!
//! [`StepRunner`] orchestrates one perturbation at a time: a rigid-body move
//! of the chosen molecule followed by batches of internal bond and angle
//! moves. Each internal batch runs its own Metropolis test, but a failed test
//! there does not roll anything back; it only feeds the acceptance counters
//! that drive step-size tuning. The outer simulation loop owns the real
//! accept/reject decision and calls [`StepRunner::rollback`] on reject.

use crate::core::models::simbox::SimBox;
use crate::engine::config::MoveConfig;
use crate::engine::context::PairSweep;
use crate::engine::moves::{internal, rigid};
use crate::engine::{energy, rollback};
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, instrument, trace};

/// Borrowing context that binds one simulation box to a pair-sweep policy.
///
/// The runner owns no state of its own; everything mutable lives in the box,
/// so several boxes can be driven in one process by constructing a runner per
/// box.
pub struct StepRunner<'a, S: PairSweep> {
    sb: &'a mut SimBox,
    config: &'a MoveConfig,
    sweep: &'a S,
}

impl<'a, S: PairSweep> StepRunner<'a, S> {
    pub fn new(sb: &'a mut SimBox, config: &'a MoveConfig, sweep: &'a S) -> Self {
        Self { sb, config, sweep }
    }

    pub fn boxstate(&self) -> &SimBox {
        self.sb
    }

    /// Advances the box's step counter; the outer loop calls this once per
    /// Metropolis iteration.
    pub fn advance_step(&mut self) {
        self.sb.step_num += 1;
    }

    /// Picks a uniformly random molecule index.
    pub fn choose_molecule(&self, rng: &mut impl Rng) -> usize {
        rng.gen_range(0..self.sb.num_molecules())
    }

    /// Perturbs one molecule: rigid-body translation and rotation, then
    /// internal bond and angle batches. Saves everything needed for
    /// [`rollback`](Self::rollback) before touching it.
    #[instrument(skip_all, fields(mol))]
    pub fn change_molecule(&mut self, mol: usize, rng: &mut impl Rng) {
        rigid::intermolecular_move(self.sb, mol, rng);
        self.intramolecular_move(mol, rng);
    }

    /// Restores the molecule's pre-move coordinates, bond lengths, and angle
    /// sizes bit-exactly.
    pub fn rollback(&mut self, mol: usize) {
        rollback::restore(self.sb, mol);
    }

    /// Metropolis criterion on a pair of energies.
    ///
    /// A decrease is always accepted, which also keeps the exponent argument
    /// non-positive and the `exp` overflow-free.
    pub fn accept_move(&self, e_old: f64, e_new: f64, rng: &mut impl Rng) -> bool {
        metropolis(e_old, e_new, self.sb.k_t, rng)
    }

    pub fn intra_energy(&self, mol: usize) -> f64 {
        energy::intra_energy(self.sb, mol)
    }

    pub fn bond_energy(&self, mol: usize) -> f64 {
        energy::bond_energy(self.sb, mol)
    }

    pub fn angle_energy(&self, mol: usize) -> f64 {
        energy::angle_energy(self.sb, mol)
    }

    /// Combined inter- and intramolecular contribution of one molecule.
    pub fn molecule_energy(&self, mol: usize, start_from: usize) -> f64 {
        energy::molecule_energy(self.sb, self.sweep, mol, start_from)
    }

    /// Total energy of the box on top of the given baseline energies.
    pub fn system_energy(&self, sub_lj: f64, sub_charge: f64, num_molecules: usize) -> f64
    where
        S: Sync,
    {
        energy::system_energy(self.sb, self.sweep, sub_lj, sub_charge, num_molecules)
    }

    fn intramolecular_move(&mut self, mol: usize, rng: &mut impl Rng) {
        rollback::save_bonds(self.sb, mol);
        rollback::save_angles(self.sb, mol);

        let intra_scale = 0.25 + 0.75 / f64::from(self.config.num_move_types());
        let m = self.sb.molecules[mol];
        let mut current_energy = energy::intra_energy(self.sb, mol);

        if self.config.enable_bond && m.bond_count > 0 {
            let n_to_move = batch_size(m.bond_count, self.sb.max_intra_moves, rng);
            let scale = 0.25 + (0.75 / n_to_move as f64) * intra_scale;
            self.sb.num_bond_moves += n_to_move as u64;

            for bond_local in sample_distinct(m.bond_count, n_to_move, rng) {
                let max_delta = self.sb.max_bond_delta;
                let delta = scale * rng.gen_range(-max_delta..max_delta);
                trace!(mol, bond_local, delta, "stretching bond");
                internal::stretch_bond(self.sb, mol, bond_local, delta);
            }

            // MC test for delta tuning only; failing does not roll back.
            let new_energy = energy::intra_energy(self.sb, mol);
            if metropolis(current_energy, new_energy, self.sb.k_t, rng) {
                self.sb.num_accepted_bond_moves += n_to_move as u64;
            }
            current_energy = new_energy;
        }

        if self.config.enable_angle && m.angle_count > 0 {
            let n_to_move = batch_size(m.angle_count, self.sb.max_intra_moves, rng);
            let scale = 0.25 + (0.75 / n_to_move as f64) * intra_scale;
            self.sb.num_angle_moves += n_to_move as u64;

            for angle_local in sample_distinct(m.angle_count, n_to_move, rng) {
                let max_delta = self.sb.max_angle_delta;
                let delta = scale * rng.gen_range(-max_delta..max_delta);
                trace!(mol, angle_local, delta, "expanding angle");
                internal::expand_angle(self.sb, mol, angle_local, delta);
            }

            let new_energy = energy::intra_energy(self.sb, mol);
            if metropolis(current_energy, new_energy, self.sb.k_t, rng) {
                self.sb.num_accepted_angle_moves += n_to_move as u64;
            }
        }

        if self.config.enable_tuning
            && self.sb.step_num != 0
            && self.sb.step_num % self.config.tune_interval == 0
        {
            self.tune();
        }
    }

    /// Nudges the move deltas toward the target acceptance ratio and resets
    /// the counters.
    fn tune(&mut self) {
        let target = self.config.target_acceptance;
        let margin = self.config.ratio_margin;

        if self.sb.num_bond_moves > 0 {
            let ratio = self.sb.num_accepted_bond_moves as f64 / self.sb.num_bond_moves as f64;
            let diff = ratio - target;
            if diff.abs() > margin {
                self.sb.max_bond_delta += self.sb.max_bond_delta * diff;
            }
            debug!(ratio, max_bond_delta = self.sb.max_bond_delta, "tuned bond delta");
        }

        if self.sb.num_angle_moves > 0 {
            let ratio = self.sb.num_accepted_angle_moves as f64 / self.sb.num_angle_moves as f64;
            let diff = ratio - target;
            if diff.abs() > margin {
                self.sb.max_angle_delta += self.sb.max_angle_delta * diff;
            }
            debug!(ratio, max_angle_delta = self.sb.max_angle_delta, "tuned angle delta");
        }

        self.sb.num_bond_moves = 0;
        self.sb.num_accepted_bond_moves = 0;
        self.sb.num_angle_moves = 0;
        self.sb.num_accepted_angle_moves = 0;
    }
}

fn metropolis(e_old: f64, e_new: f64, k_t: f64, rng: &mut impl Rng) -> bool {
    if e_new < e_old {
        return true;
    }
    (-(e_new - e_old) / k_t).exp() >= rng.gen_range(0.0..1.0)
}

/// Number of bonds or angles to perturb in one batch: all of them for small
/// molecules, otherwise a random batch capped by the configured maximum.
fn batch_size(count: usize, max_intra_moves: usize, rng: &mut impl Rng) -> usize {
    if count > 3 {
        rng.gen_range(2..count).min(max_intra_moves)
    } else {
        count
    }
}

/// Draws `n` distinct indices below `count`; iteration order is ascending, so
/// batches apply in index order.
fn sample_distinct(count: usize, n: usize, rng: &mut impl Rng) -> BTreeSet<usize> {
    let mut indexes = BTreeSet::new();
    while indexes.len() < n {
        indexes.insert(rng.gen_range(0..count));
    }
    indexes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::SimBoxBuilder;
    use crate::core::models::topology::ExclusionTable;
    use crate::engine::context::BruteForceSweep;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn flexible_box() -> SimBox {
        let mut table = ExclusionTable::new(4);
        table.mask_pair(0, 1);
        table.mask_pair(1, 2);
        table.mask_pair(2, 3);
        table.mask_pair(0, 2);
        table.mask_pair(1, 3);
        table.scale_pair(0, 3);

        let mut builder = SimBoxBuilder::new([30.0, 30.0, 30.0], 0.6);
        let type_id = builder.add_molecule_type(table);
        for origin in [5.0, 15.0] {
            // Zigzag chain; a collinear one would leave angle moves without
            // a rotation plane.
            builder.begin_molecule(type_id);
            builder.add_atom([origin, 10.0, 10.0], 3.0, 0.1, 0.05);
            builder.add_atom([origin + 1.5, 10.0, 10.0], 3.0, 0.1, 0.05);
            builder.add_atom([origin + 2.25, 11.3, 10.0], 3.0, 0.1, 0.05);
            builder.add_atom([origin + 3.75, 11.3, 10.0], 3.0, 0.1, 0.05);
            builder.add_bond(0, 1, 1.5, 1.5, 300.0, true);
            builder.add_bond(1, 2, 1.5, 1.5, 300.0, true);
            builder.add_bond(2, 3, 1.5, 1.5, 300.0, true);
            builder.add_angle(0, 1, 2, 120.0, 115.0, 40.0, true);
            builder.add_angle(1, 2, 3, 120.0, 115.0, 40.0, true);
            builder.add_primary(0);
        }
        builder.build().unwrap()
    }

    fn capture(sb: &SimBox) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let coords = (0..3)
            .flat_map(|d| sb.coords[d].iter().copied())
            .collect();
        (coords, sb.bond_lengths.clone(), sb.angle_sizes.clone())
    }

    #[test]
    fn rollback_after_change_is_a_bit_exact_identity() {
        let mut sb = flexible_box();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(12.0);
        let before = capture(&sb);

        let mut rng = StdRng::seed_from_u64(2024);
        let mut runner = StepRunner::new(&mut sb, &config, &sweep);
        runner.change_molecule(1, &mut rng);

        let perturbed = capture(runner.boxstate());
        assert_ne!(before.0, perturbed.0, "move should alter coordinates");

        runner.rollback(1);
        let after = capture(runner.boxstate());

        assert_eq!(before.0, after.0);
        assert_eq!(before.1, after.1);
        assert_eq!(before.2, after.2);
    }

    #[test]
    fn changing_one_molecule_leaves_the_other_untouched() {
        let mut sb = flexible_box();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(12.0);
        let other_before: Vec<_> = (0..4).map(|a| sb.atom_position(a)).collect();

        let mut rng = StdRng::seed_from_u64(5);
        let mut runner = StepRunner::new(&mut sb, &config, &sweep);
        runner.change_molecule(1, &mut rng);

        for (atom, pos) in other_before.iter().enumerate() {
            assert_eq!(runner.boxstate().atom_position(atom), *pos);
        }
    }

    #[test]
    fn change_molecule_records_move_statistics() {
        let mut sb = flexible_box();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(12.0);

        let mut rng = StdRng::seed_from_u64(99);
        let mut runner = StepRunner::new(&mut sb, &config, &sweep);
        runner.change_molecule(0, &mut rng);

        assert!(runner.boxstate().num_bond_moves > 0);
        assert!(runner.boxstate().num_angle_moves > 0);
    }

    #[test]
    fn monoatomic_molecules_skip_the_internal_batches() {
        let mut builder = SimBoxBuilder::new([20.0, 20.0, 20.0], 0.6);
        let type_id = builder.add_molecule_type(ExclusionTable::new(1));
        builder.begin_molecule(type_id);
        builder.add_atom([10.0, 10.0, 10.0], 3.0, 0.1, 0.0);
        builder.add_primary(0);
        let mut sb = builder.build().unwrap();

        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(9.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut runner = StepRunner::new(&mut sb, &config, &sweep);
        runner.change_molecule(0, &mut rng);

        assert_eq!(runner.boxstate().num_bond_moves, 0);
        assert_eq!(runner.boxstate().num_angle_moves, 0);
    }

    #[test]
    fn accept_move_takes_any_energy_decrease() {
        let mut sb = flexible_box();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(12.0);
        let runner = StepRunner::new(&mut sb, &config, &sweep);

        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..100 {
            assert!(runner.accept_move(10.0, 5.0, &mut rng));
        }
    }

    #[test]
    fn accept_move_matches_the_boltzmann_draw_for_increases() {
        let mut builder = SimBoxBuilder::new([20.0, 20.0, 20.0], 5.0);
        let type_id = builder.add_molecule_type(ExclusionTable::new(1));
        builder.begin_molecule(type_id);
        builder.add_atom([10.0, 10.0, 10.0], 3.0, 0.1, 0.0);
        builder.add_primary(0);
        let mut sb = builder.build().unwrap();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(9.0);
        let runner = StepRunner::new(&mut sb, &config, &sweep);

        let mut rng = StdRng::seed_from_u64(17);
        let mut probe = rng.clone();
        let expected = (-1.0_f64).exp() >= probe.gen_range(0.0..1.0);
        assert_eq!(runner.accept_move(5.0, 10.0, &mut rng), expected);
    }

    #[test]
    fn acceptance_rate_for_uphill_moves_follows_the_boltzmann_factor() {
        let mut rng = StdRng::seed_from_u64(7);
        let k_t = 5.0;
        let trials = 20_000;

        let accepted = (0..trials)
            .filter(|_| metropolis(5.0, 10.0, k_t, &mut rng))
            .count();
        let rate = accepted as f64 / trials as f64;
        let expected = (-1.0_f64).exp();

        assert!(
            (rate - expected).abs() < 0.01,
            "rate {rate} vs expected {expected}"
        );
    }

    #[test]
    fn tuning_raises_the_delta_when_acceptance_is_high() {
        let mut sb = flexible_box();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(12.0);
        let mut runner = StepRunner::new(&mut sb, &config, &sweep);

        runner.sb.num_bond_moves = 1000;
        runner.sb.num_accepted_bond_moves = 600;
        let before = runner.sb.max_bond_delta;
        runner.tune();

        assert!(runner.sb.max_bond_delta > before);
        assert_eq!(runner.sb.num_bond_moves, 0);
        assert_eq!(runner.sb.num_accepted_bond_moves, 0);
    }

    #[test]
    fn tuning_lowers_the_delta_when_acceptance_is_low() {
        let mut sb = flexible_box();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(12.0);
        let mut runner = StepRunner::new(&mut sb, &config, &sweep);

        runner.sb.num_angle_moves = 1000;
        runner.sb.num_accepted_angle_moves = 100;
        let before = runner.sb.max_angle_delta;
        runner.tune();

        assert!(runner.sb.max_angle_delta < before);
    }

    #[test]
    fn tuning_inside_the_margin_leaves_the_delta_alone() {
        let mut sb = flexible_box();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(12.0);
        let mut runner = StepRunner::new(&mut sb, &config, &sweep);

        runner.sb.num_bond_moves = 100_000;
        runner.sb.num_accepted_bond_moves = 40_000;
        let before = runner.sb.max_bond_delta;
        runner.tune();

        assert_eq!(runner.sb.max_bond_delta, before);
    }

    #[test]
    fn tuning_with_no_recorded_moves_changes_nothing() {
        let mut sb = flexible_box();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(12.0);
        let mut runner = StepRunner::new(&mut sb, &config, &sweep);

        let bond_before = runner.sb.max_bond_delta;
        let angle_before = runner.sb.max_angle_delta;
        runner.tune();

        assert_eq!(runner.sb.max_bond_delta, bond_before);
        assert_eq!(runner.sb.max_angle_delta, angle_before);
    }

    #[test]
    fn batch_size_takes_every_index_of_a_small_molecule() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(batch_size(1, 15, &mut rng), 1);
        assert_eq!(batch_size(3, 15, &mut rng), 3);
    }

    #[test]
    fn batch_size_samples_within_bounds_for_larger_molecules() {
        let mut rng = StdRng::seed_from_u64(0);
        for _ in 0..200 {
            let n = batch_size(10, 4, &mut rng);
            assert!((2..=4).contains(&n), "batch size {n}");
        }
    }

    #[test]
    fn sampled_indexes_are_distinct_and_ascending() {
        let mut rng = StdRng::seed_from_u64(12);
        let indexes = sample_distinct(8, 5, &mut rng);
        assert_eq!(indexes.len(), 5);
        let listed: Vec<_> = indexes.iter().copied().collect();
        let mut sorted = listed.clone();
        sorted.sort_unstable();
        assert_eq!(listed, sorted);
        assert!(listed.iter().all(|&i| i < 8));
    }

    #[test]
    fn choose_molecule_stays_in_range() {
        let mut sb = flexible_box();
        let config = MoveConfig::default();
        let sweep = BruteForceSweep::new(12.0);
        let runner = StepRunner::new(&mut sb, &config, &sweep);

        let mut rng = StdRng::seed_from_u64(4);
        for _ in 0..100 {
            assert!(runner.choose_molecule(&mut rng) < 2);
        }
    }
}

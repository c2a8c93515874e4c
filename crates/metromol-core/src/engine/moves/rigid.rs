//! Rigid-body translation and rotation of one molecule.

use crate::core::models::simbox::SimBox;
use crate::core::utils::geometry::{self, NUM_DIMENSIONS};
use nalgebra::Vector3;
use rand::Rng;
use tracing::trace;

/// Translates and rotates a whole molecule, saving its prior coordinates for
/// rollback.
///
/// A random vertex atom serves as the rotation pivot: every other atom is
/// rotated about it and translated, the vertex itself only translates. The
/// draw order (vertex, translation, rotation) is fixed; reordering it changes
/// the trajectory produced by a seeded RNG. After the move the molecule is
/// wrapped back into the box.
pub(crate) fn intermolecular_move(sb: &mut SimBox, mol: usize, rng: &mut impl Rng) {
    let max_t = sb.max_translate;
    let max_r = sb.max_rotate;
    let m = sb.molecules[mol];

    let vertex = rng.gen_range(0..m.len);
    let delta = Vector3::new(
        rng.gen_range(-max_t..max_t),
        rng.gen_range(-max_t..max_t),
        rng.gen_range(-max_t..max_t),
    );
    let rotation = Vector3::new(
        rng.gen_range(-max_r..max_r),
        rng.gen_range(-max_r..max_r),
        rng.gen_range(-max_r..max_r),
    );
    trace!(mol, vertex, ?delta, ?rotation, "rigid-body move");

    for i in 0..m.len {
        for d in 0..NUM_DIMENSIONS {
            sb.rollback_coords[d][i] = sb.coords[d][m.start + i];
        }
    }

    for i in 0..m.len {
        if i == vertex {
            continue;
        }
        geometry::rotate_atom(m.start + i, m.start + vertex, &rotation, &mut sb.coords);
        geometry::translate_atom(m.start + i, &delta, &mut sb.coords);
    }
    geometry::translate_atom(m.start + vertex, &delta, &mut sb.coords);

    keep_molecule_in_box(sb, mol);
}

/// Re-centers a molecule whose primary-index atom has left the box.
///
/// Applies a single whole-molecule shift of one box length per dimension.
/// Must run after every atom has moved; the move-magnitude bounds guarantee
/// one wrap suffices.
pub(crate) fn keep_molecule_in_box(sb: &mut SimBox, mol: usize) {
    let m = sb.molecules[mol];
    let primary = sb.primary_indexes[m.primary_start];

    for d in 0..NUM_DIMENSIONS {
        if sb.coords[d][primary] < 0.0 {
            for atom in m.start..m.start + m.len {
                sb.coords[d][atom] += sb.box_size[d];
            }
        } else if sb.coords[d][primary] > sb.box_size[d] {
            for atom in m.start..m.start + m.len {
                sb.coords[d][atom] -= sb.box_size[d];
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::builder::SimBoxBuilder;
    use crate::core::models::topology::ExclusionTable;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const TOLERANCE: f64 = 1e-10;

    fn triatomic_near(origin: [f64; 3]) -> SimBox {
        let mut builder = SimBoxBuilder::new([20.0, 20.0, 20.0], 0.6);
        let type_id = builder.add_molecule_type(ExclusionTable::new(3));
        builder.begin_molecule(type_id);
        builder.add_atom(origin, 3.0, 0.1, 0.0);
        builder.add_atom([origin[0] + 1.0, origin[1], origin[2]], 3.0, 0.1, 0.0);
        builder.add_atom([origin[0], origin[1] + 1.0, origin[2]], 3.0, 0.1, 0.0);
        builder.add_bond(0, 1, 1.0, 1.0, 300.0, true);
        builder.add_bond(0, 2, 1.0, 1.0, 300.0, true);
        builder.add_angle(1, 0, 2, 90.0, 90.0, 40.0, true);
        builder.add_primary(0);
        builder.build().unwrap()
    }

    #[test]
    fn rigid_move_preserves_intramolecular_distances() {
        let mut sb = triatomic_near([10.0, 10.0, 10.0]);
        let mut rng = StdRng::seed_from_u64(7);

        let before: Vec<f64> = [(0, 1), (0, 2), (1, 2)]
            .iter()
            .map(|&(a, b)| (sb.atom_position(a) - sb.atom_position(b)).norm())
            .collect();

        intermolecular_move(&mut sb, 0, &mut rng);

        for (pair, old) in [(0, 1), (0, 2), (1, 2)].iter().zip(before) {
            let new = (sb.atom_position(pair.0) - sb.atom_position(pair.1)).norm();
            assert!((new - old).abs() < TOLERANCE);
        }
    }

    #[test]
    fn rigid_move_snapshots_the_prior_coordinates() {
        let mut sb = triatomic_near([10.0, 10.0, 10.0]);
        let mut rng = StdRng::seed_from_u64(11);
        let before: Vec<_> = (0..3).map(|a| sb.atom_position(a)).collect();

        intermolecular_move(&mut sb, 0, &mut rng);

        for (i, pos) in before.iter().enumerate() {
            for d in 0..NUM_DIMENSIONS {
                assert_eq!(sb.rollback_coords[d][i], pos[d]);
            }
        }
    }

    #[test]
    fn rigid_move_keeps_the_primary_atom_in_the_box() {
        let mut sb = triatomic_near([0.2, 0.2, 19.8]);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            intermolecular_move(&mut sb, 0, &mut rng);
            let primary = sb.primary_indexes[0];
            for d in 0..NUM_DIMENSIONS {
                let coord = sb.coords[d][primary];
                assert!((0.0..=20.0).contains(&coord), "dim {d}: {coord}");
            }
        }
    }

    #[test]
    fn wrap_shifts_every_atom_of_the_molecule_together() {
        let mut sb = triatomic_near([10.0, 10.0, 10.0]);
        // Push the whole molecule below the floor in y.
        for atom in 0..3 {
            sb.coords[1][atom] -= 10.7;
        }
        keep_molecule_in_box(&mut sb, 0);

        assert!((sb.coord(1, 0) - 19.3).abs() < TOLERANCE);
        assert!((sb.coord(1, 1) - 19.3).abs() < TOLERANCE);
        assert!((sb.coord(1, 2) - 20.3).abs() < TOLERANCE);
        // Other dimensions untouched.
        assert!((sb.coord(0, 0) - 10.0).abs() < TOLERANCE);
    }

    #[test]
    fn wrap_is_a_no_op_when_the_primary_atom_is_inside() {
        let mut sb = triatomic_near([10.0, 10.0, 10.0]);
        let before: Vec<_> = (0..3).map(|a| sb.atom_position(a)).collect();
        keep_molecule_in_box(&mut sb, 0);
        for (atom, pos) in before.iter().enumerate() {
            assert_eq!(sb.atom_position(atom), *pos);
        }
    }
}

//! Save and restore of per-molecule move state.
//!
//! Coordinates are snapshotted by the rigid-body move into a compact
//! locally-indexed buffer; bond lengths and angle sizes are mirrored at their
//! global offsets, so one mirror serves all molecules but only the slice of
//! the molecule currently being perturbed is meaningful. Restoring is
//! unconditional and bit-exact: it copies back coordinates, bond lengths, and
//! angle sizes regardless of which of them the move actually touched.

use crate::core::models::simbox::SimBox;
use crate::core::utils::geometry::NUM_DIMENSIONS;

/// Mirrors the molecule's current bond lengths into the rollback store.
pub(crate) fn save_bonds(sb: &mut SimBox, mol: usize) {
    let m = sb.molecules[mol];
    let span = m.bond_start..m.bond_start + m.bond_count;
    sb.rollback_bond_lengths[span.clone()].copy_from_slice(&sb.bond_lengths[span]);
}

/// Mirrors the molecule's current angle sizes into the rollback store.
pub(crate) fn save_angles(sb: &mut SimBox, mol: usize) {
    let m = sb.molecules[mol];
    let span = m.angle_start..m.angle_start + m.angle_count;
    sb.rollback_angle_sizes[span.clone()].copy_from_slice(&sb.angle_sizes[span]);
}

/// Restores the molecule's coordinates, bond lengths, and angle sizes from
/// the rollback store.
pub(crate) fn restore(sb: &mut SimBox, mol: usize) {
    let m = sb.molecules[mol];

    for d in 0..NUM_DIMENSIONS {
        sb.coords[d][m.start..m.start + m.len]
            .copy_from_slice(&sb.rollback_coords[d][..m.len]);
    }

    let angles = m.angle_start..m.angle_start + m.angle_count;
    sb.angle_sizes[angles.clone()].copy_from_slice(&sb.rollback_angle_sizes[angles]);

    let bonds = m.bond_start..m.bond_start + m.bond_count;
    sb.bond_lengths[bonds.clone()].copy_from_slice(&sb.rollback_bond_lengths[bonds]);
}

//! Bond-stretch and angle-expansion moves.
//!
//! Both moves perturb a single internal degree of freedom and carry the rigid
//! sub-groups on either side of it along, so no other bond length or angle
//! size changes. A bond or angle that closes a ring cannot be perturbed this
//! way; such moves silently leave the molecule untouched, which keeps the
//! Metropolis test trivially balanced on the null move.

use crate::core::models::simbox::SimBox;
use crate::core::utils::geometry::{self, NUM_DIMENSIONS};
use crate::engine::partition;
use nalgebra::Vector3;
use tracing::trace;

/// Stretches one bond of a molecule by `delta` Å.
///
/// The two rigid groups move apart (or together) by `delta/2` each along the
/// bond axis, and the stored bond length is updated. `bond_local` indexes the
/// molecule's own bond slice. No periodic wrap is applied here; the
/// rigid-body path re-boxes the molecule.
pub(crate) fn stretch_bond(sb: &mut SimBox, mol: usize, bond_local: usize, delta: f64) {
    let Some(split) = partition::split_on_bond(sb, mol, bond_local) else {
        trace!(mol, bond_local, "bond closes a ring, skipping stretch");
        return;
    };

    let m = sb.molecules[mol];
    let bond_idx = m.bond_start + bond_local;
    let bond = sb.bonds[bond_idx];

    let axis = (geometry::atom_position(bond.atom2, &sb.coords)
        - geometry::atom_position(bond.atom1, &sb.coords))
    .normalize();
    let half_shift = axis * (delta / 2.0);

    for i in 0..m.len {
        let atom = m.start + i;
        if partition::find(&mut sb.union_parent, i) == split.side2 {
            geometry::translate_atom(atom, &half_shift, &mut sb.coords);
        } else {
            geometry::translate_atom(atom, &-half_shift, &mut sb.coords);
        }
    }

    sb.bond_lengths[bond_idx] += delta;
}

/// Expands one angle of a molecule by `delta_deg` degrees.
///
/// The two end groups rotate in opposite senses about the normal of the
/// angle's plane, pivoting on the midpoint atom; atoms in neither group (the
/// midpoint and anything bonded only through it) stay put. The stored angle
/// size is updated. `angle_local` indexes the molecule's own angle slice.
pub(crate) fn expand_angle(sb: &mut SimBox, mol: usize, angle_local: usize, delta_deg: f64) {
    let Some(split) = partition::split_on_angle(sb, mol, angle_local) else {
        trace!(mol, angle_local, "angle lies in a ring, skipping expansion");
        return;
    };

    let m = sb.molecules[mol];
    let angle_idx = m.angle_start + angle_local;
    let angle = sb.angles[angle_idx];

    let mid_pos = geometry::atom_position(angle.mid, &sb.coords);
    let to_end1 = mid_pos - geometry::atom_position(angle.end1, &sb.coords);
    let to_end2 = mid_pos - geometry::atom_position(angle.end2, &sb.coords);
    let normal = to_end1.cross(&to_end2).normalize();

    for i in 0..m.len {
        let group = partition::find(&mut sb.union_parent, i);
        let theta = if group == split.side1 {
            -delta_deg.to_radians()
        } else if group == split.side2 {
            delta_deg.to_radians()
        } else {
            continue;
        };

        let atom = m.start + i;
        let point = geometry::atom_position(atom, &sb.coords) - mid_pos;
        let rotated = rodrigues_rotate(&point, &normal, theta);
        for d in 0..NUM_DIMENSIONS {
            sb.coords[d][atom] = rotated[d] + mid_pos[d];
        }
    }

    sb.angle_sizes[angle_idx] += delta_deg;
}

/// Rotates `point` by `theta` radians about the unit `axis` through the
/// origin.
#[inline]
fn rodrigues_rotate(point: &Vector3<f64>, axis: &Vector3<f64>, theta: f64) -> Vector3<f64> {
    let (sin, cos) = theta.sin_cos();
    axis * axis.dot(point) * (1.0 - cos) + point * cos + axis.cross(point) * sin
}

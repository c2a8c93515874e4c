//! Transient disjoint-set partitioning of a molecule into rigid sub-groups.
//!
//! When a single bond or angle is perturbed, every other atom must follow one
//! side of the perturbed degree of freedom rigidly. The partition is computed
//! by unioning across the molecule's remaining bonds; the scratch array lives
//! in the box and is reinitialized on every call, so group labels are only
//! meaningful within a single internal move.

use crate::core::models::simbox::SimBox;

/// Root labels of the two rigid groups on either side of a perturbed bond or
/// angle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Split {
    /// Group containing the first endpoint.
    pub side1: usize,
    /// Group containing the second endpoint.
    pub side2: usize,
}

/// Iterative two-pass find with path compression.
pub(crate) fn find(parent: &mut [usize], index: usize) -> usize {
    let mut root = index;
    while parent[root] != root {
        root = parent[root];
    }
    let mut walk = index;
    while parent[walk] != root {
        let next = parent[walk];
        parent[walk] = root;
        walk = next;
    }
    root
}

/// Merges the groups containing the two atoms.
pub(crate) fn union_atoms(parent: &mut [usize], atom1: usize, atom2: usize) {
    let root1 = find(parent, atom1);
    let root2 = find(parent, atom2);
    if root1 != root2 {
        parent[root1] = root2;
    }
}

fn reset(parent: &mut [usize], len: usize) {
    for (i, slot) in parent.iter_mut().enumerate().take(len) {
        *slot = i;
    }
}

/// Splits a molecule's atoms into the two rigid groups on either side of one
/// bond, unioning across every other bond of the molecule.
///
/// Returns `None` when the bond closes a ring, in which case the move must be
/// a no-op.
pub(crate) fn split_on_bond(sb: &mut SimBox, mol: usize, bond_local: usize) -> Option<Split> {
    let m = sb.molecules[mol];
    reset(&mut sb.union_parent, m.len);

    let skipped = m.bond_start + bond_local;
    for b in m.bond_start..m.bond_start + m.bond_count {
        if b == skipped {
            continue;
        }
        let a1 = sb.bonds[b].atom1 - m.start;
        let a2 = sb.bonds[b].atom2 - m.start;
        union_atoms(&mut sb.union_parent, a1, a2);
    }

    let side1 = find(&mut sb.union_parent, sb.bonds[skipped].atom1 - m.start);
    let side2 = find(&mut sb.union_parent, sb.bonds[skipped].atom2 - m.start);
    (side1 != side2).then_some(Split { side1, side2 })
}

/// Splits a molecule's atoms into the two rigid groups swung by one angle,
/// unioning across every bond not incident to the angle's midpoint.
///
/// Returns `None` when the angle lies in a ring.
pub(crate) fn split_on_angle(sb: &mut SimBox, mol: usize, angle_local: usize) -> Option<Split> {
    let m = sb.molecules[mol];
    reset(&mut sb.union_parent, m.len);

    let angle = sb.angles[m.angle_start + angle_local];
    for b in m.bond_start..m.bond_start + m.bond_count {
        let bond = sb.bonds[b];
        if bond.atom1 == angle.mid || bond.atom2 == angle.mid {
            continue;
        }
        union_atoms(&mut sb.union_parent, bond.atom1 - m.start, bond.atom2 - m.start);
    }

    let side1 = find(&mut sb.union_parent, angle.end1 - m.start);
    let side2 = find(&mut sb.union_parent, angle.end2 - m.start);
    (side1 != side2).then_some(Split { side1, side2 })
}

use super::topology::{Angle, Bond, ExclusionTable};
use crate::core::utils::geometry::{self, CoordPlanes, NUM_DIMENSIONS};
use nalgebra::Vector3;

/// Atom, bond, angle, and primary-index spans of one molecule.
///
/// A molecule's atoms occupy the contiguous global range
/// `[start, start + len)`; its bonds and angles are contiguous slices of the
/// box-wide tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Molecule {
    pub start: usize,
    pub len: usize,
    /// Index into the box's exclusion tables.
    pub type_id: usize,
    pub bond_start: usize,
    pub bond_count: usize,
    pub angle_start: usize,
    pub angle_count: usize,
    /// Slice of the box's primary-index array designating the atoms used for
    /// cutoff tests and periodic re-centering.
    pub primary_start: usize,
    pub primary_count: usize,
}

/// Complete state of one simulation box.
///
/// Atom data is stored structure-of-arrays with column-major coordinates
/// (`[dimension][atom]`), matching the access pattern of the move and energy
/// kernels. The box also carries the per-move rollback mirrors, the transient
/// union-find scratch, and the adaptive move magnitudes with their
/// acceptance counters.
///
/// Shape (atom counts, topology, exclusion tables) is fixed at construction
/// via [`SimBoxBuilder`](super::builder::SimBoxBuilder); only coordinates,
/// bond lengths, angle sizes, and the tuning state mutate afterwards.
#[derive(Debug, Clone)]
pub struct SimBox {
    pub(crate) box_size: [f64; NUM_DIMENSIONS],
    pub(crate) k_t: f64,
    pub(crate) step_num: u64,

    pub(crate) coords: CoordPlanes,
    pub(crate) sigma: Vec<f64>,
    pub(crate) epsilon: Vec<f64>,
    pub(crate) charge: Vec<f64>,

    pub(crate) molecules: Vec<Molecule>,
    pub(crate) primary_indexes: Vec<usize>,

    pub(crate) bonds: Vec<Bond>,
    pub(crate) bond_lengths: Vec<f64>,
    pub(crate) angles: Vec<Angle>,
    pub(crate) angle_sizes: Vec<f64>,
    pub(crate) exclusions: Vec<ExclusionTable>,

    /// Saved positions of the currently perturbed molecule, local indexing.
    pub(crate) rollback_coords: CoordPlanes,
    pub(crate) rollback_bond_lengths: Vec<f64>,
    pub(crate) rollback_angle_sizes: Vec<f64>,

    /// Disjoint-set scratch; valid only inside a single internal move.
    pub(crate) union_parent: Vec<usize>,

    pub(crate) max_translate: f64,
    pub(crate) max_rotate: f64,
    pub(crate) max_bond_delta: f64,
    pub(crate) max_angle_delta: f64,
    pub(crate) max_intra_moves: usize,

    pub(crate) num_bond_moves: u64,
    pub(crate) num_accepted_bond_moves: u64,
    pub(crate) num_angle_moves: u64,
    pub(crate) num_accepted_angle_moves: u64,
}

impl SimBox {
    pub fn num_atoms(&self) -> usize {
        self.sigma.len()
    }

    pub fn num_molecules(&self) -> usize {
        self.molecules.len()
    }

    pub fn molecule(&self, mol: usize) -> &Molecule {
        &self.molecules[mol]
    }

    pub fn box_size(&self) -> &[f64; NUM_DIMENSIONS] {
        &self.box_size
    }

    /// Temperature parameter `kT` in kcal/mol.
    pub fn k_t(&self) -> f64 {
        self.k_t
    }

    pub fn step_num(&self) -> u64 {
        self.step_num
    }

    pub fn coord(&self, dimension: usize, atom: usize) -> f64 {
        self.coords[dimension][atom]
    }

    pub fn atom_position(&self, atom: usize) -> Vector3<f64> {
        geometry::atom_position(atom, &self.coords)
    }

    /// Current length of a bond, by global bond index.
    pub fn bond_length(&self, bond: usize) -> f64 {
        self.bond_lengths[bond]
    }

    /// Current size of an angle in degrees, by global angle index.
    pub fn angle_size(&self, angle: usize) -> f64 {
        self.angle_sizes[angle]
    }

    pub fn max_translate(&self) -> f64 {
        self.max_translate
    }

    pub fn max_rotate(&self) -> f64 {
        self.max_rotate
    }

    pub fn max_bond_delta(&self) -> f64 {
        self.max_bond_delta
    }

    pub fn max_angle_delta(&self) -> f64 {
        self.max_angle_delta
    }

    /// Squared minimum-image distance between two atoms.
    #[inline]
    pub fn dist_squared(&self, a1: usize, a2: usize) -> f64 {
        geometry::dist_squared(a1, a2, &self.coords, &self.box_size)
    }

    /// Whether any primary-index atom pair of the two molecules lies within
    /// the cutoff distance.
    pub fn molecules_in_range(&self, mol1: usize, mol2: usize, cutoff: f64) -> bool {
        let m1 = &self.molecules[mol1];
        let m2 = &self.molecules[mol2];
        let cutoff2 = cutoff * cutoff;

        let primaries = |m: &Molecule| {
            self.primary_indexes[m.primary_start..m.primary_start + m.primary_count].iter()
        };

        primaries(m1).any(|&p1| primaries(m2).any(|&p2| self.dist_squared(p1, p2) <= cutoff2))
    }
}

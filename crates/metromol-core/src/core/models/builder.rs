use super::simbox::{Molecule, SimBox};
use super::topology::{Angle, Bond, ExclusionTable};
use crate::core::utils::geometry::NUM_DIMENSIONS;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum BuildError {
    #[error("box side lengths must be positive, got {0:?}")]
    NonPositiveBoxSide([f64; NUM_DIMENSIONS]),

    #[error("kT must be positive, got {0}")]
    NonPositiveTemperature(f64),

    #[error("move magnitudes must be positive")]
    NonPositiveMoveMagnitude,

    #[error("atoms, bonds, angles, and primary indexes require an open molecule")]
    NoOpenMolecule,

    #[error("molecule {molecule} references unknown type {type_id}")]
    UnknownMoleculeType { molecule: usize, type_id: usize },

    #[error("molecule {molecule} has no atoms")]
    EmptyMolecule { molecule: usize },

    #[error("molecule {molecule} designates no primary-index atoms")]
    MissingPrimaryIndex { molecule: usize },

    #[error("molecule {molecule}: local atom index {index} out of range for {num_atoms} atoms")]
    AtomIndexOutOfRange {
        molecule: usize,
        index: usize,
        num_atoms: usize,
    },

    #[error(
        "molecule {molecule}: exclusion table covers {table_atoms} atoms \
         but the molecule has {num_atoms}"
    )]
    ExclusionTableMismatch {
        molecule: usize,
        table_atoms: usize,
        num_atoms: usize,
    },

    #[error("simulation box contains no molecules")]
    NoMolecules,
}

#[derive(Debug, Clone)]
struct PendingBond {
    atom1: usize,
    atom2: usize,
    length: f64,
    equilibrium: f64,
    force_constant: f64,
    variable: bool,
}

#[derive(Debug, Clone)]
struct PendingAngle {
    end1: usize,
    mid: usize,
    end2: usize,
    size: f64,
    equilibrium: f64,
    force_constant: f64,
    variable: bool,
}

#[derive(Debug, Clone)]
struct PendingMolecule {
    type_id: usize,
    start: usize,
    num_atoms: usize,
    bonds: Vec<PendingBond>,
    angles: Vec<PendingAngle>,
    primaries: Vec<usize>,
}

/// Assembles a [`SimBox`] molecule by molecule.
///
/// Positions, LJ/charge parameters, bonds, angles, and primary indexes are
/// recorded with molecule-local atom indices; [`build`](Self::build) resolves
/// them to the global layout and validates the whole topology in one pass.
#[derive(Debug)]
pub struct SimBoxBuilder {
    box_size: [f64; NUM_DIMENSIONS],
    k_t: f64,
    max_translate: f64,
    max_rotate: f64,
    max_bond_delta: f64,
    max_angle_delta: f64,
    max_intra_moves: usize,

    coords: [Vec<f64>; NUM_DIMENSIONS],
    sigma: Vec<f64>,
    epsilon: Vec<f64>,
    charge: Vec<f64>,

    exclusions: Vec<ExclusionTable>,
    molecules: Vec<PendingMolecule>,
    current: Option<PendingMolecule>,
    misuse: Option<BuildError>,
}

impl SimBoxBuilder {
    pub fn new(box_size: [f64; NUM_DIMENSIONS], k_t: f64) -> Self {
        Self {
            box_size,
            k_t,
            max_translate: 0.5,
            max_rotate: 15.0,
            max_bond_delta: 0.3,
            max_angle_delta: 5.0,
            max_intra_moves: 15,
            coords: Default::default(),
            sigma: Vec::new(),
            epsilon: Vec::new(),
            charge: Vec::new(),
            exclusions: Vec::new(),
            molecules: Vec::new(),
            current: None,
            misuse: None,
        }
    }

    /// Overrides the initial move magnitudes (translation in Å, rotation in
    /// degrees, bond delta in Å, angle delta in degrees).
    pub fn move_magnitudes(
        &mut self,
        translate: f64,
        rotate: f64,
        bond_delta: f64,
        angle_delta: f64,
    ) -> &mut Self {
        self.max_translate = translate;
        self.max_rotate = rotate;
        self.max_bond_delta = bond_delta;
        self.max_angle_delta = angle_delta;
        self
    }

    /// Caps the number of bonds or angles perturbed in one internal batch.
    pub fn max_intra_moves(&mut self, cap: usize) -> &mut Self {
        self.max_intra_moves = cap;
        self
    }

    /// Registers a molecule type's exclusion table and returns its type id.
    pub fn add_molecule_type(&mut self, table: ExclusionTable) -> usize {
        self.exclusions.push(table);
        self.exclusions.len() - 1
    }

    /// Opens a new molecule of the given type; subsequent atoms, bonds,
    /// angles, and primary indexes belong to it until the next call.
    pub fn begin_molecule(&mut self, type_id: usize) -> &mut Self {
        self.finish_current();
        self.current = Some(PendingMolecule {
            type_id,
            start: self.sigma.len(),
            num_atoms: 0,
            bonds: Vec::new(),
            angles: Vec::new(),
            primaries: Vec::new(),
        });
        self
    }

    /// Appends an atom to the open molecule.
    pub fn add_atom(
        &mut self,
        position: [f64; NUM_DIMENSIONS],
        sigma: f64,
        epsilon: f64,
        charge: f64,
    ) -> &mut Self {
        match self.current.as_mut() {
            Some(mol) => {
                for d in 0..NUM_DIMENSIONS {
                    self.coords[d].push(position[d]);
                }
                self.sigma.push(sigma);
                self.epsilon.push(epsilon);
                self.charge.push(charge);
                mol.num_atoms += 1;
            }
            None => self.note_misuse(),
        }
        self
    }

    /// Records a bond between two molecule-local atoms with its current
    /// length, equilibrium length, and force constant.
    pub fn add_bond(
        &mut self,
        atom1: usize,
        atom2: usize,
        length: f64,
        equilibrium: f64,
        force_constant: f64,
        variable: bool,
    ) -> &mut Self {
        match self.current.as_mut() {
            Some(mol) => mol.bonds.push(PendingBond {
                atom1,
                atom2,
                length,
                equilibrium,
                force_constant,
                variable,
            }),
            None => self.note_misuse(),
        }
        self
    }

    /// Records an angle over three molecule-local atoms with its current
    /// size, equilibrium size, and force constant (degrees).
    pub fn add_angle(
        &mut self,
        end1: usize,
        mid: usize,
        end2: usize,
        size: f64,
        equilibrium: f64,
        force_constant: f64,
        variable: bool,
    ) -> &mut Self {
        match self.current.as_mut() {
            Some(mol) => mol.angles.push(PendingAngle {
                end1,
                mid,
                end2,
                size,
                equilibrium,
                force_constant,
                variable,
            }),
            None => self.note_misuse(),
        }
        self
    }

    /// Designates a molecule-local atom as a primary index for cutoff tests
    /// and periodic re-centering.
    pub fn add_primary(&mut self, local_atom: usize) -> &mut Self {
        match self.current.as_mut() {
            Some(mol) => mol.primaries.push(local_atom),
            None => self.note_misuse(),
        }
        self
    }

    /// Validates everything recorded so far and produces the box.
    pub fn build(mut self) -> Result<SimBox, BuildError> {
        self.finish_current();

        if let Some(err) = self.misuse {
            return Err(err);
        }
        if self.box_size.iter().any(|&side| side <= 0.0) {
            return Err(BuildError::NonPositiveBoxSide(self.box_size));
        }
        if self.k_t <= 0.0 {
            return Err(BuildError::NonPositiveTemperature(self.k_t));
        }
        if self.max_translate <= 0.0
            || self.max_rotate <= 0.0
            || self.max_bond_delta <= 0.0
            || self.max_angle_delta <= 0.0
            || self.max_intra_moves == 0
        {
            return Err(BuildError::NonPositiveMoveMagnitude);
        }
        if self.molecules.is_empty() {
            return Err(BuildError::NoMolecules);
        }

        let mut molecules = Vec::with_capacity(self.molecules.len());
        let mut bonds = Vec::new();
        let mut bond_lengths = Vec::new();
        let mut angles = Vec::new();
        let mut angle_sizes = Vec::new();
        let mut primary_indexes = Vec::new();

        for (mol_idx, pending) in self.molecules.iter().enumerate() {
            let num_atoms = pending.num_atoms;
            if num_atoms == 0 {
                return Err(BuildError::EmptyMolecule { molecule: mol_idx });
            }
            let table = self.exclusions.get(pending.type_id).ok_or(
                BuildError::UnknownMoleculeType {
                    molecule: mol_idx,
                    type_id: pending.type_id,
                },
            )?;
            if table.num_atoms() != num_atoms {
                return Err(BuildError::ExclusionTableMismatch {
                    molecule: mol_idx,
                    table_atoms: table.num_atoms(),
                    num_atoms,
                });
            }
            if pending.primaries.is_empty() {
                return Err(BuildError::MissingPrimaryIndex { molecule: mol_idx });
            }

            let check_local = |index: usize| {
                if index < num_atoms {
                    Ok(index)
                } else {
                    Err(BuildError::AtomIndexOutOfRange {
                        molecule: mol_idx,
                        index,
                        num_atoms,
                    })
                }
            };

            let bond_start = bonds.len();
            for bond in &pending.bonds {
                bonds.push(Bond {
                    atom1: pending.start + check_local(bond.atom1)?,
                    atom2: pending.start + check_local(bond.atom2)?,
                    equilibrium: bond.equilibrium,
                    force_constant: bond.force_constant,
                    variable: bond.variable,
                });
                bond_lengths.push(bond.length);
            }

            let angle_start = angles.len();
            for angle in &pending.angles {
                angles.push(Angle {
                    end1: pending.start + check_local(angle.end1)?,
                    mid: pending.start + check_local(angle.mid)?,
                    end2: pending.start + check_local(angle.end2)?,
                    equilibrium: angle.equilibrium,
                    force_constant: angle.force_constant,
                    variable: angle.variable,
                });
                angle_sizes.push(angle.size);
            }

            let primary_start = primary_indexes.len();
            for &local in &pending.primaries {
                primary_indexes.push(pending.start + check_local(local)?);
            }

            molecules.push(Molecule {
                start: pending.start,
                len: num_atoms,
                type_id: pending.type_id,
                bond_start,
                bond_count: pending.bonds.len(),
                angle_start,
                angle_count: pending.angles.len(),
                primary_start,
                primary_count: pending.primaries.len(),
            });
        }

        let max_mol_len = molecules.iter().map(|m| m.len).max().unwrap_or(0);
        let rollback_coords = std::array::from_fn(|_| vec![0.0; max_mol_len]);
        let rollback_bond_lengths = vec![0.0; bond_lengths.len()];
        let rollback_angle_sizes = vec![0.0; angle_sizes.len()];
        let union_parent = vec![0; max_mol_len];

        Ok(SimBox {
            box_size: self.box_size,
            k_t: self.k_t,
            step_num: 0,
            coords: self.coords,
            sigma: self.sigma,
            epsilon: self.epsilon,
            charge: self.charge,
            molecules,
            primary_indexes,
            bonds,
            bond_lengths,
            angles,
            angle_sizes,
            exclusions: self.exclusions,
            rollback_coords,
            rollback_bond_lengths,
            rollback_angle_sizes,
            union_parent,
            max_translate: self.max_translate,
            max_rotate: self.max_rotate,
            max_bond_delta: self.max_bond_delta,
            max_angle_delta: self.max_angle_delta,
            max_intra_moves: self.max_intra_moves,
            num_bond_moves: 0,
            num_accepted_bond_moves: 0,
            num_angle_moves: 0,
            num_accepted_angle_moves: 0,
        })
    }

    fn finish_current(&mut self) {
        if let Some(mol) = self.current.take() {
            self.molecules.push(mol);
        }
    }

    fn note_misuse(&mut self) {
        if self.misuse.is_none() {
            self.misuse = Some(BuildError::NoOpenMolecule);
        }
    }
}

use std::ops::{Add, AddAssign};

/// Decomposed intramolecular energy of one molecule, in kcal/mol.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct EnergyTerm {
    /// Harmonic bond-stretch energy.
    pub bond: f64,
    /// Harmonic angle-bend energy.
    pub angle: f64,
    /// Nonbonded (LJ + Coulomb) energy after 1-2/1-3 masking and 1-4 scaling.
    pub nonbonded: f64,
}

impl EnergyTerm {
    pub fn new(bond: f64, angle: f64, nonbonded: f64) -> Self {
        Self {
            bond,
            angle,
            nonbonded,
        }
    }

    #[inline]
    pub fn total(&self) -> f64 {
        self.bond + self.angle + self.nonbonded
    }
}

impl Add for EnergyTerm {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            bond: self.bond + rhs.bond,
            angle: self.angle + rhs.angle,
            nonbonded: self.nonbonded + rhs.nonbonded,
        }
    }
}

impl AddAssign for EnergyTerm {
    fn add_assign(&mut self, rhs: Self) {
        self.bond += rhs.bond;
        self.angle += rhs.angle;
        self.nonbonded += rhs.nonbonded;
    }
}

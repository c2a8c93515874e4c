/// Harmonic bond between two atoms.
///
/// Endpoints are global atom indices. The stored equilibrium length and force
/// constant drive the `K·(EQ − length)²` energy term; the mutable current
/// length lives in the simulation box so it can be perturbed and rolled back.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub atom1: usize,
    pub atom2: usize,
    /// Equilibrium length in Å.
    pub equilibrium: f64,
    /// Force constant in kcal/(mol·Å²).
    pub force_constant: f64,
    /// Whether this bond participates in internal moves and bond energy.
    pub variable: bool,
}

/// Harmonic angle over three atoms, hinged at `mid`.
///
/// All three are global atom indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Angle {
    pub end1: usize,
    pub mid: usize,
    pub end2: usize,
    /// Equilibrium size in degrees.
    pub equilibrium: f64,
    /// Force constant in kcal/(mol·deg²).
    pub force_constant: f64,
    /// Whether this angle participates in internal moves and angle energy.
    pub variable: bool,
}

/// Per-molecule-type nonbonded masking between topologically close atoms.
///
/// Pairs separated by one or two bonds (1-2, 1-3) are fully masked; pairs
/// separated by three bonds (1-4) are scaled by half. Lookups are keyed on
/// the lower local atom index, so callers must iterate pairs with `i < j`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExclusionTable {
    masked: Vec<Vec<usize>>,
    scaled: Vec<Vec<usize>>,
}

impl ExclusionTable {
    /// Creates an empty table covering `num_atoms` local atom slots.
    pub fn new(num_atoms: usize) -> Self {
        Self {
            masked: vec![Vec::new(); num_atoms],
            scaled: vec![Vec::new(); num_atoms],
        }
    }

    /// Number of local atom slots the table covers.
    pub fn num_atoms(&self) -> usize {
        self.masked.len()
    }

    /// Masks the nonbonded interaction between two local atoms entirely
    /// (1-2 or 1-3 neighbours).
    pub fn mask_pair(&mut self, a: usize, b: usize) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        if !self.masked[lo].contains(&hi) {
            self.masked[lo].push(hi);
        }
    }

    /// Scales the nonbonded interaction between two local atoms by half
    /// (1-4 neighbours).
    pub fn scale_pair(&mut self, a: usize, b: usize) {
        let (lo, hi) = if a < b { (a, b) } else { (b, a) };
        if !self.scaled[lo].contains(&hi) {
            self.scaled[lo].push(hi);
        }
    }

    /// Resolves the scaling applied to the nonbonded interaction of the local
    /// pair `(i, j)`, which must satisfy `i < j`.
    ///
    /// A masked pair wins over a scaled one; unlisted pairs interact fully.
    #[inline]
    pub fn fudge_factor(&self, i: usize, j: usize) -> f64 {
        debug_assert!(i < j, "exclusion lookup requires i < j");
        if self.masked[i].contains(&j) {
            0.0
        } else if self.scaled[i].contains(&j) {
            0.5
        } else {
            1.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unlisted_pairs_interact_fully() {
        let table = ExclusionTable::new(4);
        assert_eq!(table.fudge_factor(0, 3), 1.0);
    }

    #[test]
    fn masked_pairs_contribute_nothing() {
        let mut table = ExclusionTable::new(4);
        table.mask_pair(0, 1);
        assert_eq!(table.fudge_factor(0, 1), 0.0);
    }

    #[test]
    fn scaled_pairs_are_halved() {
        let mut table = ExclusionTable::new(4);
        table.scale_pair(0, 3);
        assert_eq!(table.fudge_factor(0, 3), 0.5);
    }

    #[test]
    fn masking_wins_over_scaling() {
        let mut table = ExclusionTable::new(4);
        table.scale_pair(1, 2);
        table.mask_pair(1, 2);
        assert_eq!(table.fudge_factor(1, 2), 0.0);
    }

    #[test]
    fn pair_order_is_normalized_on_insertion() {
        let mut table = ExclusionTable::new(4);
        table.mask_pair(2, 0);
        assert_eq!(table.fudge_factor(0, 2), 0.0);
    }

    #[test]
    fn duplicate_insertions_are_ignored() {
        let mut table = ExclusionTable::new(4);
        table.mask_pair(0, 1);
        table.mask_pair(1, 0);
        assert_eq!(table.masked[0].len(), 1);
    }
}

/// The Coulomb constant used in electrostatic potential calculations,
/// in kcal·Å/(mol·e²).
pub const COULOMB_CONSTANT: f64 = 332.06;

/// Combines two per-atom parameters into a pair parameter by the geometric
/// mean of their magnitudes.
///
/// When both inputs share a sign this equals `sqrt(a·b)`; a mixed-sign pair
/// has its sign absorbed rather than producing a NaN.
#[inline]
pub fn geometric_blend(a: f64, b: f64) -> f64 {
    (a * b).abs().sqrt()
}

/// Calculates the Lennard-Jones 12-6 potential energy between two atoms.
///
/// Per-atom `σ` and `ε` are blended with [`geometric_blend`]; the energy is
/// `4ε((σ²/r²)⁶ − (σ²/r²)³)`. A coincident pair (`r² = 0`) contributes zero
/// rather than a singularity.
///
/// # Arguments
///
/// * `sigma1`, `epsilon1` - LJ parameters of the first atom.
/// * `sigma2`, `epsilon2` - LJ parameters of the second atom.
/// * `r2` - The squared distance between the atoms.
#[inline]
pub fn lennard_jones(sigma1: f64, epsilon1: f64, sigma2: f64, epsilon2: f64, r2: f64) -> f64 {
    if r2 == 0.0 {
        return 0.0;
    }
    let sigma = geometric_blend(sigma1, sigma2);
    let epsilon = geometric_blend(epsilon1, epsilon2);

    let s2r2 = sigma * sigma / r2;
    let s6r6 = s2r2 * s2r2 * s2r2;
    let s12r12 = s6r6 * s6r6;
    4.0 * epsilon * (s12r12 - s6r6)
}

/// Calculates the Coulomb electrostatic potential energy between two charged
/// atoms, in kcal/mol. A coincident pair (`r = 0`) contributes zero.
///
/// # Arguments
///
/// * `q1`, `q2` - Partial charges in elementary charge units.
/// * `r` - The distance between the atoms in Å.
#[inline]
pub fn coulomb(q1: f64, q2: f64, r: f64) -> f64 {
    if r == 0.0 {
        return 0.0;
    }
    COULOMB_CONSTANT * q1 * q2 / r
}

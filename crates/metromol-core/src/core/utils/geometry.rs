use nalgebra::Vector3;

/// Number of spatial dimensions in the simulation.
pub const NUM_DIMENSIONS: usize = 3;

/// Column-major coordinate storage, indexed `[dimension][atom]`.
///
/// Inner loops iterate over atoms within one dimension, so each dimension
/// owns a contiguous plane.
pub type CoordPlanes = [Vec<f64>; NUM_DIMENSIONS];

/// Wraps a displacement into `[-L/2, L/2]` along one box dimension.
///
/// A single wrap is applied; callers are expected to keep per-step moves
/// below half the box side.
#[inline]
pub fn make_periodic(x: f64, dimension: usize, box_size: &[f64; NUM_DIMENSIONS]) -> f64 {
    let len = box_size[dimension];
    if x < -0.5 * len {
        x + len
    } else if x > 0.5 * len {
        x - len
    } else {
        x
    }
}

/// Squared minimum-image distance between two atoms.
#[inline]
pub fn dist_squared(
    a1: usize,
    a2: usize,
    coords: &CoordPlanes,
    box_size: &[f64; NUM_DIMENSIONS],
) -> f64 {
    let mut r2 = 0.0;
    for d in 0..NUM_DIMENSIONS {
        let delta = make_periodic(coords[d][a2] - coords[d][a1], d, box_size);
        r2 += delta * delta;
    }
    r2
}

/// Reads an atom's position out of the coordinate planes.
#[inline]
pub fn atom_position(atom: usize, coords: &CoordPlanes) -> Vector3<f64> {
    Vector3::new(coords[0][atom], coords[1][atom], coords[2][atom])
}

/// Adds a displacement to an atom's position, elementwise.
#[inline]
pub fn translate_atom(atom: usize, delta: &Vector3<f64>, coords: &mut CoordPlanes) {
    for d in 0..NUM_DIMENSIONS {
        coords[d][atom] += delta[d];
    }
}

/// Rotates an atom about a pivot atom by the given per-axis angles in degrees.
///
/// The axis order is fixed as X, then Y, then Z; the generated trajectory
/// depends on it.
pub fn rotate_atom(
    atom: usize,
    pivot: usize,
    rotation_deg: &Vector3<f64>,
    coords: &mut CoordPlanes,
) {
    let pivot_pos = atom_position(pivot, coords);

    translate_atom(atom, &-pivot_pos, coords);
    rotate_about_x(atom, rotation_deg.x, coords);
    rotate_about_y(atom, rotation_deg.y, coords);
    rotate_about_z(atom, rotation_deg.z, coords);
    translate_atom(atom, &pivot_pos, coords);
}

fn rotate_about_x(atom: usize, angle_deg: f64, coords: &mut CoordPlanes) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let old_y = coords[1][atom];
    let old_z = coords[2][atom];
    coords[1][atom] = old_y * cos + old_z * sin;
    coords[2][atom] = old_z * cos - old_y * sin;
}

fn rotate_about_y(atom: usize, angle_deg: f64, coords: &mut CoordPlanes) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let old_z = coords[2][atom];
    let old_x = coords[0][atom];
    coords[2][atom] = old_z * cos + old_x * sin;
    coords[0][atom] = old_x * cos - old_z * sin;
}

fn rotate_about_z(atom: usize, angle_deg: f64, coords: &mut CoordPlanes) {
    let (sin, cos) = angle_deg.to_radians().sin_cos();
    let old_x = coords[0][atom];
    let old_y = coords[1][atom];
    coords[0][atom] = old_x * cos + old_y * sin;
    coords[1][atom] = old_y * cos - old_x * sin;
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOX: [f64; 3] = [10.0, 10.0, 10.0];

    fn planes_from(positions: &[[f64; 3]]) -> CoordPlanes {
        let mut planes: CoordPlanes = Default::default();
        for pos in positions {
            for d in 0..NUM_DIMENSIONS {
                planes[d].push(pos[d]);
            }
        }
        planes
    }

    #[test]
    fn make_periodic_wraps_displacements_beyond_half_the_box() {
        assert_eq!(make_periodic(6.0, 0, &BOX), -4.0);
        assert_eq!(make_periodic(-6.0, 0, &BOX), 4.0);
        assert_eq!(make_periodic(3.0, 0, &BOX), 3.0);
    }

    #[test]
    fn make_periodic_is_idempotent_within_one_and_a_half_box_lengths() {
        for &x in &[-14.9, -7.3, -5.0, -0.1, 0.0, 4.99, 5.0, 8.2, 14.9] {
            let once = make_periodic(x, 1, &BOX);
            assert_eq!(make_periodic(once, 1, &BOX), once, "x = {x}");
        }
    }

    #[test]
    fn dist_squared_uses_the_minimum_image() {
        let coords = planes_from(&[[1.0, 0.0, 0.0], [9.0, 0.0, 0.0]]);
        // Through the boundary the separation is 2, not 8.
        assert!((dist_squared(0, 1, &coords, &BOX) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn translate_atom_adds_elementwise() {
        let mut coords = planes_from(&[[1.0, 2.0, 3.0]]);
        translate_atom(0, &Vector3::new(0.5, -1.0, 2.0), &mut coords);
        assert_eq!(atom_position(0, &coords), Vector3::new(1.5, 1.0, 5.0));
    }

    #[test]
    fn rotating_ninety_degrees_about_x_sends_y_to_negative_z() {
        let mut coords = planes_from(&[[0.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        rotate_atom(1, 0, &Vector3::new(90.0, 0.0, 0.0), &mut coords);
        let pos = atom_position(1, &coords);
        assert!((pos - Vector3::new(0.0, 0.0, -1.0)).norm() < 1e-12);
    }

    #[test]
    fn rotation_preserves_the_distance_to_the_pivot() {
        let mut coords = planes_from(&[[1.0, -2.0, 0.5], [3.0, 1.0, -1.0]]);
        let before = (atom_position(1, &coords) - atom_position(0, &coords)).norm();
        rotate_atom(1, 0, &Vector3::new(31.0, -113.0, 74.5), &mut coords);
        let after = (atom_position(1, &coords) - atom_position(0, &coords)).norm();
        assert!((before - after).abs() < 1e-10);
    }

    #[test]
    fn rotation_about_the_pivot_leaves_the_pivot_fixed() {
        let mut coords = planes_from(&[[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]]);
        rotate_atom(1, 0, &Vector3::new(45.0, 45.0, 45.0), &mut coords);
        assert_eq!(atom_position(0, &coords), Vector3::new(1.0, 2.0, 3.0));
    }
}

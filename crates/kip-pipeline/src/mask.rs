//! Neighborhood masks and distance weights.
//!
//! A mask decides which offsets `(dx, dy)` within a square of a given
//! radius belong to a neighborhood. A weight maps an offset's rounded
//! distance from the center to a multiplier. Both are plain functions so
//! callers can supply their own shapes and falloffs.

/// Mask predicate: `(radius, dx, dy) -> included`.
pub type Mask = dyn Fn(i64, i64, i64) -> bool;

/// Weight function: `(distance, radius) -> multiplier`.
pub type Weight = dyn Fn(u32, u32) -> f64;

/// Offsets within the Euclidean disc of the radius.
#[must_use]
pub fn circle() -> impl Fn(i64, i64, i64) -> bool {
    |r, dx, dy| dx * dx + dy * dy <= r * r
}

/// Every offset of the `(2r + 1)²` square.
#[must_use]
pub fn square() -> impl Fn(i64, i64, i64) -> bool {
    |_, _, _| true
}

/// The same multiplier for every distance.
#[must_use]
pub fn uniform(multiplier: f64) -> impl Fn(u32, u32) -> f64 {
    move |_, _| multiplier
}

/// Falls linearly from `value` at the center to 0 at the radius.
#[must_use]
pub fn linear(value: f64) -> impl Fn(u32, u32) -> f64 {
    move |distance, radius| {
        if radius == 0 {
            value
        } else {
            value - (value / f64::from(radius)) * f64::from(distance)
        }
    }
}

/// One selected neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset {
    /// Horizontal offset from the center.
    pub dx: i64,
    /// Vertical offset from the center.
    pub dy: i64,
    /// Euclidean distance from the center, rounded.
    pub distance: u32,
}

/// Offsets within `radius` accepted by `mask`, row by row.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn select(radius: u32, mask: &dyn Fn(i64, i64, i64) -> bool) -> Vec<Offset> {
    let r = i64::from(radius);
    let mut offsets = Vec::new();
    for dy in -r..=r {
        for dx in -r..=r {
            if mask(r, dx, dy) {
                let distance = ((dx * dx + dy * dy) as f64).sqrt().round() as u32;
                offsets.push(Offset { dx, dy, distance });
            }
        }
    }
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn circle_of_radius_one_is_a_plus() {
        let offsets = select(1, &circle());
        let coords: Vec<(i64, i64)> = offsets.iter().map(|o| (o.dx, o.dy)).collect();
        assert_eq!(coords, vec![(0, -1), (-1, 0), (0, 0), (1, 0), (0, 1)]);
    }

    #[test]
    fn square_selects_everything() {
        assert_eq!(select(2, &square()).len(), 25);
        assert_eq!(select(0, &square()).len(), 1);
    }

    #[test]
    fn mask_may_borrow_local_state() {
        let limit = 1_i64;
        let within = |_r: i64, dx: i64, dy: i64| dx.abs() <= limit && dy == 0;
        let coords: Vec<(i64, i64)> = select(2, &within).iter().map(|o| (o.dx, o.dy)).collect();
        assert_eq!(coords, vec![(-1, 0), (0, 0), (1, 0)]);
    }

    #[test]
    fn distances_are_rounded() {
        let offsets = select(2, &square());
        let corner = offsets.iter().find(|o| o.dx == 2 && o.dy == 2);
        // sqrt(8) = 2.83
        assert_eq!(corner.map(|o| o.distance), Some(3));
        assert_eq!(offsets[12].distance, 0);
    }

    #[test]
    fn linear_weight_falls_to_zero() {
        let w = linear(1.0);
        assert!((w(0, 4) - 1.0).abs() < f64::EPSILON);
        assert!((w(2, 4) - 0.5).abs() < f64::EPSILON);
        assert!(w(4, 4).abs() < f64::EPSILON);
        assert!((w(0, 0) - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn uniform_weight_ignores_distance() {
        let w = uniform(0.25);
        assert!((w(0, 3) - 0.25).abs() < f64::EPSILON);
        assert!((w(3, 3) - 0.25).abs() < f64::EPSILON);
    }
}

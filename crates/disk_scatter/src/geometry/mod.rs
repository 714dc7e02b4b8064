//! Disk primitive and the geometric kernels behind the PCF estimator.
use std::f32::consts::PI;

use glam::Vec2;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A placed object: circle center and radius, in domain units.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Disk {
    pub x: f32,
    pub y: f32,
    pub r: f32,
}

impl Disk {
    /// Creates a new disk from center coordinates and radius.
    pub fn new(x: f32, y: f32, r: f32) -> Self {
        Self { x, y, r }
    }

    /// Center of the disk.
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    /// Rescales into a smaller domain: position and radius divided uniformly.
    pub fn normalized(self, factor: f32) -> Self {
        Self {
            x: self.x / factor,
            y: self.y / factor,
            r: self.r / factor,
        }
    }
}

#[inline]
pub(crate) fn euclidean(a: &Disk, b: &Disk) -> f32 {
    a.center().distance(b.center())
}

/// Gaussian smoothing kernel used by the density estimator.
#[inline]
pub fn gaussian_kernel(sigma: f32, x: f32) -> f32 {
    (-(x * x) / (sigma * sigma)).exp() / (PI.sqrt() * sigma)
}

/// Density-derived normalization radius: the packing-cell radius for `n`
/// points hexagonally arranged in the unit domain.
pub fn compute_rmax(n: usize) -> f32 {
    (2.0 * (1.0 / (2.0 * 3.0f64.sqrt() * n as f64)).sqrt()) as f32
}

/// Size-aware distance between two disks, normalized by `rmax`.
///
/// Blends center distance with overlap and extent terms so the metric stays
/// sensitive to disk size, not only position. Three regimes: one disk
/// contained in the other, partially overlapping, and separated. The
/// contained regime is gated on a strict inequality, so equal radii fall
/// through to the overlapping regime; pairs whose smaller normalized radius
/// is zero use the separated expression, which has no radius denominator.
/// Symmetric in its disk arguments.
pub fn disk_distance(a: &Disk, b: &Disk, rmax: f32) -> f32 {
    let (r1, r2) = if a.r > b.r { (a.r, b.r) } else { (b.r, a.r) };
    let r1 = r1 / rmax;
    let r2 = r2 / rmax;
    let d = euclidean(a, b) / rmax;
    let extent = (d + r1 + r2).max(2.0 * r1);
    let overlap = (r1 + r2 - d).clamp(0.0, 2.0 * r2);
    let f = extent - overlap + d + r1 - r2;
    if d < r1 - r2 {
        f / (4.0 * r1 - 4.0 * r2)
    } else if d <= r1 + r2 && r2 > 0.0 {
        (f - 4.0 * r1 + 7.0 * r2) / (3.0 * r2)
    } else {
        f - 4.0 * r1 - 2.0 * r2 + 3.0
    }
}

/// Fraction of a circle's perimeter that lies inside the unit domain.
///
/// Per-edge angular exclusion: for each boundary line at distance `dx` from
/// the center, the arc beyond it spans `acos(dx/r)` on either side of the
/// edge normal, clipped by the corner angles toward the two adjacent edges.
/// Returns exactly 1.0 for a circle fully inside the domain, clamped to
/// `[0, 1]` otherwise.
pub fn perimeter_weight(x: f32, y: f32, r: f32) -> f32 {
    let (x, y, r) = (x as f64, y as f64, r as f64);
    let full = 2.0 * std::f64::consts::PI;
    let mut angle = full;
    // (distance to the edge, coordinate along the edge) for all four edges
    let edges = [(x, y), (1.0 - x, y), (y, x), (1.0 - y, x)];
    for (dx, dy) in edges {
        if dx < r {
            let alpha = (dx / r).clamp(-1.0, 1.0).acos();
            angle -= alpha.min(dy.atan2(dx)) + alpha.min((1.0 - dy).atan2(dx));
        }
    }
    (angle / full).clamp(0.0, 1.0) as f32
}

/// Evaluates [`perimeter_weight`] after mapping a `[0, L]` domain onto the
/// unit square (`diskfactor = 1/L`).
#[inline]
pub fn perimeter_weight_scaled(x: f32, y: f32, r: f32, diskfactor: f32) -> f32 {
    perimeter_weight(x * diskfactor, y * diskfactor, r * diskfactor)
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::sampling::rand01;

    #[test]
    fn disk_distance_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let a = Disk::new(rand01(&mut rng), rand01(&mut rng), rand01(&mut rng) * 0.1);
            let b = Disk::new(rand01(&mut rng), rand01(&mut rng), rand01(&mut rng) * 0.1);
            let ab = disk_distance(&a, &b, 0.2);
            let ba = disk_distance(&b, &a, 0.2);
            assert_eq!(ab, ba);
        }
    }

    #[test]
    fn disk_distance_equal_radii_is_finite() {
        let a = Disk::new(0.3, 0.3, 0.05);
        let b = Disk::new(0.3, 0.3, 0.05);
        let d = disk_distance(&a, &b, 0.2);
        assert!(d.is_finite());

        let c = Disk::new(0.32, 0.3, 0.05);
        assert!(disk_distance(&a, &c, 0.2).is_finite());
    }

    #[test]
    fn disk_distance_zero_radii_reduces_to_point_metric() {
        let a = Disk::new(0.2, 0.2, 0.0);
        let b = Disk::new(0.6, 0.2, 0.0);
        // extent = d, overlap = 0, f = 2d, separated regime yields 2d + 3
        let d = euclidean(&a, &b) / 0.2;
        assert!((disk_distance(&a, &b, 0.2) - (2.0 * d + 3.0)).abs() < 1e-5);
    }

    #[test]
    fn disk_distance_grows_with_separation() {
        let a = Disk::new(0.1, 0.5, 0.02);
        let near = Disk::new(0.15, 0.5, 0.02);
        let far = Disk::new(0.6, 0.5, 0.02);
        let rmax = 0.1;
        assert!(disk_distance(&a, &near, rmax) < disk_distance(&a, &far, rmax));
    }

    #[test]
    fn perimeter_weight_is_one_inside_domain() {
        assert_eq!(perimeter_weight(0.5, 0.5, 0.1), 1.0);
        assert_eq!(perimeter_weight(0.2, 0.8, 0.15), 1.0);
    }

    #[test]
    fn perimeter_weight_decreases_toward_corner() {
        let r = 0.2;
        let mut previous = 1.0;
        for &c in &[0.5, 0.3, 0.15, 0.08, 0.02] {
            let w = perimeter_weight(c, c, r);
            assert!((0.0..=1.0).contains(&w));
            assert!(w <= previous);
            previous = w;
        }
        assert!(previous < 1.0);
    }

    #[test]
    fn perimeter_weight_scaled_matches_unit_domain() {
        let w_unit = perimeter_weight(0.1, 0.5, 0.2);
        let w_scaled = perimeter_weight_scaled(0.2, 1.0, 0.4, 0.5);
        assert!((w_unit - w_scaled).abs() < 1e-6);
    }

    #[test]
    fn normalized_round_trips_within_tolerance() {
        let d = Disk::new(1.5, 0.75, 0.3);
        let unit = d.normalized(2.0);
        assert!(unit.x <= 1.0 && unit.y <= 1.0);
        let back = Disk::new(unit.x * 2.0, unit.y * 2.0, unit.r * 2.0);
        assert!((back.x - d.x).abs() < 1e-6);
        assert!((back.y - d.y).abs() < 1e-6);
        assert!((back.r - d.r).abs() < 1e-6);
    }

    #[test]
    fn gaussian_kernel_peaks_at_zero() {
        let sigma = 0.25;
        let peak = gaussian_kernel(sigma, 0.0);
        assert!((peak - 1.0 / (std::f32::consts::PI.sqrt() * sigma)).abs() < 1e-6);
        assert!(gaussian_kernel(sigma, 0.5) < peak);
    }

    #[test]
    fn rmax_shrinks_with_density() {
        assert!(compute_rmax(100) < compute_rmax(10));
        assert!(compute_rmax(1) > 0.0);
    }
}

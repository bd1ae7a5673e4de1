//! Planar ray-casting point-in-ring test.

use crate::models::Coordinate;

/// Whether `point` lies inside the closed `ring`.
///
/// Even-odd rule over the ring's edges, wrapping last to first, so the ring
/// need not repeat its first vertex. Points exactly on an edge may fall
/// either way. Coordinates are treated as planar.
pub fn point_in_ring(point: Coordinate, ring: &[Coordinate]) -> bool {
    let (x, y) = (point.x, point.y);
    let n = ring.len();
    let mut inside = false;

    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + n - 1) % n];
        if (a.y > y) != (b.y > y) && x < (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }

    inside
}

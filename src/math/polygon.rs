//! Operations on simple polygons given as an implicitly closed list of vertices.
//!
//! Polygons may be wound in either direction and need not be convex.

use super::{cross, point_segment_distance, segments_intersect, Point2d};
use crate::util::Interval;
use itertools::Itertools;
use smallvec::SmallVec;
use std::cmp::Ordering;

/// A triangle of a fan decomposition, wound anti-clockwise,
/// together with the sign it contributes to the polygon.
type FanTriangle = ([Point2d; 3], f64);

/// Computes the signed area of a polygon.
/// The area is positive for anti-clockwise winding in a right-handed frame.
pub fn signed_area(points: &[Point2d]) -> f64 {
    if points.len() < 3 {
        return 0.0;
    }
    0.5 * points
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| a.x * b.y - b.x * a.y)
        .sum::<f64>()
}

/// Computes the axis-aligned bounds of a set of points, as `[x, y]` intervals.
pub fn bounds(points: &[Point2d]) -> Option<[Interval<f64>; 2]> {
    let first = points.first()?;
    let init = [Interval::new(first.x, first.x), Interval::new(first.y, first.y)];
    Some(points.iter().fold(init, |[x, y], p| {
        [
            Interval::new(f64::min(x.min, p.x), f64::max(x.max, p.x)),
            Interval::new(f64::min(y.min, p.y), f64::max(y.max, p.y)),
        ]
    }))
}

/// Iterates over the edges of a polygon, including the closing edge.
pub fn edges(points: &[Point2d]) -> impl Iterator<Item = [Point2d; 2]> + '_ {
    points
        .iter()
        .circular_tuple_windows()
        .map(|(a, b)| [*a, *b])
}

/// Determines whether a point lies strictly inside a polygon (even-odd rule).
pub fn contains(points: &[Point2d], point: Point2d) -> bool {
    if points.len() < 3 {
        return false;
    }
    edges(points)
        .filter(|[a, b]| (a.y > point.y) != (b.y > point.y))
        .filter(|[a, b]| {
            let x = a.x + (point.y - a.y) * (b.x - a.x) / (b.y - a.y);
            point.x < x
        })
        .count()
        % 2
        == 1
}

/// Determines whether two polygons share any point, including
/// touching edges and one polygon enclosing the other.
pub fn intersects(a: &[Point2d], b: &[Point2d]) -> bool {
    if a.is_empty() || b.is_empty() {
        return false;
    }
    edges(a).any(|ea| edges(b).any(|eb| segments_intersect(ea, eb)))
        || contains(b, a[0])
        || contains(a, b[0])
}

/// Computes the minimum distance between two polygons.
/// The distance is zero if they intersect, and infinite if either is empty.
pub fn distance(a: &[Point2d], b: &[Point2d]) -> f64 {
    if a.is_empty() || b.is_empty() {
        return f64::INFINITY;
    }
    if intersects(a, b) {
        return 0.0;
    }
    let one_way = |from: &[Point2d], to: &[Point2d]| {
        from.iter()
            .flat_map(|p| edges(to).map(move |[s, e]| point_segment_distance(*p, s, e)))
            .fold(f64::INFINITY, f64::min)
    };
    f64::min(one_way(a, b), one_way(b, a))
}

/// Computes the area of the intersection of two polygons.
///
/// Each polygon is decomposed into a fan of signed triangles, so that the
/// pairwise intersections of the (convex) triangles sum to the area of the
/// intersection of the polygons.
pub fn intersection_area(a: &[Point2d], b: &[Point2d]) -> f64 {
    let (Some([ax, ay]), Some([bx, by])) = (bounds(a), bounds(b)) else {
        return 0.0;
    };
    if !ax.overlaps(&bx) || !ay.overlaps(&by) {
        return 0.0;
    }

    // Evaluate in a fixed argument order so the result is exactly symmetric.
    let (a, b) = if precedes(b, a) { (b, a) } else { (a, b) };

    let (area_a, area_b) = (signed_area(a), signed_area(b));
    if area_a == 0.0 || area_b == 0.0 {
        return 0.0;
    }

    let fan_a = fan(a);
    let fan_b = fan(b);
    let area = fan_intersection_area(&fan_a, &fan_b);
    area * area_a.signum() * area_b.signum()
}

/// Orders polygons lexicographically by their vertices.
fn precedes(a: &[Point2d], b: &[Point2d]) -> bool {
    let coords = |points: &[Point2d]| points.iter().map(|p| (p.x, p.y)).collect::<Vec<_>>();
    coords(a).partial_cmp(&coords(b)) == Some(Ordering::Less)
}

fn fan_intersection_area(fan_a: &[FanTriangle], fan_b: &[FanTriangle]) -> f64 {
    fan_a
        .iter()
        .cartesian_product(fan_b)
        .map(|((ta, sa), (tb, sb))| sa * sb * convex_intersection_area(ta, tb))
        .sum()
}

/// Decomposes a polygon into a fan of triangles around its first vertex.
fn fan(points: &[Point2d]) -> SmallVec<[FanTriangle; 32]> {
    let origin = points[0];
    points[1..]
        .iter()
        .tuple_windows()
        .filter_map(|(p, q)| {
            let area = cross(p - origin, q - origin);
            if area > 0.0 {
                Some(([origin, *p, *q], 1.0))
            } else if area < 0.0 {
                Some(([origin, *q, *p], -1.0))
            } else {
                None
            }
        })
        .collect()
}

/// Computes the area of the intersection of two anti-clockwise triangles,
/// clipping one against the other.
fn convex_intersection_area(subject: &[Point2d; 3], clip: &[Point2d; 3]) -> f64 {
    let mut poly: SmallVec<[Point2d; 12]> = SmallVec::from_slice(subject);

    for (&e0, &e1) in clip.iter().circular_tuple_windows() {
        if poly.is_empty() {
            return 0.0;
        }
        let edge = e1 - e0;
        let inside = |p: Point2d| cross(edge, p - e0) >= 0.0;
        let crossing = |p: Point2d, q: Point2d| {
            let dir = q - p;
            let t = cross(edge, e0 - p) / cross(edge, dir);
            p + t * dir
        };

        let input = std::mem::take(&mut poly);
        for (&p, &q) in input.iter().circular_tuple_windows() {
            match (inside(p), inside(q)) {
                (true, true) => poly.push(q),
                (true, false) => poly.push(crossing(p, q)),
                (false, true) => {
                    poly.push(crossing(p, q));
                    poly.push(q);
                }
                (false, false) => {}
            }
        }
    }

    signed_area(&poly).abs()
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn rect(x0: f64, y0: f64, x1: f64, y1: f64) -> Vec<Point2d> {
        vec![
            Point2d::new(x0, y0),
            Point2d::new(x1, y0),
            Point2d::new(x1, y1),
            Point2d::new(x0, y1),
        ]
    }

    /// An L shape covering [0, 4] x [0, 1] and [0, 1] x [0, 4].
    fn ell() -> Vec<Point2d> {
        [(0.0, 0.0), (4.0, 0.0), (4.0, 1.0), (1.0, 1.0), (1.0, 4.0), (0.0, 4.0)]
            .into_iter()
            .map(|(x, y)| Point2d::new(x, y))
            .collect()
    }

    #[test]
    fn area_of_rectangle() {
        let r = rect(0.0, 0.0, 2.0, 3.0);
        assert_approx_eq!(signed_area(&r), 6.0);
        let mut rev = r.clone();
        rev.reverse();
        assert_approx_eq!(signed_area(&rev), -6.0);
        assert_approx_eq!(signed_area(&ell()), 7.0);
    }

    #[test]
    fn rectangle_intersection() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(1.0, 1.0, 3.0, 3.0);
        assert_approx_eq!(intersection_area(&a, &b), 1.0);

        let mut b_cw = b.clone();
        b_cw.reverse();
        assert_approx_eq!(intersection_area(&a, &b_cw), 1.0);
        assert_approx_eq!(intersection_area(&b_cw, &a), 1.0);
    }

    #[test]
    fn non_convex_intersection() {
        // The square's corner sits in the notch of the L
        let square = rect(2.0, 2.0, 3.0, 3.0);
        assert_approx_eq!(intersection_area(&ell(), &square), 0.0);

        let square = rect(0.5, 0.5, 2.5, 2.5);
        // [0.5, 2.5] x [0.5, 1] + [0.5, 1] x [1, 2.5]
        assert_approx_eq!(intersection_area(&ell(), &square), 1.0 + 0.75);
    }

    #[test]
    fn touching_edges_have_no_area() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(1.0, 0.0, 2.0, 1.0);
        assert_approx_eq!(intersection_area(&a, &b), 0.0);
        assert!(intersects(&a, &b));
        assert_approx_eq!(distance(&a, &b), 0.0);
    }

    #[test]
    fn polygon_distance() {
        let a = rect(0.0, 0.0, 1.0, 1.0);
        let b = rect(4.0, 5.0, 6.0, 6.0);
        assert_approx_eq!(distance(&a, &b), 5.0);
        assert_approx_eq!(distance(&b, &a), 5.0);

        let inner = rect(0.25, 0.25, 0.75, 0.75);
        assert_approx_eq!(distance(&a, &inner), 0.0);
        assert_approx_eq!(distance(&inner, &a), 0.0);

        assert_eq!(distance(&a, &[]), f64::INFINITY);
    }

    #[test]
    fn point_in_polygon() {
        assert!(contains(&ell(), Point2d::new(0.5, 3.0)));
        assert!(contains(&ell(), Point2d::new(3.0, 0.5)));
        assert!(!contains(&ell(), Point2d::new(2.0, 2.0)));
    }
}

use super::{Point2d, Point3d, Vector2d, Vector3d};
use cgmath::prelude::*;

/// Rotates a vector 90 degrees clockwise (in the simulator's left-handed frame).
pub fn rot90(vec: Vector2d) -> Vector2d {
    Vector2d::new(-vec.y, vec.x)
}

/// Projects a world space point onto the ground plane.
pub fn ground(point: Point3d) -> Point2d {
    Point2d::new(point.x, point.y)
}

/// Projects a vector onto the ground plane and normalises it.
/// Returns `None` if the projection has no length.
pub fn ground_dir(vec: Vector3d) -> Option<Vector2d> {
    let vec = Vector2d::new(vec.x, vec.y);
    let mag2 = vec.magnitude2();
    (mag2 > f64::EPSILON).then(|| vec / mag2.sqrt())
}

/// The z component of the cross product of two 2D vectors.
#[inline(always)]
pub fn cross(a: Vector2d, b: Vector2d) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Computes the distance between a point and a line segment.
///
/// # Parameters
/// * `point` - The point
/// * `start` - The first end point of the segment
/// * `end` - The second end point of the segment
pub fn point_segment_distance(point: Point2d, start: Point2d, end: Point2d) -> f64 {
    let seg = end - start;
    let len2 = seg.magnitude2();
    if len2 <= f64::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(seg) / len2).clamp(0.0, 1.0);
    point.distance(start + t * seg)
}

/// Determines whether two closed line segments touch or cross.
pub fn segments_intersect(a: [Point2d; 2], b: [Point2d; 2]) -> bool {
    let side = |p: Point2d, q: Point2d, r: Point2d| cross(q - p, r - p);
    let on_segment = |p: Point2d, q: Point2d, r: Point2d| {
        r.x >= f64::min(p.x, q.x)
            && r.x <= f64::max(p.x, q.x)
            && r.y >= f64::min(p.y, q.y)
            && r.y <= f64::max(p.y, q.y)
    };

    let d1 = side(b[0], b[1], a[0]);
    let d2 = side(b[0], b[1], a[1]);
    let d3 = side(a[0], a[1], b[0]);
    let d4 = side(a[0], a[1], b[1]);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(b[0], b[1], a[0]))
        || (d2 == 0.0 && on_segment(b[0], b[1], a[1]))
        || (d3 == 0.0 && on_segment(a[0], a[1], b[0]))
        || (d4 == 0.0 && on_segment(a[0], a[1], b[1]))
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    #[test]
    fn segment_distance() {
        let a = Point2d::new(0.0, 0.0);
        let b = Point2d::new(4.0, 0.0);
        assert_approx_eq!(point_segment_distance(Point2d::new(2.0, 3.0), a, b), 3.0);
        assert_approx_eq!(point_segment_distance(Point2d::new(-3.0, 4.0), a, b), 5.0);
        assert_approx_eq!(point_segment_distance(Point2d::new(1.0, 1.0), a, a), 2f64.sqrt());
    }

    #[test]
    fn crossing_segments() {
        let p = |x, y| Point2d::new(x, y);
        assert!(segments_intersect([p(0.0, 0.0), p(2.0, 2.0)], [p(0.0, 2.0), p(2.0, 0.0)]));
        assert!(segments_intersect([p(0.0, 0.0), p(2.0, 0.0)], [p(2.0, 0.0), p(3.0, 1.0)]));
        assert!(!segments_intersect([p(0.0, 0.0), p(1.0, 0.0)], [p(2.0, 0.0), p(3.0, 0.0)]));
        assert!(!segments_intersect([p(0.0, 0.0), p(1.0, 1.0)], [p(0.0, 1.0), p(0.4, 0.6)]));
    }

    #[test]
    fn ground_direction() {
        let dir = ground_dir(Vector3d::new(3.0, 4.0, 10.0)).unwrap();
        assert_approx_eq!(dir.x, 0.6);
        assert_approx_eq!(dir.y, 0.8);
        assert!(ground_dir(Vector3d::new(0.0, 0.0, 1.0)).is_none());
    }
}

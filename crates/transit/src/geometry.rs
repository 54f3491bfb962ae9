//! Planar vector operations and point-to-path projection.
//!
//! Coordinates are treated as Euclidean; no map projection is applied.

use geo::Coord;

/// Cosine above which a point counts as collinear with a segment (~2.5°).
pub const COLLINEAR_COSINE: f64 = 0.999;

pub fn sub(a: Coord<f64>, b: Coord<f64>) -> Coord<f64> {
    Coord { x: a.x - b.x, y: a.y - b.y }
}

pub fn dot(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.x + a.y * b.y
}

pub fn norm(v: Coord<f64>) -> f64 {
    dot(v, v).sqrt()
}

pub fn distance(a: Coord<f64>, b: Coord<f64>) -> f64 {
    norm(sub(a, b))
}

/// Cosine of the angle between two vectors, `None` if either is zero.
pub fn cosine(a: Coord<f64>, b: Coord<f64>) -> Option<f64> {
    let len = norm(a) * norm(b);
    if len == 0.0 {
        return None;
    }
    Some(dot(a, b) / len)
}

/// Total length of a polyline
pub fn polyline_length(coords: &[Coord<f64>]) -> f64 {
    coords.windows(2).map(|w| distance(w[0], w[1])).sum()
}

/// Squared distance from `p` to the segment `a`-`b`
pub fn segment_distance_2(p: Coord<f64>, a: Coord<f64>, b: Coord<f64>) -> f64 {
    let ab = sub(b, a);
    let ap = sub(p, a);
    let ab_ab = dot(ab, ab);

    if ab_ab == 0.0 {
        return dot(ap, ap);
    }

    let t = (dot(ab, ap) / ab_ab).clamp(0.0, 1.0);
    let closest = Coord { x: a.x + t * ab.x, y: a.y + t * ab.y };
    let d = sub(p, closest);
    dot(d, d)
}

/// Where a point sits on a polyline
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointOnPath {
    /// Segment `[coords[i], coords[i + 1]]` holding the point
    pub segment_index: usize,
    /// Length along the polyline from its first point
    pub distance: f64,
}

/// Offset of `p` along segment `a`-`b` if it lies on it.
///
/// `p` is on the segment when it falls between the ends (both end cosines are
/// non-negative) and the larger cosine reaches `threshold`.
pub fn project_onto_segment(
    p: Coord<f64>,
    a: Coord<f64>,
    b: Coord<f64>,
    threshold: f64,
) -> Option<f64> {
    let ab = sub(b, a);
    let ap = sub(p, a);
    if norm(ap) == 0.0 {
        return Some(0.0);
    }

    let from_start = cosine(ab, ap)?;
    let from_end = match cosine(sub(a, b), sub(p, b)) {
        Some(cos) => cos,
        // p == b
        None => return Some(norm(ab)),
    };

    if from_start < 0.0 || from_end < 0.0 || from_start.max(from_end) < threshold {
        return None;
    }

    Some(dot(ab, ap) / norm(ab))
}

/// Coordinate at a located position of a polyline
pub fn point_at(coords: &[Coord<f64>], at: &PointOnPath) -> Option<Coord<f64>> {
    let a = *coords.get(at.segment_index)?;
    let b = *coords.get(at.segment_index + 1)?;
    let before = polyline_length(&coords[..=at.segment_index]);
    let seg_len = distance(a, b);
    let t = ((at.distance - before) / seg_len).clamp(0.0, 1.0);
    if t == 0.0 {
        return Some(a);
    }
    if t == 1.0 {
        return Some(b);
    }
    Some(Coord { x: a.x + (b.x - a.x) * t, y: a.y + (b.y - a.y) * t })
}

/// Locate `point` on the polyline `coords` with the default threshold.
pub fn check_point_on_path(point: Coord<f64>, coords: &[Coord<f64>]) -> Option<PointOnPath> {
    check_point_on_path_with(point, coords, COLLINEAR_COSINE)
}

/// Locate `point` on the polyline `coords`.
///
/// A point on a shared vertex belongs to the segment starting there, except
/// for the last vertex which belongs to the last segment.
pub fn check_point_on_path_with(
    point: Coord<f64>,
    coords: &[Coord<f64>],
    threshold: f64,
) -> Option<PointOnPath> {
    let last = coords.len().checked_sub(2)?;
    let mut walked = 0.0;

    for (i, w) in coords.windows(2).enumerate() {
        let (a, b) = (w[0], w[1]);
        let seg_len = distance(a, b);

        if point == b && i != last {
            walked += seg_len;
            continue;
        }

        if let Some(offset) = project_onto_segment(point, a, b, threshold) {
            return Some(PointOnPath {
                segment_index: i,
                distance: walked + offset,
            });
        }
        walked += seg_len;
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn c(x: f64, y: f64) -> Coord<f64> {
        Coord { x, y }
    }

    fn sample_path() -> Vec<Coord<f64>> {
        vec![c(0.0, 0.0), c(3.0, 4.0), c(6.0, 8.0), c(8.0, 8.0)]
    }

    #[test]
    fn test_point_on_vertex() {
        let hit = check_point_on_path(c(3.0, 4.0), &sample_path()).unwrap();
        assert_eq!(hit.segment_index, 1);
        assert_relative_eq!(hit.distance, 5.0);
    }

    #[test]
    fn test_point_off_line() {
        assert!(check_point_on_path(c(1.0, 1.0), &sample_path()).is_none());
    }

    #[test]
    fn test_point_inside_segment() {
        let hit = check_point_on_path(c(7.0, 8.0), &sample_path()).unwrap();
        assert_eq!(hit.segment_index, 2);
        assert_relative_eq!(hit.distance, 11.0);
    }

    #[test]
    fn test_path_ends() {
        let path = sample_path();
        let start = check_point_on_path(c(0.0, 0.0), &path).unwrap();
        assert_eq!(start.segment_index, 0);
        assert_relative_eq!(start.distance, 0.0);

        let end = check_point_on_path(c(8.0, 8.0), &path).unwrap();
        assert_eq!(end.segment_index, 2);
        assert_relative_eq!(end.distance, 12.0);
    }

    #[test]
    fn test_point_beyond_end() {
        assert!(check_point_on_path(c(9.0, 8.0), &sample_path()).is_none());
    }

    #[test]
    fn test_point_at() {
        let path = sample_path();
        let at = PointOnPath { segment_index: 2, distance: 11.0 };
        assert_eq!(point_at(&path, &at), Some(c(7.0, 8.0)));
        let at = PointOnPath { segment_index: 1, distance: 5.0 };
        assert_eq!(point_at(&path, &at), Some(c(3.0, 4.0)));
        let at = PointOnPath { segment_index: 3, distance: 12.0 };
        assert_eq!(point_at(&path, &at), None);
    }

    #[test]
    fn test_segment_distance() {
        assert_relative_eq!(segment_distance_2(c(5.0, 3.0), c(0.0, 0.0), c(10.0, 0.0)), 9.0);
        assert_relative_eq!(segment_distance_2(c(-1.0, 0.0), c(0.0, 0.0), c(10.0, 0.0)), 1.0);
        assert_relative_eq!(polyline_length(&sample_path()), 12.0);
    }
}

//! Point-set geometry and path construction.

use orangeface_face_model::{Point2D, PointSet};
use serde::Serialize;

/// One drawing command of a backend-neutral path.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PathCommand {
    MoveTo { to: Point2D },
    LineTo { to: Point2D },
    CubicTo {
        ctrl1: Point2D,
        ctrl2: Point2D,
        to: Point2D,
    },
    /// Straight edge back to the last `MoveTo` point.
    Close,
}

impl PathCommand {
    /// The on-curve point this command ends at, if any.
    pub fn end_point(&self) -> Option<Point2D> {
        match *self {
            PathCommand::MoveTo { to }
            | PathCommand::LineTo { to }
            | PathCommand::CubicTo { to, .. } => Some(to),
            PathCommand::Close => None,
        }
    }
}

/// Ordered list of path commands.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PathSpec {
    commands: Vec<PathCommand>,
}

impl PathSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
        }
    }

    pub fn move_to(&mut self, to: Point2D) {
        self.commands.push(PathCommand::MoveTo { to });
    }

    pub fn line_to(&mut self, to: Point2D) {
        self.commands.push(PathCommand::LineTo { to });
    }

    pub fn cubic_to(&mut self, ctrl1: Point2D, ctrl2: Point2D, to: Point2D) {
        self.commands.push(PathCommand::CubicTo { ctrl1, ctrl2, to });
    }

    pub fn close(&mut self) {
        self.commands.push(PathCommand::Close);
    }

    pub fn commands(&self) -> &[PathCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Whether the path ends with an explicit close.
    pub fn is_closed(&self) -> bool {
        matches!(self.commands.last(), Some(PathCommand::Close))
    }

    /// The on-curve points in visiting order.
    pub fn vertices(&self) -> Vec<Point2D> {
        self.commands.iter().filter_map(PathCommand::end_point).collect()
    }
}

/// Arithmetic mean of all points.
///
/// Callers must pass at least one point; an empty slice yields NaN
/// coordinates rather than a panic.
pub fn centroid(points: &[Point2D]) -> Point2D {
    debug_assert!(!points.is_empty(), "centroid of an empty point set");
    let sum = points
        .iter()
        .fold(Point2D::ORIGIN, |acc, &point| acc + point);
    let n = points.len() as f64;
    Point2D::new(sum.x / n, sum.y / n)
}

/// Move every point radially about the centroid: `center + (p - center) * factor`.
///
/// `factor > 1.0` grows the set, `factor < 1.0` shrinks it, and `1.0`
/// returns the input unchanged. Order and length are preserved.
pub fn expand_about_centroid(points: &[Point2D], factor: f64) -> PointSet {
    if points.is_empty() || factor == 1.0 {
        return points.to_vec();
    }
    let center = centroid(points);
    points
        .iter()
        .map(|&point| center + (point - center) * factor)
        .collect()
}

/// Index of the point maximizing `selector`; the first index wins ties.
pub fn extremum_index<F>(points: &[Point2D], selector: F) -> Option<usize>
where
    F: Fn(&Point2D) -> f64,
{
    let mut best: Option<(usize, f64)> = None;
    for (index, point) in points.iter().enumerate() {
        let value = selector(point);
        if value.is_nan() {
            continue;
        }
        if best.map_or(true, |(_, best_value)| value > best_value) {
            best = Some((index, value));
        }
    }
    best.map(|(index, _)| index)
}

/// Circularly rotate `points` so that `start` becomes index 0.
pub fn rotate_to_start(points: &[Point2D], start: usize) -> PointSet {
    if points.is_empty() {
        return Vec::new();
    }
    let start = start % points.len();
    let mut rotated = Vec::with_capacity(points.len());
    rotated.extend_from_slice(&points[start..]);
    rotated.extend_from_slice(&points[..start]);
    rotated
}

/// Rotate the sequence so the point maximizing `selector` comes first.
///
/// This is a rotation, not a sort: relative order is kept.
pub fn reorder_from_extremum<F>(points: &[Point2D], selector: F) -> PointSet
where
    F: Fn(&Point2D) -> f64,
{
    match extremum_index(points, selector) {
        Some(start) => rotate_to_start(points, start),
        None => points.to_vec(),
    }
}

/// Closed path through `points` using one cubic segment per edge.
///
/// Control points sit at 1/3 and 2/3 along each straight edge, so the
/// curve runs are geometrically straight. The final edge back to the first
/// point is the implicit close.
pub fn smooth_closed_path(points: &[Point2D]) -> PathSpec {
    let mut path = PathSpec::with_capacity(points.len() + 1);
    let Some(&first) = points.first() else {
        return path;
    };

    path.move_to(first);
    for pair in points.windows(2) {
        let (p0, p1) = (pair[0], pair[1]);
        path.cubic_to(
            Point2D::lerp(&p0, &p1, 1.0 / 3.0),
            Point2D::lerp(&p0, &p1, 2.0 / 3.0),
            p1,
        );
    }
    path.close();
    path
}

/// Closed polygon through `points` with straight edges.
pub fn polygon_closed_path(points: &[Point2D]) -> PathSpec {
    let mut path = PathSpec::with_capacity(points.len() + 1);
    let Some(&first) = points.first() else {
        return path;
    };

    path.move_to(first);
    for &point in &points[1..] {
        path.line_to(point);
    }
    path.close();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point2D> {
        vec![
            Point2D::new(0.0, 0.0),
            Point2D::new(2.0, 0.0),
            Point2D::new(2.0, 2.0),
            Point2D::new(0.0, 2.0),
        ]
    }

    #[test]
    fn test_centroid_of_square() {
        assert_eq!(centroid(&square()), Point2D::new(1.0, 1.0));
    }

    #[test]
    fn test_expand_doubles_offsets() {
        let expanded = expand_about_centroid(&square(), 2.0);
        assert_eq!(expanded[0], Point2D::new(-1.0, -1.0));
        assert_eq!(expanded[2], Point2D::new(3.0, 3.0));
    }

    #[test]
    fn test_expand_shrinks_below_one() {
        let shrunk = expand_about_centroid(&square(), 0.5);
        assert_eq!(shrunk[0], Point2D::new(0.5, 0.5));
    }

    #[test]
    fn test_expand_identity_is_exact() {
        let points = vec![Point2D::new(0.1, 0.7), Point2D::new(0.3, 0.2)];
        assert_eq!(expand_about_centroid(&points, 1.0), points);
    }

    #[test]
    fn test_reorder_picks_lowest_on_screen() {
        let points = vec![
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 5.0),
            Point2D::new(2.0, 3.0),
        ];
        let reordered = reorder_from_extremum(&points, |p| p.y);
        assert_eq!(reordered, vec![points[1], points[2], points[0]]);
    }

    #[test]
    fn test_reorder_tie_takes_first_index() {
        let points = vec![
            Point2D::new(0.0, 1.0),
            Point2D::new(1.0, 4.0),
            Point2D::new(2.0, 4.0),
        ];
        assert_eq!(extremum_index(&points, |p| p.y), Some(1));
    }

    #[test]
    fn test_extremum_ignores_nan() {
        let points = vec![Point2D::new(0.0, f64::NAN), Point2D::new(0.0, 2.0)];
        assert_eq!(extremum_index(&points, |p| p.y), Some(1));
        assert_eq!(extremum_index(&[], |p: &Point2D| p.y), None);
    }

    #[test]
    fn test_rotate_wraps_start() {
        let points = square();
        assert_eq!(rotate_to_start(&points, 4), points);
        assert_eq!(rotate_to_start(&points, 1)[0], points[1]);
    }

    #[test]
    fn test_smooth_path_shape() {
        let path = smooth_closed_path(&square());
        assert_eq!(path.len(), 5);
        assert!(path.is_closed());
        assert_eq!(path.vertices(), square());
        match path.commands()[1] {
            PathCommand::CubicTo { ctrl1, ctrl2, to } => {
                assert!((ctrl1.x - 2.0 / 3.0).abs() < 1e-12);
                assert!((ctrl2.x - 4.0 / 3.0).abs() < 1e-12);
                assert_eq!(to, Point2D::new(2.0, 0.0));
            }
            other => panic!("expected cubic segment, got {other:?}"),
        }
    }

    #[test]
    fn test_polygon_path_uses_lines() {
        let path = polygon_closed_path(&square());
        assert_eq!(path.len(), 5);
        assert!(path.is_closed());
        assert!(path.commands()[1..4]
            .iter()
            .all(|c| matches!(c, PathCommand::LineTo { .. })));
    }

    #[test]
    fn test_empty_paths() {
        assert!(smooth_closed_path(&[]).is_empty());
        assert!(polygon_closed_path(&[]).is_empty());
    }
}

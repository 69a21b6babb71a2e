use orangeface_contour::contour::{build_eye_contour, DEFAULT_EYE_PADDING};
use orangeface_contour::geometry::{
    centroid, expand_about_centroid, reorder_from_extremum, smooth_closed_path,
};
use orangeface_face_model::Point2D;
use proptest::prelude::*;

fn point() -> impl Strategy<Value = Point2D> {
    (-2000.0f64..2000.0, -2000.0f64..2000.0).prop_map(|(x, y)| Point2D::new(x, y))
}

fn point_set(min: usize) -> impl Strategy<Value = Vec<Point2D>> {
    prop::collection::vec(point(), min..24)
}

fn close(a: Point2D, b: Point2D) -> bool {
    let scale = 1.0 + a.x.abs().max(a.y.abs()).max(b.x.abs()).max(b.y.abs());
    a.distance_to(&b) <= 1e-9 * scale
}

fn sorted(mut points: Vec<Point2D>) -> Vec<Point2D> {
    points.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.y.total_cmp(&b.y)));
    points
}

proptest! {
    #[test]
    fn expansion_by_one_is_identity(points in point_set(1)) {
        prop_assert_eq!(expand_about_centroid(&points, 1.0), points);
    }

    #[test]
    fn expansion_preserves_centroid(points in point_set(1), factor in 0.1f64..4.0) {
        let before = centroid(&points);
        let after = centroid(&expand_about_centroid(&points, factor));
        prop_assert!(close(before, after), "{:?} vs {:?}", before, after);
    }

    #[test]
    fn reorder_is_a_rotation_starting_at_max(points in point_set(1)) {
        let reordered = reorder_from_extremum(&points, |p| p.y);
        prop_assert_eq!(sorted(reordered.clone()), sorted(points.clone()));

        let max_y = points.iter().map(|p| p.y).fold(f64::NEG_INFINITY, f64::max);
        let first_max = points.iter().position(|p| p.y == max_y).unwrap();
        prop_assert_eq!(reordered[0], points[first_max]);

        let n = points.len();
        for (i, p) in reordered.iter().enumerate() {
            prop_assert_eq!(*p, points[(first_max + i) % n]);
        }
    }

    #[test]
    fn smooth_path_is_closed_and_proportional(points in point_set(1)) {
        let path = smooth_closed_path(&points);
        prop_assert_eq!(path.len(), points.len() + 1);
        prop_assert!(path.is_closed());
        prop_assert_eq!(path.vertices(), points);
    }

    #[test]
    fn eye_contour_is_deterministic(points in point_set(3)) {
        let first = build_eye_contour(&points, DEFAULT_EYE_PADDING).unwrap();
        let second = build_eye_contour(&points, DEFAULT_EYE_PADDING).unwrap();
        prop_assert_eq!(first, second);
    }
}

#[test]
fn four_point_eye_is_reordered_and_padded() {
    let eye = vec![
        Point2D::new(100.0, 200.0),
        Point2D::new(110.0, 196.0),
        Point2D::new(120.0, 212.0),
        Point2D::new(110.0, 204.0),
    ];
    let center = centroid(&eye);

    let reordered = reorder_from_extremum(&eye, |p| p.y);
    assert_eq!(reordered[0], Point2D::new(120.0, 212.0));
    assert_eq!(reordered[1], Point2D::new(110.0, 204.0));

    let padded = expand_about_centroid(&reordered, 1.8);
    for (raw, moved) in reordered.iter().zip(&padded) {
        let original_offset = *raw - center;
        let extra = *moved - *raw;
        assert!((extra.x - original_offset.x * 0.8).abs() < 1e-9);
        assert!((extra.y - original_offset.y * 0.8).abs() < 1e-9);
    }

    let path = build_eye_contour(&eye, 1.8).unwrap();
    assert_eq!(path.vertices(), padded);
}

use orangeface_face_model::{BoundingBox, FaceLandmarks, Point2D};
use proptest::prelude::*;

fn bbox() -> impl Strategy<Value = BoundingBox> {
    (-500.0..500.0f64, -500.0..500.0f64, 1.0..800.0f64, 1.0..800.0f64)
        .prop_map(|(x, y, w, h)| BoundingBox::new(x, y, w, h))
}

proptest! {
    #[test]
    fn centered_square_keeps_center(b in bbox(), scale in 0.5..3.0f64) {
        let square = b.centered_square(scale);
        let (before, after) = (b.center(), square.center());
        prop_assert!((before.x - after.x).abs() < 1e-9);
        prop_assert!((before.y - after.y).abs() < 1e-9);
        prop_assert!((square.width - b.width * scale).abs() < 1e-9);
        prop_assert_eq!(square.width, square.height);
    }

    #[test]
    fn lerp_hits_endpoints(
        ax in -1e3..1e3f64, ay in -1e3..1e3f64,
        bx in -1e3..1e3f64, by in -1e3..1e3f64,
    ) {
        let (a, b) = (Point2D::new(ax, ay), Point2D::new(bx, by));
        prop_assert!(Point2D::lerp(&a, &b, 0.0).distance_to(&a) < 1e-9);
        prop_assert!(Point2D::lerp(&a, &b, 1.0).distance_to(&b) < 1e-9);
    }

    #[test]
    fn only_68_point_sets_split(len in 0usize..140) {
        let points: Vec<Point2D> = (0..len).map(|i| Point2D::new(i as f64, 0.0)).collect();
        let split = FaceLandmarks::from_68_points(&points);
        prop_assert_eq!(split.is_some(), len == 68);
        if let Some(landmarks) = split {
            prop_assert_eq!(landmarks.left_eye.len() + landmarks.right_eye.len(), 12);
            prop_assert_eq!(landmarks.mouth.len(), 20);
            prop_assert_eq!(landmarks.left_eye[0].x, 36.0);
        }
    }
}

/// A detected face's axis-aligned bounding box in frame pixel coordinates.
///
/// Invariants (enforced by the constructors): the box lies fully inside the
/// frame and has strictly positive extent. `confidence` is present only for
/// probabilistic detectors; the cascade detector leaves it `None`.
#[derive(Clone, Debug, PartialEq)]
pub struct FaceRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub confidence: Option<f32>,
}

impl FaceRegion {
    /// Clamps a raw `(x, y, width, height)` box to the frame.
    ///
    /// Returns `None` when nothing of the box remains inside the frame.
    pub fn clamped(
        x: i64,
        y: i64,
        width: i64,
        height: i64,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        Self::from_ltrb(
            x as f64,
            y as f64,
            (x + width) as f64,
            (y + height) as f64,
            frame_width,
            frame_height,
        )
    }

    /// Converts a `(left, top, right, bottom)` box to `(x, y, width, height)`,
    /// clamped to the frame.
    ///
    /// Width derives from the horizontal extent (`right - left`) and height
    /// from the vertical extent (`bottom - top`).
    pub fn from_ltrb(
        left: f64,
        top: f64,
        right: f64,
        bottom: f64,
        frame_width: u32,
        frame_height: u32,
    ) -> Option<Self> {
        let left = left.max(0.0).min(frame_width as f64);
        let top = top.max(0.0).min(frame_height as f64);
        let right = right.max(0.0).min(frame_width as f64);
        let bottom = bottom.max(0.0).min(frame_height as f64);

        let x = left.floor() as u32;
        let y = top.floor() as u32;
        let width = (right.floor() as u32).saturating_sub(x);
        let height = (bottom.floor() as u32).saturating_sub(y);

        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            x,
            y,
            width,
            height,
            confidence: None,
        })
    }

    pub fn with_confidence(mut self, confidence: f32) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_clamped_box_inside_frame_unchanged() {
        let r = FaceRegion::clamped(10, 20, 30, 40, 100, 100).unwrap();
        assert_eq!((r.x, r.y, r.width, r.height), (10, 20, 30, 40));
        assert_eq!(r.confidence, None);
    }

    #[test]
    fn test_clamped_negative_origin_trimmed() {
        // Box starts 5px off the left edge and 3px off the top
        let r = FaceRegion::clamped(-5, -3, 30, 40, 100, 100).unwrap();
        assert_eq!((r.x, r.y, r.width, r.height), (0, 0, 25, 37));
    }

    #[test]
    fn test_clamped_overflow_trimmed_to_frame() {
        let r = FaceRegion::clamped(90, 95, 30, 40, 100, 100).unwrap();
        assert_eq!((r.x, r.y, r.width, r.height), (90, 95, 10, 5));
    }

    #[rstest]
    #[case::fully_left(-50, 10, 20, 20)]
    #[case::fully_above(10, -50, 20, 20)]
    #[case::fully_right(150, 10, 20, 20)]
    #[case::fully_below(10, 150, 20, 20)]
    #[case::zero_width(10, 10, 0, 20)]
    #[case::zero_height(10, 10, 20, 0)]
    fn test_clamped_degenerate_is_none(
        #[case] x: i64,
        #[case] y: i64,
        #[case] w: i64,
        #[case] h: i64,
    ) {
        assert!(FaceRegion::clamped(x, y, w, h, 100, 100).is_none());
    }

    #[test]
    fn test_from_ltrb_extents_not_swapped() {
        // Asymmetric box: horizontal extent 40, vertical extent 80
        let r = FaceRegion::from_ltrb(10.0, 20.0, 50.0, 100.0, 200, 200).unwrap();
        assert_eq!(r.x, 10);
        assert_eq!(r.y, 20);
        assert_eq!(r.width, 40);
        assert_eq!(r.height, 80);
    }

    #[test]
    fn test_from_ltrb_clamps_to_frame() {
        let r = FaceRegion::from_ltrb(-10.0, -10.0, 500.0, 500.0, 100, 80).unwrap();
        assert_eq!((r.x, r.y, r.width, r.height), (0, 0, 100, 80));
    }

    #[test]
    fn test_from_ltrb_inverted_box_is_none() {
        assert!(FaceRegion::from_ltrb(50.0, 50.0, 10.0, 10.0, 100, 100).is_none());
    }

    #[test]
    fn test_with_confidence() {
        let r = FaceRegion::clamped(0, 0, 10, 10, 100, 100)
            .unwrap()
            .with_confidence(0.9);
        assert_eq!(r.confidence, Some(0.9));
    }
}

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::DetectorError;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// Cascade face detector backed by the `rustface` crate (SeetaFace engine).
///
/// Runs multi-scale detection over a grayscale conversion of the frame.
/// Every detected box is accepted unconditionally; the cascade reports no
/// normalized confidence, so regions carry `confidence: None`.
pub struct SeetaCascadeDetector {
    model: rustface::Model,
}

// `rustface::Model` does not implement `Debug`, so a manual impl is provided
// (the opaque model weights are not worth formatting).
impl std::fmt::Debug for SeetaCascadeDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeetaCascadeDetector").finish_non_exhaustive()
    }
}

impl SeetaCascadeDetector {
    /// Load the pretrained frontal-face cascade model from `model_path`.
    pub fn new(model_path: &Path) -> Result<Self, DetectorError> {
        let load = |message: String| DetectorError::ModelLoad {
            path: model_path.to_path_buf(),
            message,
        };
        let file = File::open(model_path).map_err(|e| load(e.to_string()))?;
        let model =
            rustface::read_model(BufReader::new(file)).map_err(|e| load(e.to_string()))?;
        Ok(Self { model })
    }
}

impl FaceDetector for SeetaCascadeDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
        let gray = to_grayscale(frame);

        // The rustface detector keeps per-run pyramid state, so a fresh one
        // is created from the shared model for every frame.
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        detector.set_min_face_size(20);
        detector.set_score_thresh(2.0);
        detector.set_pyramid_scale_factor(0.8);
        detector.set_slide_window_step(4, 4);

        let faces = detector.detect(&rustface::ImageData::new(
            &gray,
            frame.width(),
            frame.height(),
        ));

        Ok(faces
            .iter()
            .filter_map(|face| {
                let bbox = face.bbox();
                FaceRegion::clamped(
                    bbox.x() as i64,
                    bbox.y() as i64,
                    bbox.width() as i64,
                    bbox.height() as i64,
                    frame.width(),
                    frame.height(),
                )
            })
            .collect())
    }
}

/// Integer Rec. 601 luma: `(299 R + 587 G + 114 B) / 1000`.
fn to_grayscale(frame: &Frame) -> Vec<u8> {
    let src = frame.as_ndarray();
    let (h, w) = (frame.height() as usize, frame.width() as usize);
    let mut gray = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            let r = src[[y, x, 0]] as u32;
            let g = src[[y, x, 1]] as u32;
            let b = src[[y, x, 2]] as u32;
            gray.push(((299 * r + 587 * g + 114 * b) / 1000) as u8);
        }
    }
    gray
}

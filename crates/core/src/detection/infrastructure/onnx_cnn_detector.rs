//! CNN face detector using ONNX Runtime via `ort`.
//!
//! Runs the UltraFace RFB-320 model: fixed 320x240 RGB input, two outputs
//! (`scores` [1, N, 2] and `boxes` [1, N, 4]) where each box is normalized
//! `(left, top, right, bottom)`.

use std::path::Path;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::DetectorError;
use crate::shared::constants::CNN_CONFIDENCE_THRESHOLD;
use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// Model input resolution (width x height).
const INPUT_WIDTH: u32 = 320;
const INPUT_HEIGHT: u32 = 240;

/// NMS IoU threshold for collapsing overlapping prior boxes.
const NMS_IOU_THRESH: f32 = 0.45;

/// CNN face detector backed by an ONNX Runtime session.
#[derive(Debug)]
pub struct OnnxCnnDetector {
    session: ort::session::Session,
    confidence: f32,
}

impl OnnxCnnDetector {
    /// Load the CNN face detection model and prepare for inference.
    pub fn new(model_path: &Path) -> Result<Self, DetectorError> {
        let session = ort::session::Session::builder()
            .and_then(|mut b| b.commit_from_file(model_path))
            .map_err(|e| DetectorError::ModelLoad {
                path: model_path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(Self {
            session,
            confidence: CNN_CONFIDENCE_THRESHOLD,
        })
    }
}

impl FaceDetector for OnnxCnnDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
        let input_tensor = preprocess(frame);

        let input_value = ort::value::Tensor::from_array(input_tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        if outputs.len() < 2 {
            return Err("CNN model produced fewer than two outputs".into());
        }

        let scores = outputs[0].try_extract_array::<f32>()?;
        let boxes = outputs[1].try_extract_array::<f32>()?;

        let scores_shape = scores.shape().to_vec();
        let boxes_shape = boxes.shape().to_vec();
        if scores_shape.len() != 3 || scores_shape[2] != 2 {
            return Err(format!("unexpected scores shape: {scores_shape:?}").into());
        }
        if boxes_shape.len() != 3 || boxes_shape[2] != 4 || boxes_shape[1] != scores_shape[1] {
            return Err(format!("unexpected boxes shape: {boxes_shape:?}").into());
        }

        let scores = scores.as_slice().ok_or("cannot get scores slice")?;
        let boxes = boxes.as_slice().ok_or("cannot get boxes slice")?;

        Ok(regions_from_output(
            scores,
            boxes,
            frame.width(),
            frame.height(),
            self.confidence,
        ))
    }
}

// ---------------------------------------------------------------------------
// Preprocessing
// ---------------------------------------------------------------------------

/// Resize the frame to the model input and normalize to `(v - 127) / 128`,
/// NCHW float32.
fn preprocess(frame: &Frame) -> ndarray::Array4<f32> {
    let rgb = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .expect("Frame data length must match dimensions");
    let resized = image::imageops::resize(
        &rgb,
        INPUT_WIDTH,
        INPUT_HEIGHT,
        image::imageops::FilterType::Triangle,
    );

    let mut tensor = ndarray::Array4::<f32>::zeros((
        1,
        3,
        INPUT_HEIGHT as usize,
        INPUT_WIDTH as usize,
    ));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (pixel.0[c] as f32 - 127.0) / 128.0;
        }
    }
    tensor
}

// ---------------------------------------------------------------------------
// Postprocessing
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
struct RawDetection {
    left: f32,
    top: f32,
    right: f32,
    bottom: f32,
    confidence: f32,
}

/// Convert raw model output into clamped face regions.
///
/// `scores` holds `[background, face]` pairs per prior; `boxes` holds
/// normalized `(left, top, right, bottom)` per prior. Detections below the
/// confidence threshold are dropped (the boundary is inclusive), the rest
/// pass greedy NMS and become `(x, y, width, height)` boxes in frame pixels.
fn regions_from_output(
    scores: &[f32],
    boxes: &[f32],
    frame_width: u32,
    frame_height: u32,
    confidence: f32,
) -> Vec<FaceRegion> {
    let num_priors = scores.len() / 2;
    let mut raw = Vec::new();
    for i in 0..num_priors {
        let score = scores[i * 2 + 1];
        if score < confidence {
            continue;
        }
        raw.push(RawDetection {
            left: boxes[i * 4] * frame_width as f32,
            top: boxes[i * 4 + 1] * frame_height as f32,
            right: boxes[i * 4 + 2] * frame_width as f32,
            bottom: boxes[i * 4 + 3] * frame_height as f32,
            confidence: score,
        });
    }

    nms(&mut raw, NMS_IOU_THRESH)
        .into_iter()
        .filter_map(|d| {
            FaceRegion::from_ltrb(
                d.left as f64,
                d.top as f64,
                d.right as f64,
                d.bottom as f64,
                frame_width,
                frame_height,
            )
            .map(|r| r.with_confidence(d.confidence))
        })
        .collect()
}

/// Greedy NMS: sort by confidence descending, suppress overlapping boxes.
fn nms(dets: &mut [RawDetection], iou_thresh: f32) -> Vec<RawDetection> {
    dets.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; dets.len()];
    for i in 0..dets.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(dets[i].clone());
        for j in (i + 1)..dets.len() {
            if !suppressed[j] && iou(&dets[i], &dets[j]) > iou_thresh {
                suppressed[j] = true;
            }
        }
    }
    keep
}

fn iou(a: &RawDetection, b: &RawDetection) -> f32 {
    let x1 = a.left.max(b.left);
    let y1 = a.top.max(b.top);
    let x2 = a.right.min(b.right);
    let y2 = a.bottom.min(b.bottom);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    if inter == 0.0 {
        return 0.0;
    }
    let area_a = (a.right - a.left) * (a.bottom - a.top);
    let area_b = (b.right - b.left) * (b.bottom - b.top);
    inter / (area_a + area_b - inter)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

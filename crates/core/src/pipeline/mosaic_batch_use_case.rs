//! Batch pipeline: stage/load each item, detect faces, mosaic, write.

use std::path::PathBuf;

use thiserror::Error;

use crate::detection::domain::face_detector::FaceDetector;
use crate::imageio;
use crate::mosaic::apply_mosaic;
use crate::source::{ImageItem, SourceRef};
use crate::staging::{StageError, StagingStore};

#[derive(Debug, Error)]
pub enum ItemError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] StageError),
    #[error("failed to load image {path}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("face detection failed: {0}")]
    Detection(Box<dyn std::error::Error>),
    #[error("failed to write output {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

#[derive(Debug)]
pub struct ItemFailure {
    pub name: String,
    pub error: ItemError,
}

/// Outcome of one batch run. Per-item failures do not make the run fail.
#[derive(Debug, Default)]
pub struct RunReport {
    pub written: Vec<String>,
    pub failed: Vec<ItemFailure>,
}

impl RunReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Sequential batch driver: one item is fully staged, detected, transformed
/// and written before the next begins.
///
/// Owns the staging store for the whole batch so the scratch directory
/// outlives every staged item and is torn down only when the use case is
/// dropped at end of run.
pub struct MosaicBatchUseCase {
    detector: Box<dyn FaceDetector>,
    staging: StagingStore,
    output_dir: PathBuf,
    ratio: f64,
}

impl MosaicBatchUseCase {
    pub fn new(
        detector: Box<dyn FaceDetector>,
        staging: StagingStore,
        output_dir: PathBuf,
        ratio: f64,
    ) -> Self {
        Self {
            detector,
            staging,
            output_dir,
            ratio,
        }
    }

    /// Process every item, isolating failures per item.
    ///
    /// Detection failures are isolated too, the same as fetch and load
    /// failures; one crashing image never takes down the batch.
    pub fn execute(&mut self, items: &[ImageItem]) -> RunReport {
        let mut report = RunReport::default();
        for item in items {
            match self.process(item) {
                Ok(path) => {
                    log::info!("wrote {}", path.display());
                    report.written.push(item.display_name.clone());
                }
                Err(error) => {
                    log::error!("{}: {error}", item.display_name);
                    report.failed.push(ItemFailure {
                        name: item.display_name.clone(),
                        error,
                    });
                }
            }
        }
        report
    }

    fn process(&mut self, item: &ImageItem) -> Result<PathBuf, ItemError> {
        let local_path = match &item.source_ref {
            SourceRef::Remote(url) => self.staging.stage(url, &item.display_name)?,
            SourceRef::Local(path) => path.clone(),
        };

        let mut frame = imageio::load_frame(&local_path).map_err(|e| ItemError::Load {
            path: local_path.clone(),
            source: e,
        })?;

        let regions = self.detector.detect(&frame).map_err(ItemError::Detection)?;
        if !regions.is_empty() {
            apply_mosaic(&mut frame, &regions, self.ratio);
        }

        let output_path = self.output_dir.join(&item.display_name);
        imageio::write_frame(&output_path, &frame).map_err(|e| ItemError::Write {
            path: output_path.clone(),
            source: e,
        })?;
        Ok(output_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::DEFAULT_MOSAIC_RATIO;
    use crate::shared::frame::Frame;
    use crate::shared::region::FaceRegion;
    use std::path::Path;

    // --- Stubs ---

    struct StubDetector {
        regions: Vec<FaceRegion>,
    }

    impl FaceDetector for StubDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
            Ok(self.regions.clone())
        }
    }

    struct FailingDetector;

    impl FaceDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<Vec<FaceRegion>, Box<dyn std::error::Error>> {
            Err("inference backend exploded".into())
        }
    }

    // --- Helpers ---

    fn region(x: u32, y: u32, w: u32, h: u32) -> FaceRegion {
        FaceRegion {
            x,
            y,
            width: w,
            height: h,
            confidence: None,
        }
    }

    fn write_test_image(path: &Path, width: u32, height: u32) {
        let mut data = Vec::with_capacity((width * height * 3) as usize);
        for y in 0..height {
            for x in 0..width {
                data.extend_from_slice(&[(x % 256) as u8, (y % 256) as u8, 77]);
            }
        }
        imageio::write_frame(path, &Frame::new(data, width, height, 3)).unwrap();
    }

    fn local_item(path: &Path) -> ImageItem {
        ImageItem {
            display_name: path.file_name().unwrap().to_string_lossy().into_owned(),
            source_ref: SourceRef::Local(path.to_path_buf()),
        }
    }

    fn use_case(detector: Box<dyn FaceDetector>, root: &Path) -> MosaicBatchUseCase {
        MosaicBatchUseCase::new(
            detector,
            StagingStore::new(root.join(".tmp")),
            root.join("output"),
            DEFAULT_MOSAIC_RATIO,
        )
    }

    // --- Tests ---

    #[test]
    fn test_bad_middle_item_does_not_abort_batch() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.png");
        let third = dir.path().join("third.png");
        write_test_image(&first, 40, 40);
        write_test_image(&third, 40, 40);

        let items = vec![
            local_item(&first),
            local_item(&dir.path().join("missing.png")),
            local_item(&third),
        ];

        let mut uc = use_case(Box::new(StubDetector { regions: vec![] }), dir.path());
        let report = uc.execute(&items);

        assert_eq!(report.written, vec!["first.png", "third.png"]);
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].name, "missing.png");
        assert!(matches!(report.failed[0].error, ItemError::Load { .. }));
        assert!(dir.path().join("output/first.png").exists());
        assert!(dir.path().join("output/third.png").exists());
        assert!(!dir.path().join("output/missing.png").exists());
    }

    #[test]
    fn test_zero_faces_writes_identical_pixels() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("calm.png");
        write_test_image(&input, 32, 24);

        let mut uc = use_case(Box::new(StubDetector { regions: vec![] }), dir.path());
        let report = uc.execute(&[local_item(&input)]);
        assert!(report.is_clean());

        let original = imageio::load_frame(&input).unwrap();
        let written = imageio::load_frame(&dir.path().join("output/calm.png")).unwrap();
        assert_eq!(written, original);
    }

    #[test]
    fn test_detected_region_is_mosaicked_rest_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("crowd.png");
        write_test_image(&input, 64, 64);

        let mut uc = use_case(
            Box::new(StubDetector {
                regions: vec![region(8, 8, 32, 32)],
            }),
            dir.path(),
        );
        uc.execute(&[local_item(&input)]);

        let original = imageio::load_frame(&input).unwrap();
        let written = imageio::load_frame(&dir.path().join("output/crowd.png")).unwrap();
        assert_ne!(written, original);

        // A pixel well outside the region survives byte-identical
        let off = (60 * 64 + 60) * 3;
        assert_eq!(&written.data()[off..off + 3], &original.data()[off..off + 3]);
    }

    #[test]
    fn test_detection_failure_is_isolated_per_item() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("a.png");
        let second = dir.path().join("b.png");
        write_test_image(&first, 20, 20);
        write_test_image(&second, 20, 20);

        let mut uc = use_case(Box::new(FailingDetector), dir.path());
        let report = uc.execute(&[local_item(&first), local_item(&second)]);

        // Both items fail in detection, but both were attempted
        assert_eq!(report.written.len(), 0);
        assert_eq!(report.failed.len(), 2);
        assert!(matches!(report.failed[0].error, ItemError::Detection(_)));
    }

    #[test]
    fn test_output_named_by_display_name() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("portrait.png");
        write_test_image(&input, 16, 16);

        let mut uc = use_case(Box::new(StubDetector { regions: vec![] }), dir.path());
        let report = uc.execute(&[local_item(&input)]);
        assert_eq!(report.written, vec!["portrait.png"]);
        assert!(dir.path().join("output/portrait.png").exists());
    }

    #[test]
    fn test_empty_item_list_is_clean_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut uc = use_case(Box::new(StubDetector { regions: vec![] }), dir.path());
        let report = uc.execute(&[]);
        assert!(report.is_clean());
        assert!(report.written.is_empty());
    }
}

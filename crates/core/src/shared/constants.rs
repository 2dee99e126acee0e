pub const CASCADE_MODEL_NAME: &str = "seeta_fd_frontal_v1.0.bin";
pub const CASCADE_MODEL_URL: &str =
    "https://github.com/atomashpolskiy/rustface/raw/master/model/seeta_fd_frontal_v1.0.bin";

pub const CNN_MODEL_NAME: &str = "version-RFB-320.onnx";
pub const CNN_MODEL_URL: &str =
    "https://github.com/onnx/models/raw/main/validated/vision/body_analysis/ultraface/models/version-RFB-320.onnx";

/// Minimum confidence for CNN detections. The boundary is inclusive.
pub const CNN_CONFIDENCE_THRESHOLD: f32 = 0.5;

pub const DEFAULT_INPUT_DIR: &str = "./input";
pub const DEFAULT_OUTPUT_DIR: &str = "./output";
pub const DEFAULT_SCRATCH_DIR: &str = "./.tmp";

/// Side length of one mosaic block relative to the region size.
pub const DEFAULT_MOSAIC_RATIO: f64 = 0.08;

/// Fixed page size of the image search collaborator.
pub const SEARCH_PAGE_SIZE: usize = 10;

/// Timeout applied to each per-item image fetch.
pub const FETCH_TIMEOUT_SECS: u64 = 30;

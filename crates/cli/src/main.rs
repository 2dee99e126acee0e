use std::path::PathBuf;
use std::process;

use clap::Parser;

use facemosaic_core::detection::domain::face_detector::FaceDetector;
use facemosaic_core::detection::infrastructure::model_resolver;
use facemosaic_core::detection::infrastructure::onnx_cnn_detector::OnnxCnnDetector;
use facemosaic_core::detection::infrastructure::seeta_cascade_detector::SeetaCascadeDetector;
use facemosaic_core::pipeline::mosaic_batch_use_case::MosaicBatchUseCase;
use facemosaic_core::shared::constants::{
    CASCADE_MODEL_NAME, CASCADE_MODEL_URL, CNN_MODEL_NAME, CNN_MODEL_URL, DEFAULT_INPUT_DIR,
    DEFAULT_MOSAIC_RATIO, DEFAULT_OUTPUT_DIR, DEFAULT_SCRATCH_DIR,
};
use facemosaic_core::source::search::{GoogleImageSearch, SearchConfig};
use facemosaic_core::source::ImageSource;
use facemosaic_core::staging::StagingStore;

/// Detect faces in images and write mosaicked copies.
#[derive(Parser)]
#[command(name = "facemosaic")]
struct Cli {
    /// Search keyword for image acquisition.
    keyword: Option<String>,

    /// Number of images to fetch for a keyword search.
    #[arg(short = 'n', long, default_value = "10")]
    number: usize,

    /// Path to a text file with one image URL per line.
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,

    /// Input directory, scanned when no keyword or URL file is given.
    #[arg(long, default_value = DEFAULT_INPUT_DIR)]
    input: PathBuf,

    /// Output directory for mosaicked images.
    #[arg(long, default_value = DEFAULT_OUTPUT_DIR)]
    output: PathBuf,

    /// Detector backend: cnn or cascade.
    #[arg(long, default_value = "cnn")]
    detector: String,

    /// Mosaic block ratio (0.0-1.0); smaller values give coarser blocks.
    #[arg(long, default_value_t = DEFAULT_MOSAIC_RATIO)]
    ratio: f64,

    /// Scratch directory for downloaded images, removed at end of run.
    #[arg(long, default_value = DEFAULT_SCRATCH_DIR)]
    scratch: PathBuf,

    /// Search API key (or FACEMOSAIC_API_KEY).
    #[arg(long, env = "FACEMOSAIC_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Custom search engine ID (or FACEMOSAIC_ENGINE_ID).
    #[arg(long, env = "FACEMOSAIC_ENGINE_ID", hide_env_values = true)]
    engine_id: Option<String>,

    /// Restrict keyword search to a language, e.g. lang_ja.
    #[arg(long)]
    language: Option<String>,

    /// Explicit cascade model path (skips the model cache).
    #[arg(long)]
    cascade_model: Option<PathBuf>,

    /// Explicit CNN model path (skips the model cache).
    #[arg(long)]
    cnn_model: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    validate(&cli)?;

    let source = build_source(&cli)?;
    let detector = build_detector(&cli)?;

    let items = source.resolve()?;
    log::info!("resolved {} image(s)", items.len());

    std::fs::create_dir_all(&cli.output)?;
    let staging = StagingStore::new(&cli.scratch);

    let mut use_case = MosaicBatchUseCase::new(detector, staging, cli.output.clone(), cli.ratio);
    let report = use_case.execute(&items);

    log::info!(
        "{} written, {} failed",
        report.written.len(),
        report.failed.len()
    );
    Ok(())
}

/// Source precedence: --file > keyword > directory scan.
fn build_source(cli: &Cli) -> Result<ImageSource, Box<dyn std::error::Error>> {
    if let Some(path) = &cli.file {
        return Ok(ImageSource::UrlList { path: path.clone() });
    }
    if let Some(keyword) = &cli.keyword {
        let api_key = cli
            .api_key
            .clone()
            .ok_or("keyword search requires an API key (--api-key or FACEMOSAIC_API_KEY)")?;
        let engine_id = cli
            .engine_id
            .clone()
            .ok_or("keyword search requires an engine ID (--engine-id or FACEMOSAIC_ENGINE_ID)")?;
        let api = GoogleImageSearch::new(SearchConfig {
            api_key,
            engine_id,
            language: cli.language.clone(),
        });
        return Ok(ImageSource::Keyword {
            api: Box::new(api),
            query: keyword.clone(),
            count: cli.number,
        });
    }
    std::fs::create_dir_all(&cli.input)?;
    Ok(ImageSource::Directory {
        path: cli.input.clone(),
    })
}

fn build_detector(cli: &Cli) -> Result<Box<dyn FaceDetector>, Box<dyn std::error::Error>> {
    match cli.detector.as_str() {
        "cnn" => {
            log::info!("resolving model: {CNN_MODEL_NAME}");
            let model_path = model_resolver::resolve(
                CNN_MODEL_NAME,
                CNN_MODEL_URL,
                cli.cnn_model.as_deref(),
                Some(Box::new(download_progress)),
            )?;
            Ok(Box::new(OnnxCnnDetector::new(&model_path)?))
        }
        "cascade" => {
            log::info!("resolving model: {CASCADE_MODEL_NAME}");
            let model_path = model_resolver::resolve(
                CASCADE_MODEL_NAME,
                CASCADE_MODEL_URL,
                cli.cascade_model.as_deref(),
                Some(Box::new(download_progress)),
            )?;
            Ok(Box::new(SeetaCascadeDetector::new(&model_path)?))
        }
        other => Err(format!("Detector must be 'cnn' or 'cascade', got '{other}'").into()),
    }
}

fn validate(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    if cli.number == 0 {
        return Err("Number of images must be greater than zero".into());
    }
    if !(cli.ratio > 0.0 && cli.ratio <= 1.0) {
        return Err(format!(
            "Mosaic ratio must be within (0.0, 1.0], got {}",
            cli.ratio
        )
        .into());
    }
    if cli.detector != "cnn" && cli.detector != "cascade" {
        return Err(format!(
            "Detector must be 'cnn' or 'cascade', got '{}'",
            cli.detector
        )
        .into());
    }
    Ok(())
}

fn download_progress(downloaded: u64, total: u64) {
    if total > 0 {
        let pct = (downloaded as f64 / total as f64 * 100.0) as u32;
        eprint!("\rDownloading face detection model... {pct}%");
    } else {
        eprint!("\rDownloading face detection model... {downloaded} bytes");
    }
    if total > 0 && downloaded >= total {
        eprintln!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("facemosaic").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = cli(&[]);
        assert_eq!(cli.number, 10);
        assert_eq!(cli.input, PathBuf::from(DEFAULT_INPUT_DIR));
        assert_eq!(cli.output, PathBuf::from(DEFAULT_OUTPUT_DIR));
        assert_eq!(cli.scratch, PathBuf::from(DEFAULT_SCRATCH_DIR));
        assert_eq!(cli.detector, "cnn");
        assert!((cli.ratio - DEFAULT_MOSAIC_RATIO).abs() < f64::EPSILON);
    }

    #[test]
    fn test_file_takes_precedence_over_keyword() {
        let parsed = cli(&["-f", "urls.txt", "festival"]);
        let source = build_source(&parsed).unwrap();
        assert!(matches!(source, ImageSource::UrlList { .. }));
    }

    #[test]
    fn test_keyword_without_credentials_is_rejected() {
        let mut parsed = cli(&["festival"]);
        parsed.api_key = None;
        parsed.engine_id = None;
        assert!(build_source(&parsed).is_err());
    }

    #[test]
    fn test_zero_number_rejected() {
        let parsed = cli(&["-n", "0", "festival"]);
        assert!(validate(&parsed).is_err());
    }

    #[test]
    fn test_ratio_out_of_range_rejected() {
        let parsed = cli(&["--ratio", "1.5"]);
        assert!(validate(&parsed).is_err());
        let parsed = cli(&["--ratio", "0"]);
        assert!(validate(&parsed).is_err());
    }

    #[test]
    fn test_unknown_detector_rejected() {
        let parsed = cli(&["--detector", "hog"]);
        assert!(validate(&parsed).is_err());
    }
}

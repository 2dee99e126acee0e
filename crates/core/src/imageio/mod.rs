//! Image decode/encode boundary using the `image` crate.

use std::path::Path;

use crate::shared::frame::Frame;

/// Decode an image file into an RGB frame.
pub fn load_frame(path: &Path) -> Result<Frame, image::ImageError> {
    let rgb = image::open(path)?.to_rgb8();
    let (width, height) = rgb.dimensions();
    Ok(Frame::new(rgb.into_raw(), width, height, 3))
}

/// Encode a frame and persist it at `path`, creating parent directories.
pub fn write_frame(path: &Path, frame: &Frame) -> Result<(), image::ImageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let img = image::RgbImage::from_raw(frame.width(), frame.height(), frame.data().to_vec())
        .expect("Frame data length must match dimensions");
    img.save(path)
}

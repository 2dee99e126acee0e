//! Blocky mosaic transform: nearest-neighbor downscale then upscale.

use crate::shared::frame::Frame;
use crate::shared::region::FaceRegion;

/// Pixelate each region of the frame in place, in the order given.
///
/// Only bytes inside a region's bounding box are touched. Overlapping
/// regions pixelate on top of already-pixelated pixels.
pub fn apply_mosaic(frame: &mut Frame, regions: &[FaceRegion], ratio: f64) {
    let fw = frame.width() as usize;
    let channels = frame.channels() as usize;
    let data = frame.data_mut();

    for r in regions {
        let rx = r.x as usize;
        let ry = r.y as usize;
        let rw = r.width as usize;
        let rh = r.height as usize;

        // Extract ROI
        let mut roi = vec![0u8; rw * rh * channels];
        for row in 0..rh {
            let src_offset = ((ry + row) * fw + rx) * channels;
            let dst_offset = row * rw * channels;
            roi[dst_offset..dst_offset + rw * channels]
                .copy_from_slice(&data[src_offset..src_offset + rw * channels]);
        }

        let pixelated = pixelate(&roi, rw, rh, channels, ratio);

        // Write pixelated ROI back
        for row in 0..rh {
            let dst_offset = ((ry + row) * fw + rx) * channels;
            let src_offset = row * rw * channels;
            data[dst_offset..dst_offset + rw * channels]
                .copy_from_slice(&pixelated[src_offset..src_offset + rw * channels]);
        }
    }
}

/// Mosaic one pixel buffer: downscale to `round(w*ratio) x round(h*ratio)`
/// (each clamped to at least 1), then upscale back to the original size,
/// both with nearest-neighbor sampling.
///
/// Nearest-neighbor in both directions is deliberate: it yields hard block
/// edges instead of a blur, and re-applying at the same ratio reproduces
/// the identical blocks.
pub fn pixelate(src: &[u8], width: usize, height: usize, channels: usize, ratio: f64) -> Vec<u8> {
    let small_w = ((width as f64 * ratio).round() as usize).max(1);
    let small_h = ((height as f64 * ratio).round() as usize).max(1);
    let small = resize_nearest(src, width, height, channels, small_w, small_h);
    resize_nearest(&small, small_w, small_h, channels, width, height)
}

/// Nearest-neighbor resize with pixel-center sampling:
/// `src = floor((2*dst + 1) * src_len / (2 * dst_len))`.
fn resize_nearest(
    src: &[u8],
    width: usize,
    height: usize,
    channels: usize,
    target_w: usize,
    target_h: usize,
) -> Vec<u8> {
    let mut out = vec![0u8; target_w * target_h * channels];
    for y in 0..target_h {
        let src_y = ((2 * y + 1) * height / (2 * target_h)).min(height - 1);
        for x in 0..target_w {
            let src_x = ((2 * x + 1) * width / (2 * target_w)).min(width - 1);
            let src_offset = (src_y * width + src_x) * channels;
            let dst_offset = (y * target_w + x) * channels;
            out[dst_offset..dst_offset + channels]
                .copy_from_slice(&src[src_offset..src_offset + channels]);
        }
    }
    out
}

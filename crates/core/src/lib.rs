//! Face mosaicking pipeline: resolve an image source (keyword search, URL
//! list, or local directory), detect faces, and write copies with the
//! detected regions pixelated.

pub mod detection;
pub mod imageio;
pub mod mosaic;
pub mod pipeline;
pub mod shared;
pub mod source;
pub mod staging;

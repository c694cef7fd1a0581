//! Per-format decoders turning a byte stream into tag directories.

pub mod bmp;
pub mod gif;
pub mod jpeg;
pub mod pcx;
pub mod png;
pub mod tiff;

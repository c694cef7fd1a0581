//! Detection of image file formats and summaries of their metadata.
//!
//! Supported formats are JPEG, GIF, TIFF, BMP, PNG and PCX. For each file this library
//! determines the format from its signature, decodes the metadata directories of that
//! format and summarizes them into a `FileRecord` with resolution, DPI, color depth and
//! compression.

pub use crate::directory::{Directory, DirectoryKind, DirectorySet, TagValue};
pub use crate::generic::*;
pub use crate::normalize::normalize;
pub use crate::record::{FileRecord, ImageDetails};
pub use crate::scan::*;
pub use crate::traits::*;
pub use crate::types::{Dimensions, Error, Result};

#[macro_use]
mod macros;
mod directory;
mod generic;
mod normalize;
mod record;
mod scan;
mod traits;
mod types;
mod utils;

pub mod common;
pub mod formats;

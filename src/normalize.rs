//! Summarizing decoded directories into a `FileRecord`.
//!
//! Every format has its own rule deciding which directory is the primary one and which of
//! its tags make up the four summarized fields. A missing primary directory fails the rule;
//! a missing tag only leaves its field empty.

use crate::directory::{Directory, DirectoryKind, DirectorySet};
use crate::formats::{bmp, gif, jpeg, pcx, png, tiff};
use crate::generic::FileType;
use crate::record::{FileRecord, ImageDetails};
use crate::traits::IntrinsicResolution;
use crate::types::{Dimensions, Error, Result};
use crate::utils::format_decimal;

/// Builds the record of a file of the given type from its directories.
///
/// `source` is consulted only by the formats whose DPI comes from the decoded image itself.
pub fn normalize<S: ?Sized + IntrinsicResolution>(
    file_type: FileType,
    directories: &DirectorySet,
    name: &str,
    source: &mut S,
) -> Result<FileRecord> {
    let details = match file_type {
        FileType::Jpeg => from_jpeg(directories, source)?,
        FileType::Gif => from_gif(directories, source)?,
        FileType::Tiff => from_tiff(directories)?,
        FileType::Bmp => from_bmp(directories)?,
        FileType::Png => from_png(directories)?,
        FileType::Pcx => from_pcx(directories)?,
        FileType::Unknown => return Ok(FileRecord::name_only(name)),
    };
    Ok(FileRecord::new(name, details))
}

fn primary(directories: &DirectorySet, kind: DirectoryKind) -> Result<&Directory> {
    directories.first(kind).ok_or(Error::MissingDirectory(kind.name()))
}

fn resolution(dir: &Directory, width_tag: u16, height_tag: u16) -> Option<String> {
    Dimensions::try_from_pair(dir.get_i64(width_tag)?, dir.get_i64(height_tag)?).map(|d| d.to_string())
}

fn intrinsic_dpi<S: ?Sized + IntrinsicResolution>(source: &mut S) -> Result<String> {
    let (x, _) = source.intrinsic_resolution()?;
    Ok(format_decimal(x))
}

fn from_jpeg<S: ?Sized + IntrinsicResolution>(directories: &DirectorySet, source: &mut S) -> Result<ImageDetails> {
    let dir = primary(directories, DirectoryKind::Jpeg)?;

    // the first directory present decides, even if it lacks the resolution tag
    let dpi = match (directories.first(DirectoryKind::ExifIfd0), directories.first(DirectoryKind::Jfif)) {
        (Some(exif), _) => exif.description(tiff::TAG_X_RESOLUTION),
        (None, Some(jfif)) => jfif.description(jpeg::TAG_JFIF_RES_X),
        (None, None) => Some(intrinsic_dpi(source)?),
    };

    Ok(ImageDetails {
        resolution: resolution(dir, jpeg::TAG_IMAGE_WIDTH, jpeg::TAG_IMAGE_HEIGHT),
        dpi,
        color_depth: dir.description(jpeg::TAG_DATA_PRECISION),
        compression: dir.description(jpeg::TAG_COMPRESSION_TYPE),
    })
}

fn from_gif<S: ?Sized + IntrinsicResolution>(directories: &DirectorySet, source: &mut S) -> Result<ImageDetails> {
    let image = primary(directories, DirectoryKind::GifImage)?;
    let header = directories.first(DirectoryKind::GifHeader);

    Ok(ImageDetails {
        resolution: resolution(image, gif::TAG_WIDTH, gif::TAG_HEIGHT),
        dpi: Some(intrinsic_dpi(source)?),
        color_depth: header.and_then(|h| h.description(gif::TAG_BITS_PER_PIXEL)),
        compression: Some("LZW".to_owned()),
    })
}

fn from_tiff(directories: &DirectorySet) -> Result<ImageDetails> {
    let dir = primary(directories, DirectoryKind::ExifIfd0)?;

    Ok(ImageDetails {
        resolution: resolution(dir, tiff::TAG_IMAGE_WIDTH, tiff::TAG_IMAGE_HEIGHT),
        dpi: dir.description(tiff::TAG_X_RESOLUTION),
        color_depth: dir.description(tiff::TAG_BITS_PER_SAMPLE),
        compression: dir.description(tiff::TAG_COMPRESSION),
    })
}

fn from_bmp(directories: &DirectorySet) -> Result<ImageDetails> {
    let dir = primary(directories, DirectoryKind::BmpHeader)?;

    Ok(ImageDetails {
        resolution: resolution(dir, bmp::TAG_IMAGE_WIDTH, bmp::TAG_IMAGE_HEIGHT),
        dpi: Some("72".to_owned()),
        color_depth: dir.description(bmp::TAG_BITS_PER_PIXEL),
        compression: dir.description(bmp::TAG_COMPRESSION),
    })
}

/// Converts a `pHYs` pixels-per-meter value to dots per inch.
pub fn png_dpi(pixels_per_unit: f64) -> String {
    format_decimal(pixels_per_unit / png::INCHES_PER_METER)
}

fn from_png(directories: &DirectorySet) -> Result<ImageDetails> {
    let ihdr = directories
        .named(DirectoryKind::Png, png::IHDR)
        .ok_or(Error::MissingDirectory(png::IHDR))?;
    let phys = directories.named(DirectoryKind::Png, png::PHYS);

    Ok(ImageDetails {
        resolution: resolution(ihdr, png::TAG_IMAGE_WIDTH, png::TAG_IMAGE_HEIGHT),
        dpi: phys.and_then(|p| p.get_f64(png::TAG_PIXELS_PER_UNIT_X)).map(png_dpi),
        color_depth: ihdr.description(png::TAG_BITS_PER_SAMPLE),
        // deflate is the only compression method PNG defines
        compression: Some("Deflate".to_owned()),
    })
}

fn from_pcx(directories: &DirectorySet) -> Result<ImageDetails> {
    let dir = primary(directories, DirectoryKind::Pcx)?;

    Ok(ImageDetails {
        resolution: resolution(dir, pcx::TAG_X_MAX, pcx::TAG_Y_MAX),
        dpi: dir.description(pcx::TAG_HORIZONTAL_DPI),
        color_depth: dir.description(pcx::TAG_BITS_PER_PIXEL),
        compression: Some("RLE".to_owned()),
    })
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use num::rational::Ratio;

    use super::*;

    struct FixedResolution(f64, usize);

    impl IntrinsicResolution for FixedResolution {
        fn intrinsic_resolution(&mut self) -> Result<(f64, f64)> {
            self.1 += 1;
            Ok((self.0, self.0))
        }
    }

    fn jpeg_directory() -> Directory {
        Directory::new(DirectoryKind::Jpeg)
            .with(jpeg::TAG_COMPRESSION_TYPE, 0u8)
            .with(jpeg::TAG_DATA_PRECISION, 8u8)
            .with(jpeg::TAG_IMAGE_WIDTH, 640u16)
            .with(jpeg::TAG_IMAGE_HEIGHT, 480u16)
    }

    fn exif_directory(x_resolution: i64) -> Directory {
        Directory::new(DirectoryKind::ExifIfd0)
            .with(tiff::TAG_X_RESOLUTION, Ratio::new_raw(x_resolution, 1))
            .with(tiff::TAG_RESOLUTION_UNIT, 2u16)
    }

    fn jfif_directory(x_density: u16) -> Directory {
        Directory::new(DirectoryKind::Jfif)
            .with(jpeg::TAG_JFIF_UNITS, 1u8)
            .with(jpeg::TAG_JFIF_RES_X, x_density)
            .with(jpeg::TAG_JFIF_RES_Y, x_density)
    }

    #[test]
    fn jpeg_dpi_prefers_exif_over_jfif() {
        let dirs: DirectorySet = vec![jpeg_directory(), jfif_directory(96), exif_directory(300)]
            .into_iter()
            .collect();
        let mut source = FixedResolution(50.0, 0);

        let record = normalize(FileType::Jpeg, &dirs, "a.jpg", &mut source).unwrap();
        assert_eq!(record.dpi(), Some("300 dots per inch"));
        assert_eq!(source.1, 0);
    }

    #[test]
    fn jpeg_dpi_uses_jfif_without_exif() {
        let dirs: DirectorySet = vec![jpeg_directory(), jfif_directory(96)].into_iter().collect();
        let mut source = FixedResolution(50.0, 0);

        let record = normalize(FileType::Jpeg, &dirs, "a.jpg", &mut source).unwrap();
        assert_eq!(record.dpi(), Some("96 dots per inch"));
        assert_eq!(source.1, 0);
    }

    #[test]
    fn jpeg_exif_without_resolution_leaves_dpi_empty() {
        let exif = Directory::new(DirectoryKind::ExifIfd0).with(tiff::TAG_ORIENTATION, 1u16);
        let dirs: DirectorySet = vec![jpeg_directory(), jfif_directory(72), exif].into_iter().collect();
        let mut source = FixedResolution(50.0, 0);

        let record = normalize(FileType::Jpeg, &dirs, "a.jpg", &mut source).unwrap();
        assert_eq!(record.dpi(), None);
        assert_eq!(record.resolution(), Some("640x480 px"));
        assert_eq!(source.1, 0);
    }

    #[test]
    fn jpeg_jfif_without_density_leaves_dpi_empty() {
        let jfif = Directory::new(DirectoryKind::Jfif).with(jpeg::TAG_JFIF_UNITS, 1u8);
        let dirs: DirectorySet = vec![jpeg_directory(), jfif].into_iter().collect();
        let mut source = FixedResolution(50.0, 0);

        let record = normalize(FileType::Jpeg, &dirs, "a.jpg", &mut source).unwrap();
        assert_eq!(record.dpi(), None);
        assert_eq!(source.1, 0);
    }

    #[test]
    fn jpeg_dpi_falls_back_to_intrinsic_resolution() {
        let dirs: DirectorySet = vec![jpeg_directory()].into_iter().collect();
        let mut source = FixedResolution(150.0, 0);

        let record = normalize(FileType::Jpeg, &dirs, "a.jpg", &mut source).unwrap();
        assert_eq!(record.dpi(), Some("150"));
        assert_eq!(source.1, 1);
        assert_eq!(record.resolution(), Some("640x480 px"));
        assert_eq!(record.color_depth(), Some("8 bits"));
        assert_eq!(record.compression(), Some("Baseline"));
    }

    #[test]
    fn jpeg_fallback_failure_fails_the_rule() {
        let dirs: DirectorySet = vec![jpeg_directory()].into_iter().collect();
        let mut empty = Cursor::new(Vec::<u8>::new());

        assert!(normalize(FileType::Jpeg, &dirs, "a.jpg", &mut empty).is_err());
    }

    #[test]
    fn missing_primary_directory_is_an_error() {
        let dirs: DirectorySet = vec![jfif_directory(72)].into_iter().collect();
        let mut source = FixedResolution(96.0, 0);

        match normalize(FileType::Jpeg, &dirs, "a.jpg", &mut source) {
            Err(Error::MissingDirectory(name)) => assert_eq!(name, "JPEG"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn png_dpi_is_converted_from_pixels_per_meter() {
        assert_eq!(png_dpi(3937.0), "100");
        assert_eq!(png_dpi(2835.0), "72.01");
    }

    #[test]
    fn png_without_phys_has_no_dpi() {
        let ihdr = Directory::with_name(DirectoryKind::Png, png::IHDR)
            .with(png::TAG_IMAGE_WIDTH, 640u32)
            .with(png::TAG_IMAGE_HEIGHT, 480u32)
            .with(png::TAG_BITS_PER_SAMPLE, 8u8);
        let dirs: DirectorySet = vec![ihdr].into_iter().collect();
        let mut source = FixedResolution(96.0, 0);

        let record = normalize(FileType::Png, &dirs, "a.png", &mut source).unwrap();
        assert_eq!(record.resolution(), Some("640x480 px"));
        assert_eq!(record.dpi(), None);
        assert_eq!(record.color_depth(), Some("8 bits"));
        assert_eq!(record.compression(), Some("Deflate"));
    }

    #[test]
    fn missing_tags_leave_fields_empty() {
        let dirs: DirectorySet = vec![Directory::new(DirectoryKind::ExifIfd0)].into_iter().collect();
        let mut source = FixedResolution(96.0, 0);

        let record = normalize(FileType::Tiff, &dirs, "a.tif", &mut source).unwrap();
        assert_eq!(record.details(), Some(&ImageDetails::default()));
    }

    #[test]
    fn unknown_type_yields_name_only() {
        let dirs = DirectorySet::new();
        let mut source = FixedResolution(96.0, 0);

        let record = normalize(FileType::Unknown, &dirs, "notes.txt", &mut source).unwrap();
        assert_eq!(record, FileRecord::name_only("notes.txt"));
    }
}

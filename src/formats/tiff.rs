//! Decoding of TIFF image file directories, both from TIFF files and from EXIF segments.

use std::io::{BufRead, Cursor, Seek};

use crate::common::tiff::TiffReader;
use crate::directory::{Directory, DirectoryKind, TagValue};
use crate::types::Result;
use crate::utils::format_decimal;

pub const TAG_IMAGE_WIDTH: u16 = 0x0100;
pub const TAG_IMAGE_HEIGHT: u16 = 0x0101;
pub const TAG_BITS_PER_SAMPLE: u16 = 0x0102;
pub const TAG_COMPRESSION: u16 = 0x0103;
pub const TAG_PHOTOMETRIC_INTERPRETATION: u16 = 0x0106;
pub const TAG_ORIENTATION: u16 = 0x0112;
pub const TAG_X_RESOLUTION: u16 = 0x011A;
pub const TAG_Y_RESOLUTION: u16 = 0x011B;
pub const TAG_RESOLUTION_UNIT: u16 = 0x0128;
pub const TAG_SOFTWARE: u16 = 0x0131;

/// Reads the first image file directory of a TIFF stream positioned at the TIFF header.
pub fn load<R: ?Sized + BufRead + Seek>(r: &mut R) -> Result<Vec<Directory>> {
    let mut reader = TiffReader::new(r);
    let mut ifds = reader.ifds()?;
    let ifd0 = match ifds.next() {
        Some(ifd) => ifd?,
        None => return Err(invalid_format!("TIFF data contains no image file directories")),
    };

    let mut directory = Directory::new(DirectoryKind::ExifIfd0);
    for (tag, value) in ifd0.entries {
        directory.set(tag, value);
    }
    Ok(vec![directory])
}

/// Reads the first image file directory of TIFF data embedded in an EXIF segment.
pub fn load_exif(data: &[u8]) -> Result<Directory> {
    let mut dirs = load(&mut Cursor::new(data))?;
    Ok(dirs.remove(0))
}

/// Renders the resolution value of an IFD together with its unit, e.g. `72 dots per inch`.
fn describe_resolution(dir: &Directory, tag: u16) -> Option<String> {
    let value = format_decimal(dir.get_f64(tag)?);
    let unit = match dir.get_i64(TAG_RESOLUTION_UNIT) {
        Some(1) => return Some(format!("{} dots", value)),
        Some(3) => "cm",
        _ => "inch",
    };
    Some(format!("{} dots per {}", value, unit))
}

pub fn compression_name(code: i64) -> Option<&'static str> {
    Some(match code {
        1 => "Uncompressed",
        2 => "CCITT 1D",
        3 => "T4/Group 3 Fax",
        4 => "T6/Group 4 Fax",
        5 => "LZW",
        6 => "JPEG (old-style)",
        7 => "JPEG",
        8 => "Adobe Deflate",
        9 => "JBIG B&W",
        10 => "JBIG Color",
        32766 => "Next",
        32771 => "CCIRLEW",
        32773 => "PackBits",
        32809 => "Thunderscan",
        32946 => "Deflate",
        34676 => "SGILog",
        34677 => "SGILog24",
        34712 => "JPEG 2000",
        34892 => "Lossy JPEG",
        _ => return None,
    })
}

pub fn describe(dir: &Directory, tag: u16) -> Option<String> {
    match tag {
        TAG_X_RESOLUTION | TAG_Y_RESOLUTION => describe_resolution(dir, tag),
        TAG_BITS_PER_SAMPLE => dir.get(tag).map(|v| format!("{} bits/component/pixel", v)),
        TAG_COMPRESSION => dir
            .get_i64(tag)
            .map(|c| compression_name(c).map(str::to_owned).unwrap_or_else(|| format!("Unknown ({})", c))),
        TAG_RESOLUTION_UNIT => match dir.get_i64(tag)? {
            1 => Some("(No unit)".to_owned()),
            2 => Some("Inch".to_owned()),
            3 => Some("cm".to_owned()),
            _ => None,
        },
        TAG_PHOTOMETRIC_INTERPRETATION => match dir.get_i64(tag)? {
            0 => Some("WhiteIsZero".to_owned()),
            1 => Some("BlackIsZero".to_owned()),
            2 => Some("RGB".to_owned()),
            3 => Some("RGB Palette".to_owned()),
            4 => Some("Transparency Mask".to_owned()),
            5 => Some("CMYK".to_owned()),
            6 => Some("YCbCr".to_owned()),
            8 => Some("CIELab".to_owned()),
            _ => None,
        },
        TAG_IMAGE_WIDTH | TAG_IMAGE_HEIGHT => dir.get(tag).map(|v| format!("{} pixels", v)),
        _ => match dir.get(tag)? {
            TagValue::Text(s) => Some(s.clone()),
            _ => None,
        },
    }
}

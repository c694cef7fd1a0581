//! Decoding of JPEG marker segments.
//!
//! Segments are read from the start-of-image marker up to the start-of-scan marker, since
//! everything after it is entropy-coded image data. Three kinds of segments produce
//! directories:
//!
//! * start-of-frame segments (`SOF0`..`SOF15`), which carry dimensions, sample precision
//!   and the coding process, become a `JPEG` directory;
//! * `APP0` segments with the `JFIF` identifier become a `JFIF` directory;
//! * `APP1` segments with the `Exif` identifier contain TIFF data whose first IFD becomes
//!   an `Exif IFD0` directory.

use std::io::BufRead;

use byteorder::{BigEndian, ReadBytesExt};
use tracing::debug;

use crate::directory::{Directory, DirectoryKind};
use crate::formats::tiff;
use crate::types::Result;
use crate::utils::BufReadExt;

pub const TAG_COMPRESSION_TYPE: u16 = 0;
pub const TAG_DATA_PRECISION: u16 = 1;
pub const TAG_IMAGE_HEIGHT: u16 = 3;
pub const TAG_IMAGE_WIDTH: u16 = 5;
pub const TAG_NUMBER_OF_COMPONENTS: u16 = 6;

pub const TAG_JFIF_VERSION: u16 = 5;
pub const TAG_JFIF_UNITS: u16 = 7;
pub const TAG_JFIF_RES_X: u16 = 8;
pub const TAG_JFIF_RES_Y: u16 = 10;
pub const TAG_JFIF_THUMB_WIDTH: u16 = 12;
pub const TAG_JFIF_THUMB_HEIGHT: u16 = 13;

const SOI: u8 = 0xd8;
const EOI: u8 = 0xd9;
const SOS: u8 = 0xda;
const APP0: u8 = 0xe0;
const APP1: u8 = 0xe1;

fn is_sof(marker: u8) -> bool {
    match marker {
        // DHT, JPG and DAC share the range with SOFn
        0xc4 | 0xc8 | 0xcc => false,
        0xc0..=0xcf => true,
        _ => false,
    }
}

pub fn load<R: ?Sized + BufRead>(r: &mut R) -> Result<Vec<Directory>> {
    let mut soi = [0u8; 2];
    try_if_eof!(r.read_exact(&mut soi), "when reading start of image marker");
    if soi != [0xff, SOI] {
        return Err(invalid_format!("invalid JPEG start of image marker: {:?}", soi));
    }

    let mut directories = Vec::new();
    loop {
        let bytes_read = r.skip_until_byte(0xff)?;
        if bytes_read == 0 {
            return Err(unexpected_eof!("when searching for a marker"));
        }

        let mut marker_type = try_if_eof!(r.read_u8(), "when reading marker type");
        // any number of fill bytes may precede a marker
        while marker_type == 0xff {
            marker_type = try_if_eof!(r.read_u8(), "when reading marker type");
        }

        match marker_type {
            0 => continue, // "stuffed" byte
            0x01 | 0xd0..=0xd7 | SOI => continue,
            EOI => break,
            _ => {}
        }

        let size = try_if_eof!(r.read_u16::<BigEndian>(), "when reading marker payload size");
        if size < 2 {
            return Err(invalid_format!("invalid payload size of marker 0x{:X}: {}", marker_type, size));
        }
        let size = size - 2;

        if marker_type == SOS {
            break;
        }

        if is_sof(marker_type) || marker_type == APP0 || marker_type == APP1 {
            let mut payload = vec![0u8; size as usize];
            try_if_eof!(r.read_exact(&mut payload), "when reading payload of marker 0x{:X}", marker_type);

            match marker_type {
                APP0 => {
                    if let Some(jfif) = read_jfif(&payload) {
                        directories.push(jfif);
                    }
                }
                APP1 => {
                    if payload.starts_with(b"Exif\0\0") {
                        match tiff::load_exif(&payload[6..]) {
                            Ok(exif) => directories.push(exif),
                            // the image is still usable without its EXIF data
                            Err(e) => debug!("skipping malformed EXIF segment: {}", e),
                        }
                    }
                }
                _ => directories.push(read_sof(marker_type, &payload)?),
            }
        } else {
            let size = size as u64;
            if r.skip_exact(size)? != size {
                return Err(unexpected_eof!("when skipping marker payload"));
            }
        }
    }

    Ok(directories)
}

fn read_sof(marker_type: u8, mut payload: &[u8]) -> Result<Directory> {
    let precision = try_if_eof!(payload.read_u8(), "when reading sample precision");
    let height = try_if_eof!(payload.read_u16::<BigEndian>(), "when reading height");
    let width = try_if_eof!(payload.read_u16::<BigEndian>(), "when reading width");
    let components = try_if_eof!(payload.read_u8(), "when reading number of components");

    let mut directory = Directory::new(DirectoryKind::Jpeg);
    directory
        .set(TAG_COMPRESSION_TYPE, marker_type - 0xc0)
        .set(TAG_DATA_PRECISION, precision)
        .set(TAG_IMAGE_HEIGHT, height)
        .set(TAG_IMAGE_WIDTH, width)
        .set(TAG_NUMBER_OF_COMPONENTS, components);
    Ok(directory)
}

fn read_jfif(payload: &[u8]) -> Option<Directory> {
    if !payload.starts_with(b"JFIF\0") {
        return None;
    }
    let mut data = &payload[5..];

    let version = data.read_u16::<BigEndian>().ok()?;
    let units = data.read_u8().ok()?;
    let res_x = data.read_u16::<BigEndian>().ok()?;
    let res_y = data.read_u16::<BigEndian>().ok()?;

    let mut directory = Directory::new(DirectoryKind::Jfif);
    directory
        .set(TAG_JFIF_VERSION, version)
        .set(TAG_JFIF_UNITS, units)
        .set(TAG_JFIF_RES_X, res_x)
        .set(TAG_JFIF_RES_Y, res_y);

    // thumbnail dimensions are optional in truncated APP0 segments
    if let (Ok(w), Ok(h)) = (data.read_u8(), data.read_u8()) {
        directory.set(TAG_JFIF_THUMB_WIDTH, w).set(TAG_JFIF_THUMB_HEIGHT, h);
    }
    Some(directory)
}

pub fn compression_type_name(code: i64) -> Option<&'static str> {
    Some(match code {
        0 => "Baseline",
        1 => "Extended sequential, Huffman",
        2 => "Progressive, Huffman",
        3 => "Lossless, Huffman",
        5 => "Differential sequential, Huffman",
        6 => "Differential progressive, Huffman",
        7 => "Differential lossless, Huffman",
        9 => "Extended sequential, arithmetic",
        10 => "Progressive, arithmetic",
        11 => "Lossless, arithmetic",
        13 => "Differential sequential, arithmetic",
        14 => "Differential progressive, arithmetic",
        15 => "Differential lossless, arithmetic",
        _ => return None,
    })
}

pub fn describe(dir: &Directory, tag: u16) -> Option<String> {
    match tag {
        TAG_COMPRESSION_TYPE => dir.get_i64(tag).and_then(compression_type_name).map(str::to_owned),
        TAG_DATA_PRECISION => dir.get_i64(tag).map(|p| format!("{} bits", p)),
        TAG_IMAGE_WIDTH | TAG_IMAGE_HEIGHT => dir.get_i64(tag).map(|n| format!("{} pixels", n)),
        _ => None,
    }
}

pub fn describe_jfif(dir: &Directory, tag: u16) -> Option<String> {
    match tag {
        TAG_JFIF_VERSION => dir.get_i64(tag).map(|v| format!("{}.{:02}", v >> 8, v & 0xff)),
        TAG_JFIF_UNITS => match dir.get_i64(tag)? {
            0 => Some("none".to_owned()),
            1 => Some("inches".to_owned()),
            2 => Some("centimetres".to_owned()),
            _ => None,
        },
        TAG_JFIF_RES_X | TAG_JFIF_RES_Y => {
            let density = dir.get_i64(tag)?;
            match dir.get_i64(TAG_JFIF_UNITS) {
                Some(1) => Some(format!("{} dots per inch", density)),
                Some(2) => Some(format!("{} dots per cm", density)),
                _ => Some(format!("{} dots", density)),
            }
        }
        _ => None,
    }
}

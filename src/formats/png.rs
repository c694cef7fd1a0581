//! Decoding of PNG chunks preceding the image data.

use std::io::BufRead;

use byteorder::{BigEndian, ReadBytesExt};

use crate::directory::{Directory, DirectoryKind};
use crate::types::Result;
use crate::utils::BufReadExt;

pub const IHDR: &str = "PNG-IHDR";
pub const PLTE: &str = "PNG-PLTE";
pub const PHYS: &str = "PNG-pHYs";

pub const TAG_IMAGE_WIDTH: u16 = 1;
pub const TAG_IMAGE_HEIGHT: u16 = 2;
pub const TAG_BITS_PER_SAMPLE: u16 = 3;
pub const TAG_COLOR_TYPE: u16 = 4;
pub const TAG_COMPRESSION_TYPE: u16 = 5;
pub const TAG_FILTER_METHOD: u16 = 6;
pub const TAG_INTERLACE_METHOD: u16 = 7;
pub const TAG_PALETTE_SIZE: u16 = 8;
pub const TAG_PIXELS_PER_UNIT_X: u16 = 9;
pub const TAG_PIXELS_PER_UNIT_Y: u16 = 10;
pub const TAG_UNIT_SPECIFIER: u16 = 11;

/// Number of inches in a meter, as used for `pHYs` unit conversion.
pub const INCHES_PER_METER: f64 = 39.37007874;

const SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub enum ColorType {
    Grayscale,
    Rgb,
    Indexed,
    GrayscaleAlpha,
    RgbAlpha,
}

const CT_GRAYSCALE: u8 = 0;
const CT_RGB: u8 = 2;
const CT_INDEXED: u8 = 3;
const CT_GRAYSCALE_ALPHA: u8 = 4;
const CT_RGB_ALPHA: u8 = 6;

impl ColorType {
    fn from_u8(n: u8) -> Option<ColorType> {
        match n {
            CT_GRAYSCALE       => Some(ColorType::Grayscale),
            CT_RGB             => Some(ColorType::Rgb),
            CT_INDEXED         => Some(ColorType::Indexed),
            CT_GRAYSCALE_ALPHA => Some(ColorType::GrayscaleAlpha),
            CT_RGB_ALPHA       => Some(ColorType::RgbAlpha),
            _                  => None,
        }
    }

    fn description(self) -> &'static str {
        match self {
            ColorType::Grayscale => "Greyscale",
            ColorType::Rgb => "True Color",
            ColorType::Indexed => "Indexed Color",
            ColorType::GrayscaleAlpha => "Greyscale with Alpha",
            ColorType::RgbAlpha => "True Color with Alpha",
        }
    }
}

fn is_valid_bit_depth(bit_depth: u8, color_type: u8) -> bool {
    match color_type {
        CT_INDEXED => matches!(bit_depth, 1 | 2 | 4 | 8),
        CT_GRAYSCALE => matches!(bit_depth, 1 | 2 | 4 | 8 | 16),
        CT_GRAYSCALE_ALPHA | CT_RGB | CT_RGB_ALPHA => matches!(bit_depth, 8 | 16),
        _ => false,
    }
}

fn read_ihdr(mut data: &[u8]) -> Result<Directory> {
    let width = try_if_eof!(data.read_u32::<BigEndian>(), "when reading width");
    let height = try_if_eof!(data.read_u32::<BigEndian>(), "when reading height");
    let bit_depth = try_if_eof!(data.read_u8(), "when reading bit depth");
    let color_type = try_if_eof!(data.read_u8(), "when reading color type");
    let compression_method = try_if_eof!(data.read_u8(), "when reading compression method");
    let filter_method = try_if_eof!(data.read_u8(), "when reading filter method");
    let interlace_method = try_if_eof!(data.read_u8(), "when reading interlace method");

    if ColorType::from_u8(color_type).is_none() {
        return Err(invalid_format!("invalid color type: {}", color_type));
    }
    if !is_valid_bit_depth(bit_depth, color_type) {
        return Err(invalid_format!("invalid bit depth: {}", bit_depth));
    }

    let mut directory = Directory::with_name(DirectoryKind::Png, IHDR);
    directory
        .set(TAG_IMAGE_WIDTH, width)
        .set(TAG_IMAGE_HEIGHT, height)
        .set(TAG_BITS_PER_SAMPLE, bit_depth)
        .set(TAG_COLOR_TYPE, color_type)
        .set(TAG_COMPRESSION_TYPE, compression_method)
        .set(TAG_FILTER_METHOD, filter_method)
        .set(TAG_INTERLACE_METHOD, interlace_method);
    Ok(directory)
}

fn read_phys(mut data: &[u8]) -> Result<Directory> {
    let ppu_x = try_if_eof!(data.read_u32::<BigEndian>(), "when reading pixels per unit, X axis");
    let ppu_y = try_if_eof!(data.read_u32::<BigEndian>(), "when reading pixels per unit, Y axis");
    let unit = try_if_eof!(data.read_u8(), "when reading unit specifier");

    let mut directory = Directory::with_name(DirectoryKind::Png, PHYS);
    directory
        .set(TAG_PIXELS_PER_UNIT_X, ppu_x)
        .set(TAG_PIXELS_PER_UNIT_Y, ppu_y)
        .set(TAG_UNIT_SPECIFIER, unit);
    Ok(directory)
}

/// Reads chunks up to the first `IDAT` chunk; only ancillary chunks which are required to
/// precede image data are therefore seen.
pub fn load<R: ?Sized + BufRead>(r: &mut R) -> Result<Vec<Directory>> {
    let mut signature = [0u8; 8];
    try_if_eof!(r.read_exact(&mut signature), "when reading PNG signature");
    if &signature != SIGNATURE {
        return Err(invalid_format!("invalid PNG header: {:?}", signature));
    }

    let mut directories = Vec::new();
    let mut index = 0usize;
    loop {
        let length = try_if_eof!(r.read_u32::<BigEndian>(), "when reading length of chunk {}", index);
        let mut chunk_type = [0u8; 4];
        try_if_eof!(r.read_exact(&mut chunk_type), "when reading type of chunk {}", index);

        if index == 0 && &chunk_type != b"IHDR" {
            return Err(invalid_format!("invalid first PNG chunk: {:?}", chunk_type));
        }

        match &chunk_type {
            b"IDAT" | b"IEND" => break,
            b"IHDR" | b"pHYs" => {
                if length > 64 {
                    return Err(invalid_format!("invalid length of chunk {}: {}", index, length));
                }
                let mut data = vec![0u8; length as usize];
                try_if_eof!(r.read_exact(&mut data), "when reading data of chunk {}", index);
                directories.push(if &chunk_type == b"IHDR" {
                    read_ihdr(&data)?
                } else {
                    read_phys(&data)?
                });
            }
            b"PLTE" => {
                if length % 3 != 0 {
                    return Err(invalid_format!("invalid PLTE chunk length: {}", length));
                }
                let mut directory = Directory::with_name(DirectoryKind::Png, PLTE);
                directory.set(TAG_PALETTE_SIZE, length / 3);
                directories.push(directory);

                let length = length as u64;
                if r.skip_exact(length)? != length {
                    return Err(unexpected_eof!("when skipping data of chunk {}", index));
                }
            }
            _ => {
                let length = length as u64;
                if r.skip_exact(length)? != length {
                    return Err(unexpected_eof!("when skipping data of chunk {}", index));
                }
            }
        }

        // CRC
        if r.skip_exact(4)? != 4 {
            return Err(unexpected_eof!("when reading CRC of chunk {}", index));
        }
        index += 1;
    }

    Ok(directories)
}

pub fn describe(dir: &Directory, tag: u16) -> Option<String> {
    match tag {
        TAG_BITS_PER_SAMPLE => dir.get_i64(tag).map(|n| format!("{} bits", n)),
        TAG_COLOR_TYPE => dir
            .get_i64(tag)
            .and_then(|n| ColorType::from_u8(n as u8))
            .map(|ct| ct.description().to_owned()),
        TAG_COMPRESSION_TYPE => match dir.get_i64(tag)? {
            0 => Some("Deflate".to_owned()),
            _ => None,
        },
        TAG_FILTER_METHOD => match dir.get_i64(tag)? {
            0 => Some("Adaptive".to_owned()),
            _ => None,
        },
        TAG_INTERLACE_METHOD => match dir.get_i64(tag)? {
            0 => Some("No Interlace".to_owned()),
            1 => Some("Adam7 Interlace".to_owned()),
            _ => None,
        },
        TAG_UNIT_SPECIFIER => match dir.get_i64(tag)? {
            0 => Some("Unspecified".to_owned()),
            1 => Some("Metres".to_owned()),
            _ => None,
        },
        TAG_IMAGE_WIDTH | TAG_IMAGE_HEIGHT => dir.get_i64(tag).map(|n| format!("{} pixels", n)),
        _ => None,
    }
}

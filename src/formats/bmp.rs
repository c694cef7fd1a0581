//! Decoding of BMP file and DIB headers.

use std::io::BufRead;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::directory::{Directory, DirectoryKind};
use crate::types::Result;
use crate::utils::BufReadExt;

pub const TAG_HEADER_SIZE: u16 = 0;
pub const TAG_IMAGE_HEIGHT: u16 = 1;
pub const TAG_IMAGE_WIDTH: u16 = 2;
pub const TAG_COLOR_PLANES: u16 = 3;
pub const TAG_BITS_PER_PIXEL: u16 = 4;
pub const TAG_COMPRESSION: u16 = 5;
pub const TAG_X_PIXELS_PER_METER: u16 = 6;
pub const TAG_Y_PIXELS_PER_METER: u16 = 7;
pub const TAG_PALETTE_COLOUR_COUNT: u16 = 8;
pub const TAG_IMPORTANT_COLOUR_COUNT: u16 = 9;
pub const TAG_IMAGE_SIZE: u16 = 10;

/// `BITMAPCOREHEADER` used by OS/2 1.x bitmaps.
const CORE_HEADER_SIZE: u32 = 12;
/// Width, height, planes and bit depth; `BITMAPINFOHEADER` (40 bytes) and OS/2 2.x headers
/// continue with `OPTIONAL_FIELDS`.
const SHORT_HEADER_SIZE: u32 = 16;

const OPTIONAL_FIELDS: [u16; 6] = [
    TAG_COMPRESSION,
    TAG_IMAGE_SIZE,
    TAG_X_PIXELS_PER_METER,
    TAG_Y_PIXELS_PER_METER,
    TAG_PALETTE_COLOUR_COUNT,
    TAG_IMPORTANT_COLOUR_COUNT,
];

pub fn load<R: ?Sized + BufRead>(r: &mut R) -> Result<Vec<Directory>> {
    let mut magic = [0u8; 2];
    try_if_eof!(r.read_exact(&mut magic), "when reading BMP signature");
    if &magic != b"BM" {
        return Err(invalid_format!("invalid BMP signature: {:?}", magic));
    }

    // file size, two reserved words and the pixel data offset
    if r.skip_exact(12)? != 12 {
        return Err(unexpected_eof!("when reading BMP file header"));
    }

    let header_size = try_if_eof!(r.read_u32::<LittleEndian>(), "when reading DIB header size");

    let mut directory = Directory::new(DirectoryKind::BmpHeader);
    directory.set(TAG_HEADER_SIZE, header_size);

    if header_size == CORE_HEADER_SIZE {
        let width = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading width");
        let height = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading height");
        let planes = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading color planes");
        let bpp = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading bits per pixel");
        directory
            .set(TAG_IMAGE_WIDTH, width)
            .set(TAG_IMAGE_HEIGHT, height)
            .set(TAG_COLOR_PLANES, planes)
            .set(TAG_BITS_PER_PIXEL, bpp)
            // core headers have no compression field, their pixel data is always plain
            .set(TAG_COMPRESSION, 0u32);
    } else if header_size >= SHORT_HEADER_SIZE {
        let width = try_if_eof!(r.read_i32::<LittleEndian>(), "when reading width");
        let height = try_if_eof!(r.read_i32::<LittleEndian>(), "when reading height");
        let planes = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading color planes");
        let bpp = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading bits per pixel");
        directory
            .set(TAG_IMAGE_WIDTH, width)
            // negative height means top-down row order
            .set(TAG_IMAGE_HEIGHT, height.unsigned_abs())
            .set(TAG_COLOR_PLANES, planes)
            .set(TAG_BITS_PER_PIXEL, bpp)
            .set(TAG_COMPRESSION, 0u32);

        // OS/2 2.x headers may end after any of these
        let present = (((header_size - SHORT_HEADER_SIZE) / 4) as usize).min(OPTIONAL_FIELDS.len());
        for &tag in &OPTIONAL_FIELDS[..present] {
            let value = try_if_eof!(r.read_u32::<LittleEndian>(), "when reading BMP header field {}", tag);
            match tag {
                TAG_X_PIXELS_PER_METER | TAG_Y_PIXELS_PER_METER => directory.set(tag, value as i32),
                _ => directory.set(tag, value),
            };
        }
    } else {
        return Err(invalid_format!("unsupported DIB header size: {}", header_size));
    }

    Ok(vec![directory])
}

pub fn compression_name(code: i64, header_size: Option<i64>) -> Option<&'static str> {
    Some(match code {
        0 => "None",
        1 => "RLE 8-bit/pixel",
        2 => "RLE 4-bit/pixel",
        // OS/2 2.x headers reuse code 3 for Huffman 1D
        3 if header_size == Some(64) => "Huffman 1D",
        3 => "Bit fields",
        4 if header_size == Some(64) => "RLE-24",
        4 => "JPEG",
        5 => "PNG",
        6 => "Alpha bit fields",
        11 => "CMYK",
        12 => "CMYK RLE-8",
        13 => "CMYK RLE-4",
        _ => return None,
    })
}

pub fn describe(dir: &Directory, tag: u16) -> Option<String> {
    match tag {
        TAG_BITS_PER_PIXEL => dir.get_i64(tag).map(|n| format!("{} bits", n)),
        TAG_COMPRESSION => dir.get_i64(tag).map(|c| {
            compression_name(c, dir.get_i64(TAG_HEADER_SIZE))
                .map(str::to_owned)
                .unwrap_or_else(|| format!("Illegal value 0x{:X}", c))
        }),
        TAG_IMAGE_WIDTH | TAG_IMAGE_HEIGHT => dir.get_i64(tag).map(|n| format!("{} pixels", n)),
        _ => None,
    }
}

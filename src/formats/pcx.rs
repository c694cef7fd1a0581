//! Decoding of the 128-byte PCX header.

use std::io::BufRead;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::directory::{Directory, DirectoryKind};
use crate::types::Result;
use crate::utils::BufReadExt;

pub const TAG_VERSION: u16 = 1;
pub const TAG_BITS_PER_PIXEL: u16 = 2;
pub const TAG_X_MIN: u16 = 3;
pub const TAG_Y_MIN: u16 = 4;
pub const TAG_X_MAX: u16 = 5;
pub const TAG_Y_MAX: u16 = 6;
pub const TAG_HORIZONTAL_DPI: u16 = 7;
pub const TAG_VERTICAL_DPI: u16 = 8;
pub const TAG_COLOR_PLANES: u16 = 10;
pub const TAG_BYTES_PER_LINE: u16 = 11;
pub const TAG_PALETTE_TYPE: u16 = 12;
pub const TAG_H_SCR_SIZE: u16 = 13;
pub const TAG_V_SCR_SIZE: u16 = 14;

const MANUFACTURER: u8 = 0x0a;
const RLE_ENCODING: u8 = 1;

/// Returns `true` if a PCX header may start with `version` byte.
pub fn is_known_version(version: u8) -> bool {
    matches!(version, 0 | 2 | 3 | 4 | 5)
}

pub fn load<R: ?Sized + BufRead>(r: &mut R) -> Result<Vec<Directory>> {
    let manufacturer = try_if_eof!(r.read_u8(), "when reading PCX manufacturer");
    if manufacturer != MANUFACTURER {
        return Err(invalid_format!("invalid PCX manufacturer: 0x{:X}", manufacturer));
    }
    let version = try_if_eof!(r.read_u8(), "when reading PCX version");
    if !is_known_version(version) {
        return Err(invalid_format!("invalid PCX version: {}", version));
    }
    let encoding = try_if_eof!(r.read_u8(), "when reading PCX encoding");
    if encoding != RLE_ENCODING {
        return Err(invalid_format!("invalid PCX encoding: {}", encoding));
    }

    let bits_per_pixel = try_if_eof!(r.read_u8(), "when reading bits per pixel");
    let x_min = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading x min");
    let y_min = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading y min");
    let x_max = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading x max");
    let y_max = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading y max");
    let h_dpi = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading horizontal DPI");
    let v_dpi = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading vertical DPI");

    // 16-color palette and a reserved byte
    if r.skip_exact(49)? != 49 {
        return Err(unexpected_eof!("when reading PCX header palette"));
    }

    let color_planes = try_if_eof!(r.read_u8(), "when reading color planes");
    let bytes_per_line = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading bytes per line");
    let palette_type = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading palette type");
    let h_scr_size = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading horizontal screen size");
    let v_scr_size = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading vertical screen size");

    let mut directory = Directory::new(DirectoryKind::Pcx);
    directory
        .set(TAG_VERSION, version)
        .set(TAG_BITS_PER_PIXEL, bits_per_pixel)
        .set(TAG_X_MIN, x_min)
        .set(TAG_Y_MIN, y_min)
        .set(TAG_X_MAX, x_max)
        .set(TAG_Y_MAX, y_max)
        .set(TAG_HORIZONTAL_DPI, h_dpi)
        .set(TAG_VERTICAL_DPI, v_dpi)
        .set(TAG_COLOR_PLANES, color_planes)
        .set(TAG_BYTES_PER_LINE, bytes_per_line)
        .set(TAG_PALETTE_TYPE, palette_type)
        .set(TAG_H_SCR_SIZE, h_scr_size)
        .set(TAG_V_SCR_SIZE, v_scr_size);
    Ok(vec![directory])
}

pub fn describe(dir: &Directory, tag: u16) -> Option<String> {
    match tag {
        TAG_VERSION => match dir.get_i64(tag)? {
            0 => Some("2.5".to_owned()),
            2 => Some("2.8 with palette".to_owned()),
            3 => Some("2.8 without palette".to_owned()),
            4 => Some("PC Paintbrush for Windows".to_owned()),
            5 => Some("3.0 or better".to_owned()),
            _ => None,
        },
        TAG_BITS_PER_PIXEL => dir.get_i64(tag).map(|n| format!("{} bits", n)),
        TAG_PALETTE_TYPE => match dir.get_i64(tag)? {
            1 => Some("Color or B&W".to_owned()),
            2 => Some("Grayscale".to_owned()),
            _ => None,
        },
        _ => None,
    }
}

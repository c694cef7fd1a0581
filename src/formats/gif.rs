//! Decoding of GIF headers and blocks.

use std::borrow::Cow;
use std::io::BufRead;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::directory::{Directory, DirectoryKind};
use crate::types::Result;
use crate::utils::{format_decimal, BufReadExt};

pub const TAG_GIF_FORMAT_VERSION: u16 = 1;
pub const TAG_IMAGE_WIDTH: u16 = 2;
pub const TAG_IMAGE_HEIGHT: u16 = 3;
pub const TAG_COLOR_TABLE_SIZE: u16 = 4;
pub const TAG_IS_COLOR_TABLE_SORTED: u16 = 5;
pub const TAG_BITS_PER_PIXEL: u16 = 6;
pub const TAG_HAS_GLOBAL_COLOR_TABLE: u16 = 7;
pub const TAG_BACKGROUND_COLOR_INDEX: u16 = 8;
pub const TAG_PIXEL_ASPECT_RATIO: u16 = 9;

pub const TAG_IMAGE_LEFT: u16 = 1;
pub const TAG_IMAGE_TOP: u16 = 2;
pub const TAG_WIDTH: u16 = 3;
pub const TAG_HEIGHT: u16 = 4;
pub const TAG_HAS_LOCAL_COLOR_TABLE: u16 = 5;
pub const TAG_IS_INTERLACED: u16 = 6;
pub const TAG_LOCAL_COLOR_TABLE_SIZE: u16 = 7;

pub const TAG_DELAY: u16 = 1;
pub const TAG_DISPOSAL_METHOD: u16 = 2;
pub const TAG_USER_INPUT_FLAG: u16 = 3;
pub const TAG_TRANSPARENT_COLOR_INDEX: u16 = 5;

/// Describes disposal methods used for GIF image frames.
///
/// Disposal method defines how the graphic should be treated after being displayed. Descriptions
/// of enum variants follow the GIF89a format.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DisposalMethod {
    /// The decoder is not required to take any action.
    None,
    /// The graphic is to be left in place.
    DoNotDispose,
    /// The area used by the graphic must be restored to the background color.
    RestoreToBackgroundColor,
    /// The decoder is required to restore the area overwritten by the graphic with what
    /// was there prior to rendering the graphic.
    RestoreToPrevious,
    /// Unknown disposal method.
    Unknown(u8),
}

impl DisposalMethod {
    fn from_u8(n: u8) -> Option<DisposalMethod> {
        match n {
            0 => Some(DisposalMethod::None),
            1 => Some(DisposalMethod::DoNotDispose),
            2 => Some(DisposalMethod::RestoreToBackgroundColor),
            3 => Some(DisposalMethod::RestoreToPrevious),
            n if n < 8 => Some(DisposalMethod::Unknown(n)),
            _ => None,
        }
    }

    fn description(self) -> Cow<'static, str> {
        match self {
            DisposalMethod::None => "Not Specified".into(),
            DisposalMethod::DoNotDispose => "Don't Dispose".into(),
            DisposalMethod::RestoreToBackgroundColor => "Restore to Background Color".into(),
            DisposalMethod::RestoreToPrevious => "Restore to Previous".into(),
            DisposalMethod::Unknown(n) => format!("Unknown ({})", n).into(),
        }
    }
}

fn skip_blocks<R: ?Sized + BufRead, F>(r: &mut R, on_eof: F) -> Result<()>
where
    F: Fn() -> Cow<'static, str>,
{
    loop {
        let n = try_if_eof!(r.read_u8(), on_eof()) as u64;
        if n == 0 {
            return Ok(());
        }
        if r.skip_exact(n)? != n {
            return Err(unexpected_eof!(on_eof()));
        }
    }
}

fn skip_color_table<R: ?Sized + BufRead>(r: &mut R, size: u16, what: &str) -> Result<()> {
    let skip_size = size as u64 * 3;
    if r.skip_exact(skip_size)? != skip_size {
        return Err(unexpected_eof!("when reading {}", what));
    }
    Ok(())
}

/// Reads an image descriptor block, i.e. a single frame, skipping its image data.
fn load_image_descriptor<R: ?Sized + BufRead>(index: usize, r: &mut R) -> Result<Directory> {
    let left = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading left offset of image block {}", index);
    let top = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading top offset of image block {}", index);
    let width = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading width of image block {}", index);
    let height = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading height of image block {}", index);

    let packed_flags = try_if_eof!(r.read_u8(), "when reading flags of image block {}", index);
    let local_color_table        = (0b10000000 & packed_flags) > 0;
    let interlace                = (0b01000000 & packed_flags) > 0;
    let local_color_table_size_p =  0b00000111 & packed_flags;

    let mut directory = Directory::new(DirectoryKind::GifImage);
    directory
        .set(TAG_IMAGE_LEFT, left)
        .set(TAG_IMAGE_TOP, top)
        .set(TAG_WIDTH, width)
        .set(TAG_HEIGHT, height)
        .set(TAG_HAS_LOCAL_COLOR_TABLE, local_color_table)
        .set(TAG_IS_INTERLACED, interlace);

    if local_color_table {
        let size = 1u16 << (local_color_table_size_p + 1);
        directory.set(TAG_LOCAL_COLOR_TABLE_SIZE, size);
        skip_color_table(r, size, &format!("color table of image block {}", index))?;
    }

    let _ = try_if_eof!(r.read_u8(), "when reading LZW minimum code size of image block {}", index);
    skip_blocks(r, || format!("when reading image data of image block {}", index).into())?;

    Ok(directory)
}

/// Reads a graphic control extension block, which usually leads an image descriptor and
/// carries the frame delay, disposal method and transparency.
fn load_graphic_control<R: ?Sized + BufRead>(index: usize, r: &mut R) -> Result<Directory> {
    const NAME: &str = "graphics control extension block";

    let block_size = try_if_eof!(r.read_u8(), "when reading block size of {} {}", NAME, index);
    if block_size != 0x04 {
        return Err(invalid_format!("invalid block size in {} {}: {}", NAME, index, block_size));
    }

    let packed_flags = try_if_eof!(r.read_u8(), "when reading flags of {} {}", NAME, index);
    let disposal_method =   (0b00011100 & packed_flags) >> 2;
    let user_input =        (0b00000010 & packed_flags) > 0;
    let transparent_color = (0b00000001 & packed_flags) > 0;

    let delay_time = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading delay time of {} {}", NAME, index);
    let transparent_color_index = try_if_eof!(
        r.read_u8(),
        "when reading transparent color index of {} {}", NAME, index
    );

    skip_blocks(r, || format!("when reading block terminator of {} {}", NAME, index).into())?;

    if DisposalMethod::from_u8(disposal_method).is_none() {
        return Err(invalid_format!("invalid disposal method in {} {}: {}", NAME, index, disposal_method));
    }

    let mut directory = Directory::new(DirectoryKind::GifControl);
    directory
        .set(TAG_DELAY, delay_time)
        .set(TAG_DISPOSAL_METHOD, disposal_method)
        .set(TAG_USER_INPUT_FLAG, user_input);
    if transparent_color {
        directory.set(TAG_TRANSPARENT_COLOR_INDEX, transparent_color_index);
    }
    Ok(directory)
}

pub fn load<R: ?Sized + BufRead>(r: &mut R) -> Result<Vec<Directory>> {
    let mut signature = [0u8; 6];
    try_if_eof!(r.read_exact(&mut signature), "when reading GIF signature");

    if &signature[..3] != b"GIF" {
        return Err(invalid_format!("invalid GIF signature: {:?}", &signature[..3]));
    }
    let version = match &signature[3..] {
        b"87a" => "87a",
        b"89a" => "89a",
        v => return Err(invalid_format!("invalid GIF version: {:?}", v)),
    };

    let width = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading logical width");
    let height = try_if_eof!(r.read_u16::<LittleEndian>(), "when reading logical height");

    let packed_flags = try_if_eof!(r.read_u8(), "when reading global flags");
    let global_color_table        = (packed_flags & 0b10000000) > 0;
    let global_color_table_sorted = (packed_flags & 0b00001000) > 0;
    let global_color_table_size_p =  packed_flags & 0b00000111;

    let background_color_index = try_if_eof!(r.read_u8(), "when reading background color index");
    let pixel_aspect_ratio = try_if_eof!(r.read_u8(), "when reading pixel aspect ratio");

    let mut header = Directory::new(DirectoryKind::GifHeader);
    header
        .set(TAG_GIF_FORMAT_VERSION, version)
        .set(TAG_IMAGE_WIDTH, width)
        .set(TAG_IMAGE_HEIGHT, height)
        .set(TAG_HAS_GLOBAL_COLOR_TABLE, global_color_table)
        .set(TAG_BITS_PER_PIXEL, global_color_table_size_p + 1)
        .set(TAG_BACKGROUND_COLOR_INDEX, background_color_index)
        .set(TAG_PIXEL_ASPECT_RATIO, pixel_aspect_ratio);

    if global_color_table {
        let size = 1u16 << (global_color_table_size_p + 1);
        header
            .set(TAG_COLOR_TABLE_SIZE, size)
            .set(TAG_IS_COLOR_TABLE_SORTED, global_color_table_sorted);
        skip_color_table(r, size, "global color table")?;
    }

    let mut directories = vec![header];
    let mut index = 0usize;
    loop {
        let separator = try_if_eof!(r.read_u8(), "when reading separator of block {}", index);
        match separator {
            0x2c => directories.push(load_image_descriptor(index, r)?),
            0x21 => {
                let label = try_if_eof!(r.read_u8(), "when reading label of block {}", index);
                match label {
                    0xf9 => directories.push(load_graphic_control(index, r)?),
                    // plain text, comment and application extensions carry nothing summarized here
                    0x01 | 0xfe | 0xff => {
                        skip_blocks(r, || format!("when reading extension block {}", index).into())?
                    }
                    _ => return Err(invalid_format!("unknown extension type of block {}: 0x{:X}", index, label)),
                }
            }
            0x3b => break,
            _ => return Err(invalid_format!("unknown block type of block {}: 0x{:X}", index, separator)),
        }
        index += 1;
    }

    Ok(directories)
}

pub fn describe(dir: &Directory, tag: u16) -> Option<String> {
    match (dir.kind(), tag) {
        (DirectoryKind::GifHeader, TAG_BITS_PER_PIXEL) => dir.get_i64(tag).map(|n| format!("{} bits", n)),
        (DirectoryKind::GifHeader, TAG_PIXEL_ASPECT_RATIO) => match dir.get_i64(tag)? {
            0 => Some("Not Specified".to_owned()),
            n => Some(format_decimal((n as f64 + 15.0) / 64.0)),
        },
        (DirectoryKind::GifHeader, TAG_HAS_GLOBAL_COLOR_TABLE)
        | (DirectoryKind::GifHeader, TAG_IS_COLOR_TABLE_SORTED)
        | (DirectoryKind::GifImage, TAG_HAS_LOCAL_COLOR_TABLE)
        | (DirectoryKind::GifImage, TAG_IS_INTERLACED)
        | (DirectoryKind::GifControl, TAG_USER_INPUT_FLAG) => {
            dir.get_i64(tag).map(|b| if b != 0 { "Yes" } else { "No" }.to_owned())
        }
        (DirectoryKind::GifControl, TAG_DELAY) => dir.get_i64(tag).map(|d| format!("{} ms", d * 10)),
        (DirectoryKind::GifControl, TAG_DISPOSAL_METHOD) => dir
            .get_i64(tag)
            .and_then(|n| DisposalMethod::from_u8(n as u8))
            .map(|m| m.description().into_owned()),
        _ => None,
    }
}

use std::fmt;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read, Seek};
use std::path::Path;

use arrayvec::ArrayVec;
use tracing::debug;

use crate::directory::{Directory, DirectoryKind, DirectorySet};
use crate::formats::{bmp, gif, jpeg, pcx, png, tiff};
use crate::types::Result;
use crate::utils::ReadExt;

/// Number of leading bytes needed to tell all supported formats apart.
pub const MAX_SIGNATURE_LEN: usize = 8;

/// Horizontal and vertical resolution reported for images which do not record one.
pub const DEFAULT_DPI: f64 = 96.0;

/// Container format of an image, as determined from its signature.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum FileType {
    Jpeg,
    Gif,
    Tiff,
    Bmp,
    Png,
    Pcx,
    Unknown,
}

impl FileType {
    /// Classifies the leading bytes of a file.
    pub fn from_signature(bytes: &[u8]) -> FileType {
        match bytes {
            [0xff, 0xd8, 0xff, ..] => FileType::Jpeg,
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => FileType::Gif,
            [b'I', b'I', 0x2a, 0x00, ..] | [b'M', b'M', 0x00, 0x2a, ..] => FileType::Tiff,
            [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', ..] => FileType::Png,
            [b'B', b'M', ..] => FileType::Bmp,
            [0x0a, version, 0x01, ..] if pcx::is_known_version(*version) => FileType::Pcx,
            _ => FileType::Unknown,
        }
    }

    pub fn mime_type(self) -> Option<&'static str> {
        match self {
            FileType::Jpeg => Some("image/jpeg"),
            FileType::Gif => Some("image/gif"),
            FileType::Tiff => Some("image/tiff"),
            FileType::Bmp => Some("image/bmp"),
            FileType::Png => Some("image/png"),
            FileType::Pcx => Some("image/x-pcx"),
            FileType::Unknown => None,
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match *self {
            FileType::Jpeg => "JPEG",
            FileType::Gif => "GIF",
            FileType::Tiff => "TIFF",
            FileType::Bmp => "BMP",
            FileType::Png => "PNG",
            FileType::Pcx => "PCX",
            FileType::Unknown => "unknown",
        })
    }
}

fn read_signature<R: ?Sized + Read>(r: &mut R) -> io::Result<ArrayVec<u8, MAX_SIGNATURE_LEN>> {
    let mut buf = [0u8; MAX_SIGNATURE_LEN];
    let n = r.read_exact_0(&mut buf)?;
    Ok(buf[..n].iter().cloned().collect())
}

/// Determines the format of a stream positioned at the start of a file.
///
/// The stream is rewound to its start afterwards, so it can be handed to a decoder right away.
/// Streams which are empty, too short, unreadable or have an unrecognized signature are
/// classified as `FileType::Unknown`; this function never fails.
pub fn detect<R: ?Sized + Read + Seek>(r: &mut R) -> FileType {
    let signature = match read_signature(r) {
        Ok(signature) => signature,
        Err(e) => {
            debug!("cannot read file signature: {}", e);
            return FileType::Unknown;
        }
    };
    if let Err(e) = r.rewind() {
        debug!("cannot rewind after reading file signature: {}", e);
        return FileType::Unknown;
    }

    let file_type = FileType::from_signature(&signature);
    debug!(signature = ?&signature[..], "detected {} file", file_type);
    file_type
}

/// Decodes the metadata directories of a stream of the given type.
///
/// The stream is rewound to its start before decoding.
pub fn decode_directories<R: ?Sized + BufRead + Seek>(r: &mut R, file_type: FileType) -> Result<DirectorySet> {
    r.rewind()?;
    let directories = match file_type {
        FileType::Jpeg => jpeg::load(r)?,
        FileType::Gif => gif::load(r)?,
        FileType::Tiff => tiff::load(r)?,
        FileType::Bmp => bmp::load(r)?,
        FileType::Png => png::load(r)?,
        FileType::Pcx => pcx::load(r)?,
        FileType::Unknown => return Err(invalid_format!("unknown file type")),
    };
    debug!("decoded {} {} directories", directories.len(), file_type);
    Ok(directories.into_iter().collect())
}

/// Detects the type of a stream and decodes its directories.
pub fn load<R: ?Sized + BufRead + Seek>(r: &mut R) -> Result<(FileType, DirectorySet)> {
    let file_type = detect(r);
    let directories = decode_directories(r, file_type)?;
    Ok((file_type, directories))
}

pub fn load_from_file<P: AsRef<Path>>(p: P) -> Result<(FileType, DirectorySet)> {
    let mut f = BufReader::new(File::open(p)?);
    load(&mut f)
}

/// Returns the horizontal and vertical resolution of an image in dots per inch.
///
/// This decodes the whole stream from its start again, independently of its current
/// position, and takes the density from whichever format-specific field records one.
/// Images without such a field get `DEFAULT_DPI`. Streams which cannot be decoded are
/// an error.
pub fn intrinsic_resolution<R: ?Sized + BufRead + Seek>(r: &mut R) -> Result<(f64, f64)> {
    r.rewind()?;
    let (_, directories) = load(r)?;
    Ok(directories
        .iter()
        .find_map(density)
        .unwrap_or((DEFAULT_DPI, DEFAULT_DPI)))
}

const CM_PER_INCH: f64 = 2.54;

fn positive(x: f64, y: f64) -> Option<(f64, f64)> {
    if x > 0.0 && y > 0.0 {
        Some((x, y))
    } else {
        None
    }
}

fn density(dir: &Directory) -> Option<(f64, f64)> {
    match dir.kind() {
        DirectoryKind::ExifIfd0 => {
            let x = dir.get_f64(tiff::TAG_X_RESOLUTION)?;
            let y = dir.get_f64(tiff::TAG_Y_RESOLUTION).unwrap_or(x);
            match dir.get_i64(tiff::TAG_RESOLUTION_UNIT) {
                Some(1) => None,
                Some(3) => positive(x * CM_PER_INCH, y * CM_PER_INCH),
                _ => positive(x, y),
            }
        }
        DirectoryKind::Jfif => {
            let x = dir.get_f64(jpeg::TAG_JFIF_RES_X)?;
            let y = dir.get_f64(jpeg::TAG_JFIF_RES_Y).unwrap_or(x);
            match dir.get_i64(jpeg::TAG_JFIF_UNITS)? {
                1 => positive(x, y),
                2 => positive(x * CM_PER_INCH, y * CM_PER_INCH),
                // only the aspect ratio is known
                _ => None,
            }
        }
        DirectoryKind::Png if dir.name() == png::PHYS => {
            if dir.get_i64(png::TAG_UNIT_SPECIFIER)? != 1 {
                return None;
            }
            positive(
                dir.get_f64(png::TAG_PIXELS_PER_UNIT_X)? / png::INCHES_PER_METER,
                dir.get_f64(png::TAG_PIXELS_PER_UNIT_Y)? / png::INCHES_PER_METER,
            )
        }
        DirectoryKind::BmpHeader => positive(
            dir.get_f64(bmp::TAG_X_PIXELS_PER_METER)? / png::INCHES_PER_METER,
            dir.get_f64(bmp::TAG_Y_PIXELS_PER_METER)? / png::INCHES_PER_METER,
        ),
        DirectoryKind::Pcx => positive(
            dir.get_f64(pcx::TAG_HORIZONTAL_DPI)?,
            dir.get_f64(pcx::TAG_VERTICAL_DPI)?,
        ),
        _ => None,
    }
}

use std::borrow::Cow;
use std::error;
use std::fmt;
use std::io;
use std::path::PathBuf;
use std::result;

use num::ToPrimitive;

#[derive(Debug)]
pub enum Error {
    /// The stream does not follow the structure of the detected format.
    InvalidFormat(Option<Cow<'static, str>>),
    /// The stream ended before a complete structure could be read.
    UnexpectedEndOfFile(Option<Cow<'static, str>>),
    /// Decoding succeeded, but the directory a summary is built from is absent.
    MissingDirectory(&'static str),
    /// The folder to scan does not exist or is not a directory.
    InvalidPath(PathBuf),
    Io(io::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidFormat(None) => write!(f, "invalid image format"),
            Error::InvalidFormat(Some(ref s)) => write!(f, "invalid image format: {}", s),
            Error::UnexpectedEndOfFile(None) => write!(f, "unexpected end of file"),
            Error::UnexpectedEndOfFile(Some(ref s)) => write!(f, "unexpected end of file: {}", s),
            Error::MissingDirectory(name) => write!(f, "{} directory is missing", name),
            Error::InvalidPath(ref p) => write!(f, "invalid path: {}", p.display()),
            Error::Io(ref e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    #[inline]
    fn from(e: io::Error) -> Error {
        Error::Io(e)
    }
}

pub type Result<T> = result::Result<T, Error>;

/// Pixel dimensions of an image.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    /// Builds dimensions from any pair of integers, or `None` when either of them
    /// does not fit into `u32` (e.g. it is negative).
    pub fn try_from_pair<T: ToPrimitive, U: ToPrimitive>(w: T, h: U) -> Option<Dimensions> {
        Some(Dimensions {
            width: w.to_u32()?,
            height: h.to_u32()?,
        })
    }
}

/// Formats as `WxH px`.
impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}x{} px", self.width, self.height)
    }
}

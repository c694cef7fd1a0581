//! Tag directories produced by format decoders.
//!
//! A directory is a named group of tag values decoded from one segment of an image
//! container (a JPEG marker segment, a PNG chunk, a TIFF IFD and so on). Tags are
//! identified by `u16` ids which are only meaningful within their directory kind;
//! the ids themselves are declared as constants next to the decoder of each format.

use std::collections::BTreeMap;
use std::fmt;

use num::rational::Ratio;
use num::ToPrimitive;

use crate::formats::{bmp, gif, jpeg, pcx, png, tiff};

/// Kind of a decoded directory.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub enum DirectoryKind {
    /// Start-of-frame data of a JPEG image.
    Jpeg,
    /// JFIF APP0 segment of a JPEG image.
    Jfif,
    /// The first image file directory of TIFF data, either a TIFF file itself or
    /// an EXIF segment embedded into another container.
    ExifIfd0,
    GifHeader,
    GifImage,
    GifControl,
    BmpHeader,
    /// A PNG chunk; the chunk type is a part of the directory name, e.g. `PNG-IHDR`.
    Png,
    Pcx,
}

impl DirectoryKind {
    /// Returns the conventional name of directories of this kind.
    pub fn name(self) -> &'static str {
        match self {
            DirectoryKind::Jpeg => "JPEG",
            DirectoryKind::Jfif => "JFIF",
            DirectoryKind::ExifIfd0 => "Exif IFD0",
            DirectoryKind::GifHeader => "GIF Header",
            DirectoryKind::GifImage => "GIF Image",
            DirectoryKind::GifControl => "GIF Control",
            DirectoryKind::BmpHeader => "BMP Header",
            DirectoryKind::Png => "PNG",
            DirectoryKind::Pcx => "PCX",
        }
    }
}

/// A value of a single tag.
#[derive(Clone, PartialEq, Debug)]
pub enum TagValue {
    Int(i64),
    Ints(Vec<i64>),
    Rational(Ratio<i64>),
    Rationals(Vec<Ratio<i64>>),
    Text(String),
    Bytes(Vec<u8>),
}

impl TagValue {
    /// Returns the value as a signed integer; for lists, their first element.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            TagValue::Int(n) => Some(n),
            TagValue::Ints(ref ns) => ns.first().cloned(),
            TagValue::Rational(r) => ratio_to_f64(r).and_then(|v| v.to_i64()),
            TagValue::Rationals(ref rs) => rs.first().and_then(|&r| ratio_to_f64(r)).and_then(|v| v.to_i64()),
            TagValue::Text(ref s) => s.trim().parse().ok(),
            TagValue::Bytes(_) => None,
        }
    }

    #[inline]
    pub fn as_u32(&self) -> Option<u32> {
        self.as_i64().and_then(|n| n.to_u32())
    }

    /// Returns the value as a floating point number; for lists, their first element.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            TagValue::Rational(r) => ratio_to_f64(r),
            TagValue::Rationals(ref rs) => rs.first().and_then(|&r| ratio_to_f64(r)),
            ref other => other.as_i64().map(|n| n as f64),
        }
    }
}

/// Converts a ratio to `f64`, returning `None` for a zero denominator.
pub fn ratio_to_f64(r: Ratio<i64>) -> Option<f64> {
    if *r.denom() == 0 {
        None
    } else {
        Some(*r.numer() as f64 / *r.denom() as f64)
    }
}

impl fmt::Display for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fn write_ratio(f: &mut fmt::Formatter, r: &Ratio<i64>) -> fmt::Result {
            if *r.denom() == 1 {
                write!(f, "{}", r.numer())
            } else {
                write!(f, "{}/{}", r.numer(), r.denom())
            }
        }

        match *self {
            TagValue::Int(n) => write!(f, "{}", n),
            TagValue::Ints(ref ns) => {
                for (i, n) in ns.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", n)?;
                }
                Ok(())
            }
            TagValue::Rational(ref r) => write_ratio(f, r),
            TagValue::Rationals(ref rs) => {
                for (i, r) in rs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write_ratio(f, r)?;
                }
                Ok(())
            }
            TagValue::Text(ref s) => f.write_str(s),
            TagValue::Bytes(ref bs) => {
                for (i, b) in bs.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{:02X}", b)?;
                }
                Ok(())
            }
        }
    }
}

/// A named group of tags of one kind.
#[derive(Clone, PartialEq, Debug)]
pub struct Directory {
    kind: DirectoryKind,
    name: String,
    tags: BTreeMap<u16, TagValue>,
}

impl Directory {
    /// Creates an empty directory with the conventional name of its kind.
    pub fn new(kind: DirectoryKind) -> Directory {
        Directory::with_name(kind, kind.name())
    }

    pub fn with_name<S: Into<String>>(kind: DirectoryKind, name: S) -> Directory {
        Directory {
            kind,
            name: name.into(),
            tags: BTreeMap::new(),
        }
    }

    #[inline]
    pub fn kind(&self) -> DirectoryKind {
        self.kind
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set<V: Into<TagValue>>(&mut self, tag: u16, value: V) -> &mut Directory {
        self.tags.insert(tag, value.into());
        self
    }

    /// Builder-style version of `set()`.
    pub fn with<V: Into<TagValue>>(mut self, tag: u16, value: V) -> Directory {
        self.set(tag, value);
        self
    }

    #[inline]
    pub fn get(&self, tag: u16) -> Option<&TagValue> {
        self.tags.get(&tag)
    }

    #[inline]
    pub fn get_i64(&self, tag: u16) -> Option<i64> {
        self.get(tag).and_then(TagValue::as_i64)
    }

    #[inline]
    pub fn get_u32(&self, tag: u16) -> Option<u32> {
        self.get(tag).and_then(TagValue::as_u32)
    }

    #[inline]
    pub fn get_f64(&self, tag: u16) -> Option<f64> {
        self.get(tag).and_then(TagValue::as_f64)
    }

    pub fn tags(&self) -> impl Iterator<Item = (u16, &TagValue)> {
        self.tags.iter().map(|(&t, v)| (t, v))
    }

    /// Returns a human-readable description of a tag, or `None` if the tag is absent.
    ///
    /// Descriptions are specific to the directory kind, e.g. the JPEG data precision
    /// is rendered as `8 bits` and an EXIF resolution as `72 dots per inch`. Tags without
    /// a dedicated rendering are described by their raw value.
    pub fn description(&self, tag: u16) -> Option<String> {
        let value = self.get(tag)?;
        let described = match self.kind {
            DirectoryKind::Jpeg => jpeg::describe(self, tag),
            DirectoryKind::Jfif => jpeg::describe_jfif(self, tag),
            DirectoryKind::ExifIfd0 => tiff::describe(self, tag),
            DirectoryKind::GifHeader | DirectoryKind::GifImage | DirectoryKind::GifControl => gif::describe(self, tag),
            DirectoryKind::BmpHeader => bmp::describe(self, tag),
            DirectoryKind::Png => png::describe(self, tag),
            DirectoryKind::Pcx => pcx::describe(self, tag),
        };
        Some(described.unwrap_or_else(|| value.to_string()))
    }
}

impl From<i64> for TagValue {
    fn from(n: i64) -> TagValue { TagValue::Int(n) }
}

impl From<u32> for TagValue {
    fn from(n: u32) -> TagValue { TagValue::Int(n as i64) }
}

impl From<i32> for TagValue {
    fn from(n: i32) -> TagValue { TagValue::Int(n as i64) }
}

impl From<u16> for TagValue {
    fn from(n: u16) -> TagValue { TagValue::Int(n as i64) }
}

impl From<u8> for TagValue {
    fn from(n: u8) -> TagValue { TagValue::Int(n as i64) }
}

impl From<bool> for TagValue {
    fn from(b: bool) -> TagValue { TagValue::Int(b as i64) }
}

impl From<Ratio<i64>> for TagValue {
    fn from(r: Ratio<i64>) -> TagValue { TagValue::Rational(r) }
}

impl From<String> for TagValue {
    fn from(s: String) -> TagValue { TagValue::Text(s) }
}

impl<'a> From<&'a str> for TagValue {
    fn from(s: &'a str) -> TagValue { TagValue::Text(s.to_owned()) }
}

/// An ordered collection of directories decoded from one stream.
#[derive(Clone, PartialEq, Debug, Default)]
pub struct DirectorySet {
    directories: Vec<Directory>,
}

impl DirectorySet {
    pub fn new() -> DirectorySet {
        DirectorySet::default()
    }

    /// Returns the first directory of the given kind.
    pub fn first(&self, kind: DirectoryKind) -> Option<&Directory> {
        self.directories.iter().find(|d| d.kind == kind)
    }

    /// Returns the first directory of the given kind with exactly the given name.
    pub fn named(&self, kind: DirectoryKind, name: &str) -> Option<&Directory> {
        self.directories.iter().find(|d| d.kind == kind && d.name == name)
    }

    pub fn of_kind(&self, kind: DirectoryKind) -> impl Iterator<Item = &Directory> {
        self.directories.iter().filter(move |d| d.kind == kind)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Directory> {
        self.directories.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.directories.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.directories.is_empty()
    }
}

impl FromIterator<Directory> for DirectorySet {
    fn from_iter<I: IntoIterator<Item = Directory>>(iter: I) -> DirectorySet {
        DirectorySet {
            directories: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a DirectorySet {
    type Item = &'a Directory;
    type IntoIter = std::slice::Iter<'a, Directory>;

    fn into_iter(self) -> Self::IntoIter {
        self.directories.iter()
    }
}

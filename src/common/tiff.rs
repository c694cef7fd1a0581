use std::collections::HashSet;
use std::io::{BufRead, Cursor, Seek, SeekFrom};

use num::rational::Ratio;
use tracing::debug;

use crate::directory::TagValue;
use crate::types::Result;
use crate::utils::{ByteOrder, ByteOrderReadExt};

/// Entries whose data is larger than this are skipped instead of being loaded.
const MAX_ENTRY_DATA_SIZE: u64 = 64 * 1024;

/// Upper bound on the number of IFDs followed through the next-IFD links.
const MAX_IFDS: usize = 64;

pub struct TiffReader<R: BufRead + Seek> {
    source: R,
}

impl<R: BufRead + Seek> TiffReader<R> {
    pub fn new(source: R) -> TiffReader<R> {
        TiffReader { source }
    }

    /// Reads the TIFF header at the current position of the source and returns an iterator
    /// over image file directories.
    ///
    /// All offsets in TIFF data are relative to the beginning of the header.
    pub fn ifds(&mut self) -> Result<Ifds<'_, R>> {
        let base = self.source.stream_position()?;

        let mut bom = [0u8; 2];
        try_if_eof!(self.source.read_exact(&mut bom), "when reading byte order mark");

        let byte_order = match &bom {
            b"II" => ByteOrder::Little,
            b"MM" => ByteOrder::Big,
            _ => return Err(invalid_format!("invalid TIFF BOM: {:?}", bom)),
        };

        let magic = try_if_eof!(self.source.read_u16_in(byte_order), "when reading magic number");
        if magic != 42 {
            return Err(invalid_format!("invalid TIFF magic number: {}", magic));
        }

        let first_ifd_offset = try_if_eof!(
            self.source.read_u32_in(byte_order),
            "when reading offset of the first IFD"
        );

        Ok(Ifds {
            source: &mut self.source,
            base,
            byte_order,
            next_ifd_offset: first_ifd_offset,
            visited: HashSet::new(),
        })
    }
}

pub struct Ifds<'a, R: BufRead + Seek + 'a> {
    source: &'a mut R,
    base: u64,
    byte_order: ByteOrder,
    next_ifd_offset: u32,
    visited: HashSet<u32>,
}

impl<'a, R: BufRead + Seek> Ifds<'a, R> {
    fn read_entry_data(&mut self, offset: u32, size: u64) -> Result<Vec<u8>> {
        self.source.seek(SeekFrom::Start(self.base + offset as u64))?;
        let mut data = vec![0u8; size as usize];
        try_if_eof!(self.source.read_exact(&mut data), "when reading data at offset {}", offset);
        Ok(data)
    }

    fn read_ifd(&mut self) -> Result<Option<Ifd>> {
        if self.next_ifd_offset == 0 || self.visited.len() >= MAX_IFDS {
            return Ok(None);
        }
        // cyclic IFD chains end the iteration
        if !self.visited.insert(self.next_ifd_offset) {
            return Ok(None);
        }

        let bo = self.byte_order;
        self.source.seek(SeekFrom::Start(self.base + self.next_ifd_offset as u64))?;

        let entry_count = try_if_eof!(
            self.source.read_u16_in(bo),
            "when reading number of entries in an IFD"
        );
        if entry_count == 0 {
            return Err(invalid_format!("number of entries in an IFD is zero"));
        }

        let mut raw_entries = Vec::with_capacity(entry_count as usize);
        for i in 0..entry_count {
            let tag = try_if_eof!(self.source.read_u16_in(bo), "when reading tag of IFD entry {}", i);
            let field_type = try_if_eof!(self.source.read_u16_in(bo), "when reading type of IFD entry {}", i);
            let count = try_if_eof!(self.source.read_u32_in(bo), "when reading count of IFD entry {}", i);
            let mut value = [0u8; 4];
            try_if_eof!(self.source.read_exact(&mut value), "when reading value of IFD entry {}", i);
            raw_entries.push((tag, field_type, count, value));
        }

        self.next_ifd_offset = try_if_eof!(self.source.read_u32_in(bo), "when reading the next IFD offset");

        let mut entries = Vec::with_capacity(raw_entries.len());
        for (tag, field_type, count, value) in raw_entries {
            let unit = match unit_size(field_type) {
                Some(unit) => unit,
                None => continue,
            };
            let size = unit * count as u64;
            if count == 0 || size > MAX_ENTRY_DATA_SIZE {
                continue;
            }

            let data = if size <= 4 {
                value[..size as usize].to_vec()
            } else {
                let offset = Cursor::new(&value[..]).read_u32_in(bo)?;
                match self.read_entry_data(offset, size) {
                    Ok(data) => data,
                    // a broken entry only loses its own value
                    Err(e) => {
                        debug!("skipping IFD entry {:#06x}: {}", tag, e);
                        continue;
                    }
                }
            };

            if let Some(v) = decode_value(field_type, count, &data, bo)? {
                entries.push((tag, v));
            }
        }

        Ok(Some(Ifd { entries }))
    }
}

impl<'a, R: BufRead + Seek> Iterator for Ifds<'a, R> {
    type Item = Result<Ifd>;

    fn next(&mut self) -> Option<Result<Ifd>> {
        match self.read_ifd() {
            Err(e) => {
                self.next_ifd_offset = 0;
                Some(Err(e))
            }
            Ok(Some(value)) => Some(Ok(value)),
            Ok(None) => None,
        }
    }
}

/// A decoded image file directory.
#[derive(Clone, PartialEq, Debug)]
pub struct Ifd {
    pub entries: Vec<(u16, TagValue)>,
}

fn unit_size(field_type: u16) -> Option<u64> {
    match field_type {
        1 | 2 | 6 | 7 => Some(1),
        3 | 8 => Some(2),
        4 | 9 => Some(4),
        5 | 10 => Some(8),
        // floating point values are not needed by anything here
        _ => None,
    }
}

fn decode_value(field_type: u16, count: u32, data: &[u8], bo: ByteOrder) -> Result<Option<TagValue>> {
    let mut r = Cursor::new(data);
    let count = count as usize;

    fn collapse<T, F: Fn(Vec<T>) -> TagValue, G: Fn(T) -> TagValue>(mut vs: Vec<T>, many: F, one: G) -> TagValue {
        if vs.len() == 1 {
            one(vs.remove(0))
        } else {
            many(vs)
        }
    }

    let value = match field_type {
        1 => collapse(data.iter().map(|&b| b as i64).collect(), TagValue::Ints, TagValue::Int),
        6 => collapse(data.iter().map(|&b| b as i8 as i64).collect(), TagValue::Ints, TagValue::Int),
        2 => {
            let end = data.iter().position(|&b| b == 0).unwrap_or(data.len());
            TagValue::Text(String::from_utf8_lossy(&data[..end]).trim().to_owned())
        }
        7 => TagValue::Bytes(data.to_vec()),
        3 => {
            let mut vs = Vec::with_capacity(count);
            for _ in 0..count {
                vs.push(r.read_u16_in(bo)? as i64);
            }
            collapse(vs, TagValue::Ints, TagValue::Int)
        }
        8 => {
            let mut vs = Vec::with_capacity(count);
            for _ in 0..count {
                vs.push(r.read_i16_in(bo)? as i64);
            }
            collapse(vs, TagValue::Ints, TagValue::Int)
        }
        4 => {
            let mut vs = Vec::with_capacity(count);
            for _ in 0..count {
                vs.push(r.read_u32_in(bo)? as i64);
            }
            collapse(vs, TagValue::Ints, TagValue::Int)
        }
        9 => {
            let mut vs = Vec::with_capacity(count);
            for _ in 0..count {
                vs.push(r.read_i32_in(bo)? as i64);
            }
            collapse(vs, TagValue::Ints, TagValue::Int)
        }
        5 => {
            let mut vs = Vec::with_capacity(count);
            for _ in 0..count {
                let n = r.read_u32_in(bo)? as i64;
                let d = r.read_u32_in(bo)? as i64;
                vs.push(Ratio::new_raw(n, d));
            }
            collapse(vs, TagValue::Rationals, TagValue::Rational)
        }
        10 => {
            let mut vs = Vec::with_capacity(count);
            for _ in 0..count {
                let n = r.read_i32_in(bo)? as i64;
                let d = r.read_i32_in(bo)? as i64;
                vs.push(Ratio::new_raw(n, d));
            }
            collapse(vs, TagValue::Rationals, TagValue::Rational)
        }
        _ => return Ok(None),
    };

    Ok(Some(value))
}

use std::io::{self, BufRead, ErrorKind, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

pub trait BufReadExt: BufRead {
    /// Skips up to `n` bytes, returning the number of bytes actually skipped.
    ///
    /// The returned value is less than `n` only if the end of stream has been reached.
    fn skip_exact(&mut self, n: u64) -> io::Result<u64> {
        let mut skipped = 0;
        loop {
            let available = match self.fill_buf() {
                Ok(n) => n.len(),
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            } as u64;
            let total = skipped + available;
            if total >= n {
                let extra = total - n;
                let to_skip = available - extra;
                skipped += to_skip;
                self.consume(to_skip as usize);
                break;
            }
            self.consume(available as usize);
            skipped += available;
            if available == 0 {
                break;
            }
        }
        Ok(skipped)
    }

    /// Skips everything up to and including `delim`, returning the number of bytes skipped.
    ///
    /// Returns zero only at the end of stream.
    fn skip_until_byte(&mut self, delim: u8) -> io::Result<usize> {
        let mut read = 0;
        loop {
            let (done, used) = {
                let available = match self.fill_buf() {
                    Ok(n) => n,
                    Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(e) => return Err(e),
                };
                match available.iter().position(|&b| b == delim) {
                    Some(i) => (true, i + 1),
                    None => (false, available.len()),
                }
            };
            self.consume(used);
            read += used;
            if done || used == 0 {
                return Ok(read);
            }
        }
    }
}

impl<R: BufRead + ?Sized> BufReadExt for R {}

pub trait ReadExt: Read {
    /// Like `read_exact()`, but returns the number of bytes read instead of failing
    /// when the stream ends early.
    fn read_exact_0(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut total = 0;
        while total < buf.len() {
            match self.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(ref e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(total)
    }
}

impl<R: Read + ?Sized> ReadExt for R {}

/// Byte order which is only known at runtime, e.g. from a TIFF header.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum ByteOrder {
    Little,
    Big,
}

pub trait ByteOrderReadExt: Read {
    #[inline]
    fn read_u16_in(&mut self, order: ByteOrder) -> io::Result<u16> {
        match order {
            ByteOrder::Little => self.read_u16::<LittleEndian>(),
            ByteOrder::Big => self.read_u16::<BigEndian>(),
        }
    }

    #[inline]
    fn read_u32_in(&mut self, order: ByteOrder) -> io::Result<u32> {
        match order {
            ByteOrder::Little => self.read_u32::<LittleEndian>(),
            ByteOrder::Big => self.read_u32::<BigEndian>(),
        }
    }

    #[inline]
    fn read_i16_in(&mut self, order: ByteOrder) -> io::Result<i16> {
        match order {
            ByteOrder::Little => self.read_i16::<LittleEndian>(),
            ByteOrder::Big => self.read_i16::<BigEndian>(),
        }
    }

    #[inline]
    fn read_i32_in(&mut self, order: ByteOrder) -> io::Result<i32> {
        match order {
            ByteOrder::Little => self.read_i32::<LittleEndian>(),
            ByteOrder::Big => self.read_i32::<BigEndian>(),
        }
    }
}

impl<R: Read + ?Sized> ByteOrderReadExt for R {}

/// Formats a floating point value with at most two fractional digits, dropping
/// trailing zeros (`99.99999` becomes `100`, `72.5` stays `72.5`).
pub fn format_decimal(value: f64) -> String {
    let s = format!("{:.2}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s == "-0" {
        "0".to_owned()
    } else {
        s.to_owned()
    }
}

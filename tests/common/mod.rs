//! Builders for minimal, structurally valid images of each supported format.
#![allow(dead_code)]

fn be16(v: u16) -> [u8; 2] {
    v.to_be_bytes()
}

fn be32(v: u32) -> [u8; 4] {
    v.to_be_bytes()
}

fn le16(v: u16) -> [u8; 2] {
    v.to_le_bytes()
}

fn le32(v: u32) -> [u8; 4] {
    v.to_le_bytes()
}

fn png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
    out.extend_from_slice(&be32(data.len() as u32));
    out.extend_from_slice(kind);
    out.extend_from_slice(data);
    // CRC is not verified by the decoder
    out.extend_from_slice(&[0, 0, 0, 0]);
}

/// An 8-bit RGB PNG image with an optional `pHYs` chunk in pixels per meter.
pub fn png(width: u32, height: u32, pixels_per_meter: Option<u32>) -> Vec<u8> {
    let mut out = b"\x89PNG\r\n\x1a\n".to_vec();

    let mut ihdr = Vec::new();
    ihdr.extend_from_slice(&be32(width));
    ihdr.extend_from_slice(&be32(height));
    ihdr.extend_from_slice(&[8, 2, 0, 0, 0]);
    png_chunk(&mut out, b"IHDR", &ihdr);

    png_chunk(&mut out, b"tEXt", b"Software\0fixture");

    if let Some(ppm) = pixels_per_meter {
        let mut phys = Vec::new();
        phys.extend_from_slice(&be32(ppm));
        phys.extend_from_slice(&be32(ppm));
        phys.push(1);
        png_chunk(&mut out, b"pHYs", &phys);
    }

    png_chunk(&mut out, b"IDAT", &[0x78, 0x9c, 0x63, 0x00, 0x00, 0x00, 0x01, 0x00, 0x01]);
    png_chunk(&mut out, b"IEND", &[]);
    out
}

/// A single-frame GIF89a image with a 256-color global color table.
pub fn gif(width: u16, height: u16) -> Vec<u8> {
    let mut out = b"GIF89a".to_vec();
    out.extend_from_slice(&le16(width));
    out.extend_from_slice(&le16(height));
    // global color table of 2^(7+1) entries
    out.extend_from_slice(&[0x87, 0, 0]);
    out.extend(std::iter::repeat(0u8).take(256 * 3));

    // graphic control extension
    out.extend_from_slice(&[0x21, 0xf9, 0x04, 0x00, 0x0a, 0x00, 0x00, 0x00]);

    // image descriptor
    out.push(0x2c);
    out.extend_from_slice(&le16(0));
    out.extend_from_slice(&le16(0));
    out.extend_from_slice(&le16(width));
    out.extend_from_slice(&le16(height));
    out.push(0);
    // LZW minimum code size, one data sub-block, terminator
    out.extend_from_slice(&[0x08, 0x02, 0x4c, 0x01, 0x00]);

    // comment extension
    out.extend_from_slice(&[0x21, 0xfe, 0x03, b'h', b'e', b'y', 0x00]);

    out.push(0x3b);
    out
}

/// A baseline (or, with `progressive`, progressive) JPEG header with optional JFIF and
/// EXIF segments, followed by a start-of-scan marker and a few bytes of scan data.
pub struct JpegBuilder {
    pub width: u16,
    pub height: u16,
    pub progressive: bool,
    pub jfif: Option<(u8, u16)>,
    pub exif: Option<Option<u32>>,
}

impl JpegBuilder {
    pub fn new(width: u16, height: u16) -> JpegBuilder {
        JpegBuilder {
            width,
            height,
            progressive: false,
            jfif: None,
            exif: None,
        }
    }

    pub fn jfif(mut self, units: u8, density: u16) -> JpegBuilder {
        self.jfif = Some((units, density));
        self
    }

    pub fn exif(mut self, x_resolution: u32) -> JpegBuilder {
        self.exif = Some(Some(x_resolution));
        self
    }

    /// Adds an EXIF segment which records the orientation only.
    pub fn exif_without_resolution(mut self) -> JpegBuilder {
        self.exif = Some(None);
        self
    }

    pub fn progressive(mut self) -> JpegBuilder {
        self.progressive = true;
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut out = vec![0xff, 0xd8];

        if let Some((units, density)) = self.jfif {
            let mut app0 = b"JFIF\0".to_vec();
            app0.extend_from_slice(&[1, 1, units]);
            app0.extend_from_slice(&be16(density));
            app0.extend_from_slice(&be16(density));
            app0.extend_from_slice(&[0, 0]);
            segment(&mut out, 0xe0, &app0);
        }

        if let Some(x_resolution) = self.exif {
            let mut app1 = b"Exif\0\0".to_vec();
            app1.extend_from_slice(&match x_resolution {
                Some(x_resolution) => exif_tiff(x_resolution),
                None => exif_tiff_orientation(),
            });
            segment(&mut out, 0xe1, &app1);
        }

        // quantization table contents do not matter here
        segment(&mut out, 0xdb, &[0u8; 65]);

        let mut sof = vec![8];
        sof.extend_from_slice(&be16(self.height));
        sof.extend_from_slice(&be16(self.width));
        sof.extend_from_slice(&[3, 1, 0x22, 0, 2, 0x11, 1, 3, 0x11, 1]);
        segment(&mut out, if self.progressive { 0xc2 } else { 0xc0 }, &sof);

        segment(&mut out, 0xda, &[3, 1, 0, 2, 0x11, 3, 0x11, 0, 0x3f, 0]);
        out.extend_from_slice(&[0x12, 0x34, 0xff, 0x00, 0x56]);
        out.extend_from_slice(&[0xff, 0xd9]);
        out
    }
}

fn segment(out: &mut Vec<u8>, marker: u8, payload: &[u8]) {
    out.extend_from_slice(&[0xff, marker]);
    out.extend_from_slice(&be16(payload.len() as u16 + 2));
    out.extend_from_slice(payload);
}

/// Big-endian TIFF data with an IFD0 holding only the resolution in dots per inch.
fn exif_tiff(x_resolution: u32) -> Vec<u8> {
    let mut out = b"MM\0\x2a".to_vec();
    out.extend_from_slice(&be32(8));

    // two entries: 2 + 2 * 12 + 4 = 30 bytes, the rational follows at offset 38
    out.extend_from_slice(&be16(2));
    out.extend_from_slice(&be16(0x011a));
    out.extend_from_slice(&be16(5));
    out.extend_from_slice(&be32(1));
    out.extend_from_slice(&be32(38));
    out.extend_from_slice(&be16(0x0128));
    out.extend_from_slice(&be16(3));
    out.extend_from_slice(&be32(1));
    out.extend_from_slice(&[0, 2, 0, 0]);
    out.extend_from_slice(&be32(0));

    out.extend_from_slice(&be32(x_resolution));
    out.extend_from_slice(&be32(1));
    out
}

/// Big-endian TIFF data with an IFD0 holding the orientation tag alone.
fn exif_tiff_orientation() -> Vec<u8> {
    let mut out = b"MM\0\x2a".to_vec();
    out.extend_from_slice(&be32(8));
    out.extend_from_slice(&be16(1));
    out.extend_from_slice(&be16(0x0112));
    out.extend_from_slice(&be16(3));
    out.extend_from_slice(&be32(1));
    out.extend_from_slice(&[0, 1, 0, 0]);
    out.extend_from_slice(&be32(0));
    out
}

fn ifd_entry(out: &mut Vec<u8>, tag: u16, kind: u16, count: u32, value: [u8; 4]) {
    out.extend_from_slice(&le16(tag));
    out.extend_from_slice(&le16(kind));
    out.extend_from_slice(&le32(count));
    out.extend_from_slice(&value);
}

/// A little-endian uncompressed RGB TIFF header with 8 bits per sample.
pub fn tiff(width: u16, height: u16, dpi: u32) -> Vec<u8> {
    build_tiff(width, height, dpi, None)
}

/// Like `tiff()`, with an extra 20-character Software entry whose data lives at
/// `software_offset`, which may well point past the end of the file.
pub fn tiff_with_software(width: u16, height: u16, dpi: u32, software_offset: u32) -> Vec<u8> {
    build_tiff(width, height, dpi, Some(software_offset))
}

fn build_tiff(width: u16, height: u16, dpi: u32, software_offset: Option<u32>) -> Vec<u8> {
    let mut out = b"II\x2a\0".to_vec();
    out.extend_from_slice(&le32(8));

    let entries: u16 = if software_offset.is_some() { 8 } else { 7 };
    // data area right after the IFD
    let data_offset = 8 + 2 + entries as u32 * 12 + 4;
    let bits_offset = data_offset;
    let x_res_offset = bits_offset + 6;
    let y_res_offset = x_res_offset + 8;

    let short = |v: u16| {
        let b = le16(v);
        [b[0], b[1], 0, 0]
    };

    out.extend_from_slice(&le16(entries));
    ifd_entry(&mut out, 0x0100, 3, 1, short(width));
    ifd_entry(&mut out, 0x0101, 3, 1, short(height));
    ifd_entry(&mut out, 0x0102, 3, 3, le32(bits_offset));
    ifd_entry(&mut out, 0x0103, 3, 1, short(1));
    ifd_entry(&mut out, 0x011a, 5, 1, le32(x_res_offset));
    ifd_entry(&mut out, 0x011b, 5, 1, le32(y_res_offset));
    ifd_entry(&mut out, 0x0128, 3, 1, short(2));
    if let Some(offset) = software_offset {
        ifd_entry(&mut out, 0x0131, 2, 20, le32(offset));
    }
    out.extend_from_slice(&le32(0));

    for _ in 0..3 {
        out.extend_from_slice(&le16(8));
    }
    for _ in 0..2 {
        out.extend_from_slice(&le32(dpi));
        out.extend_from_slice(&le32(1));
    }
    out
}

/// A Windows BMP header followed by no pixel data.
pub fn bmp(width: i32, height: i32, bits_per_pixel: u16, compression: u32) -> Vec<u8> {
    let mut out = b"BM".to_vec();
    out.extend_from_slice(&le32(54));
    out.extend_from_slice(&le32(0));
    out.extend_from_slice(&le32(54));

    out.extend_from_slice(&le32(40));
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&le16(1));
    out.extend_from_slice(&le16(bits_per_pixel));
    out.extend_from_slice(&le32(compression));
    out.extend_from_slice(&le32(0));
    out.extend_from_slice(&le32(2835));
    out.extend_from_slice(&le32(2835));
    out.extend_from_slice(&le32(0));
    out.extend_from_slice(&le32(0));
    out
}

/// Like `bmp()`, with the DIB header cut down to `header_size` bytes (at most 40), as
/// written by OS/2 2.x.
pub fn bmp_with_header_size(width: i32, height: i32, bits_per_pixel: u16, header_size: u32) -> Vec<u8> {
    let mut out = bmp(width, height, bits_per_pixel, 0);
    out[14..18].copy_from_slice(&le32(header_size));
    out.truncate(14 + header_size as usize);
    out
}

/// A version 5 PCX header.
pub fn pcx(x_max: u16, y_max: u16, dpi: u16) -> Vec<u8> {
    let mut out = vec![0x0a, 5, 1, 8];
    out.extend_from_slice(&le16(0));
    out.extend_from_slice(&le16(0));
    out.extend_from_slice(&le16(x_max));
    out.extend_from_slice(&le16(y_max));
    out.extend_from_slice(&le16(dpi));
    out.extend_from_slice(&le16(dpi));
    out.extend(std::iter::repeat(0u8).take(48));
    out.push(0);
    out.push(3);
    out.extend_from_slice(&le16(x_max + 1));
    out.extend_from_slice(&le16(1));
    out.extend_from_slice(&le16(0));
    out.extend_from_slice(&le16(0));
    out.resize(128, 0);
    out
}

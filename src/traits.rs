use std::io::{BufRead, Seek};

use crate::generic;
use crate::types::Result;

/// A source of the resolution an image has when decoded as a whole, used when no
/// explicit resolution tag is available.
pub trait IntrinsicResolution {
    /// Returns horizontal and vertical resolution in dots per inch.
    fn intrinsic_resolution(&mut self) -> Result<(f64, f64)>;
}

/// Any seekable stream can be decoded again from its start.
impl<R: BufRead + Seek> IntrinsicResolution for R {
    #[inline]
    fn intrinsic_resolution(&mut self) -> Result<(f64, f64)> {
        generic::intrinsic_resolution(self)
    }
}

/// The summarized metadata of a recognized image.
///
/// Each field is optional on its own: a recognized image may simply lack the tag a field is
/// computed from.
#[derive(Clone, PartialEq, Eq, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ImageDetails {
    /// Pixel dimensions, `WxH px`.
    pub resolution: Option<String>,
    pub dpi: Option<String>,
    pub color_depth: Option<String>,
    pub compression: Option<String>,
}

/// The summary of one scanned file.
///
/// The name is always present. Details are present only if the file was recognized and
/// its metadata decoded; otherwise the record carries the name alone.
#[derive(Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FileRecord {
    name: String,
    #[cfg_attr(feature = "serde", serde(flatten))]
    details: Option<ImageDetails>,
}

impl FileRecord {
    pub fn new<S: Into<String>>(name: S, details: ImageDetails) -> FileRecord {
        FileRecord {
            name: name.into(),
            details: Some(details),
        }
    }

    pub fn name_only<S: Into<String>>(name: S) -> FileRecord {
        FileRecord {
            name: name.into(),
            details: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn details(&self) -> Option<&ImageDetails> {
        self.details.as_ref()
    }

    #[inline]
    pub fn resolution(&self) -> Option<&str> {
        self.details.as_ref()?.resolution.as_deref()
    }

    #[inline]
    pub fn dpi(&self) -> Option<&str> {
        self.details.as_ref()?.dpi.as_deref()
    }

    #[inline]
    pub fn color_depth(&self) -> Option<&str> {
        self.details.as_ref()?.color_depth.as_deref()
    }

    #[inline]
    pub fn compression(&self) -> Option<&str> {
        self.details.as_ref()?.compression.as_deref()
    }
}

//! Thumbnail references discovered while processing pages.
//!
//! A page asks for a thumbnail by writing an image URL with a size suffix,
//! e.g. `![Dawn](:static/photos/dawn.jpg|400x)`. The size is `WxH` where
//! either side may be empty, but not both. The generated file sits next to
//! the original under a deterministic name:
//!
//! ```text
//! static/photos/dawn.jpg  + 400x   →  static/photos/dawn[400x].jpg
//! static/photos/dawn.jpg  + x300   →  static/photos/dawn[x300].jpg
//! static/photos/dawn.jpg  + 400x300 →  static/photos/dawn[400x300].jpg
//! ```

use serde::Serialize;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ThumbnailError {
    #[error("No width or height specified for \"{0}\"")]
    MissingSize(String),
    #[error("Invalid thumbnail size \"{0}\"")]
    InvalidSize(String),
    #[error("Thumbnail URL has no file extension: \"{0}\"")]
    NoExtension(String),
}

/// A requested thumbnail: original image URL plus target width and/or height.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Thumbnail {
    original_url: String,
    width: Option<u32>,
    height: Option<u32>,
    filename: String,
}

impl Thumbnail {
    /// Zero sizes count as unset; at least one side must remain.
    pub fn new(
        original_url: &str,
        width: Option<u32>,
        height: Option<u32>,
    ) -> Result<Self, ThumbnailError> {
        let width = width.filter(|&w| w > 0);
        let height = height.filter(|&h| h > 0);
        if width.is_none() && height.is_none() {
            return Err(ThumbnailError::MissingSize(original_url.to_string()));
        }

        let (basename, extension) = original_url
            .rsplit_once('.')
            .filter(|(_, ext)| !ext.is_empty() && !ext.contains('/'))
            .ok_or_else(|| ThumbnailError::NoExtension(original_url.to_string()))?;

        let filename = format!(
            "{}[{}x{}].{}",
            basename,
            width.map(|w| w.to_string()).unwrap_or_default(),
            height.map(|h| h.to_string()).unwrap_or_default(),
            extension
        );

        Ok(Self {
            original_url: original_url.to_string(),
            width,
            height,
            filename,
        })
    }

    pub fn original_url(&self) -> &str {
        &self.original_url
    }

    pub fn width(&self) -> Option<u32> {
        self.width
    }

    pub fn height(&self) -> Option<u32> {
        self.height
    }

    /// Site-relative path of the generated file.
    pub fn filename(&self) -> &str {
        &self.filename
    }
}

impl fmt::Display for Thumbnail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Thumbnail[{}]", self.filename)
    }
}

/// Parse a `WxH` size where either side may be empty.
///
/// A bare number is a width: `"200"` → `(Some(200), None)`.
pub fn parse_size(size: &str) -> Result<(Option<u32>, Option<u32>), ThumbnailError> {
    let size = size.trim();
    let (w, h) = size.split_once('x').unwrap_or((size, ""));
    let parse = |part: &str| -> Result<Option<u32>, ThumbnailError> {
        let part = part.trim();
        if part.is_empty() {
            Ok(None)
        } else {
            part.parse()
                .map(Some)
                .map_err(|_| ThumbnailError::InvalidSize(size.to_string()))
        }
    };
    Ok((parse(w)?, parse(h)?))
}

/// Interpret an image source of the form `url|WxH` as a thumbnail request.
///
/// Returns `Ok(None)` for plain image sources. A leading `:` (site-absolute
/// marker) is stripped from the URL; callers warn when it is missing.
pub fn parse_thumbnail_src(src: &str) -> Result<Option<Thumbnail>, ThumbnailError> {
    let mut parts = src.split('|');
    let (Some(url), Some(size), None) = (parts.next(), parts.next(), parts.next()) else {
        return Ok(None);
    };
    let url = url.strip_prefix(':').unwrap_or(url);
    let (width, height) = parse_size(size)?;
    Thumbnail::new(url, width, height).map(Some)
}

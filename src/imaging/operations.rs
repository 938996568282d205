//! High-level thumbnail operation: identify, plan, then hand off to a backend.
//!
//! Planning is separated from execution so the sizing logic can be tested
//! with the mock backend.

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_thumbnail_size;
use super::params::{Quality, ThumbnailParams};
use crate::thumbnail::Thumbnail;
use std::path::Path;

pub type Result<T> = std::result::Result<T, BackendError>;

/// Plan the exact output size for `thumbnail` given the source dimensions.
pub fn plan_thumbnail(
    source: &Path,
    output: &Path,
    source_dims: (u32, u32),
    thumbnail: &Thumbnail,
) -> Result<ThumbnailParams> {
    let (width, height) =
        calculate_thumbnail_size(source_dims, thumbnail.width(), thumbnail.height()).ok_or_else(
            || BackendError::ProcessingFailed(format!("{thumbnail} has no size")),
        )?;
    Ok(ThumbnailParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        width,
        height,
        quality: Quality::default(),
    })
}

/// Generate `output` from `source` at the size requested by `thumbnail`.
///
/// Creates the output's parent directory if needed.
pub fn create_thumbnail(
    backend: &(impl ImageBackend + ?Sized),
    source: &Path,
    output: &Path,
    thumbnail: &Thumbnail,
) -> Result<ThumbnailParams> {
    let dims = backend.identify(source)?;
    let params = plan_thumbnail(source, output, (dims.width, dims.height), thumbnail)?;
    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    backend.thumbnail(&params)?;
    Ok(params)
}

//! Thumbnail generation, pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Thumbnail** | `resize_exact` (Lanczos3) + encoder by extension |
//!
//! The module is split into:
//! - **Calculations**: pure dimension math (unit testable)
//! - **Parameters**: data structures describing an operation
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: combine calculations and a backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::calculate_thumbnail_size;
pub use operations::create_thumbnail;
pub use params::{Quality, ThumbnailParams};
pub use rust_backend::RustBackend;

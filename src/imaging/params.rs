//! Parameter types for image operations.
//!
//! These structs describe *what* to produce. [`operations`](super::operations)
//! fills them in from a thumbnail request and the source dimensions; the
//! [`backend`](super::backend) does the pixel work.

use std::path::PathBuf;

/// Quality setting for lossy encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(pub u8);

impl Quality {
    pub fn new(value: u8) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// A fully resolved thumbnail operation: exact output size, no cropping.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub quality: Quality,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_is_clamped() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(150).value(), 100);
        assert_eq!(Quality::new(85).value(), 85);
    }

    #[test]
    fn quality_default() {
        assert_eq!(Quality::default().value(), 90);
    }
}

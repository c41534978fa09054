use std::io::Cursor;

use image::{ImageReader, Limits};
use thiserror::Error;
use tracing::{instrument, warn};

#[derive(Debug, Error)]
pub enum ImagingError {
    #[error("failed to read image header: {source}")]
    Decode {
        #[from]
        source: image::ImageError,
    },

    #[error("failed to sniff image format: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("input too large: {size} bytes, max {max_size}")]
    InputTooLarge { size: usize, max_size: usize },

    #[error("image has a zero dimension: {width}x{height}")]
    ZeroDimension { width: u32, height: u32 },

    #[error("image too large: {width}x{height}, max side {max_dimension}")]
    DimensionsTooLarge {
        width: u32,
        height: u32,
        max_dimension: u32,
    },

    #[error("input bytes empty")]
    EmptyInput,

    #[error("unsupported image format")]
    UnsupportedFormat,
}

#[derive(Clone, Debug)]
pub struct ProbeConfig {
    pub max_input_bytes: usize,
    pub max_dimension: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_input_bytes: 64 * 1024 * 1024,
            max_dimension: 30_000,
        }
    }
}

/// Reads width and height from the header only; pixel data is never decoded.
#[instrument(skip(config, raw_bytes), fields(input_size = raw_bytes.len()))]
pub fn probe_dimensions(config: &ProbeConfig, raw_bytes: &[u8]) -> Result<(u32, u32), ImagingError> {
    if raw_bytes.is_empty() {
        return Err(ImagingError::EmptyInput);
    }

    if raw_bytes.len() > config.max_input_bytes {
        return Err(ImagingError::InputTooLarge {
            size: raw_bytes.len(),
            max_size: config.max_input_bytes,
        });
    }

    let mut reader = ImageReader::new(Cursor::new(raw_bytes)).with_guessed_format()?;
    if reader.format().is_none() {
        return Err(ImagingError::UnsupportedFormat);
    }

    let mut limits = Limits::default();
    limits.max_image_width = Some(config.max_dimension);
    limits.max_image_height = Some(config.max_dimension);
    reader.limits(limits);

    let (width, height) = reader.into_dimensions()?;
    if width == 0 || height == 0 {
        warn!(width, height, "image reports a zero dimension");
        return Err(ImagingError::ZeroDimension { width, height });
    }

    if width > config.max_dimension || height > config.max_dimension {
        return Err(ImagingError::DimensionsTooLarge {
            width,
            height,
            max_dimension: config.max_dimension,
        });
    }

    Ok((width, height))
}

/// Height as a percentage of width, the value used for the wrapper's
/// `padding-bottom`.
pub fn aspect_ratio(raw_bytes: &[u8]) -> Result<f64, ImagingError> {
    let (width, height) = probe_dimensions(&ProbeConfig::default(), raw_bytes)?;
    Ok(f64::from(height) / f64::from(width) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ExtendedColorType, ImageBuffer, ImageEncoder, Rgba};
    use proptest::prelude::*;

    fn create_test_png(width: u32, height: u32) -> Vec<u8> {
        let img: ImageBuffer<Rgba<u8>, Vec<u8>> = ImageBuffer::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8, 255])
        });
        let mut buffer = Vec::new();
        image::codecs::png::PngEncoder::new(&mut buffer)
            .write_image(img.as_raw(), width, height, ExtendedColorType::Rgba8)
            .unwrap();
        buffer
    }

    #[test]
    fn reads_dimensions_from_png() {
        let png = create_test_png(40, 30);
        assert_eq!(probe_dimensions(&ProbeConfig::default(), &png).unwrap(), (40, 30));
    }

    #[test]
    fn landscape_ratio_is_below_hundred() {
        let ratio = aspect_ratio(&create_test_png(200, 100)).unwrap();
        assert!((ratio - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn rejects_empty_and_unknown_input() {
        assert!(matches!(aspect_ratio(&[]), Err(ImagingError::EmptyInput)));
        assert!(matches!(
            aspect_ratio(b"<html>not an image</html>"),
            Err(ImagingError::UnsupportedFormat)
        ));
    }

    #[test]
    fn rejects_oversized_input() {
        let config = ProbeConfig {
            max_input_bytes: 16,
            ..Default::default()
        };
        let png = create_test_png(10, 10);
        assert!(matches!(
            probe_dimensions(&config, &png),
            Err(ImagingError::InputTooLarge { .. })
        ));
    }

    #[test]
    fn rejects_dimensions_over_limit() {
        let config = ProbeConfig {
            max_dimension: 8,
            ..Default::default()
        };
        let png = create_test_png(10, 4);
        assert!(probe_dimensions(&config, &png).is_err());
    }

    proptest! {
        #[test]
        fn ratio_matches_height_over_width(width in 1u32..64, height in 1u32..64) {
            let ratio = aspect_ratio(&create_test_png(width, height)).unwrap();
            let expected = f64::from(height) / f64::from(width) * 100.0;
            prop_assert!((ratio - expected).abs() < 1e-9);
        }
    }
}

//! Raster post-processing for rendered diagrams.
//!
//! Vector output is rasterized, oversized rasters are downscaled with the
//! aspect ratio preserved, and the final intrinsic size is read back from
//! the image itself.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{GenericImageView, ImageFormat};

use crate::error::DiagramError;

/// Output bounds for post-processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterLimits {
    pub max_width: u32,
    pub max_height: u32,
    /// Used when rasterizing SVG.
    pub dpi: u32,
}

impl Default for RasterLimits {
    fn default() -> Self {
        Self {
            max_width: 1600,
            max_height: 2400,
            dpi: 192,
        }
    }
}

/// PNG bytes with their pixel size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Raster {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Normalize renderer output to a bounded PNG.
pub fn normalize(data: &[u8], limits: RasterLimits) -> Result<Raster, DiagramError> {
    let png;
    let data = if looks_like_svg(data) {
        png = rasterize_svg(data, limits.dpi)?;
        png.as_slice()
    } else {
        data
    };

    let format =
        image::guess_format(data).map_err(|e| DiagramError::InvalidImage(e.to_string()))?;
    let (width, height) = dimensions(data)
        .ok_or_else(|| DiagramError::InvalidImage("unreadable image header".to_owned()))?;

    if format == ImageFormat::Png && width <= limits.max_width && height <= limits.max_height {
        return Ok(Raster {
            bytes: data.to_vec(),
            width,
            height,
        });
    }

    let mut img =
        image::load_from_memory(data).map_err(|e| DiagramError::InvalidImage(e.to_string()))?;
    if width > limits.max_width || height > limits.max_height {
        tracing::debug!(
            width,
            height,
            max_width = limits.max_width,
            max_height = limits.max_height,
            "downscaling diagram"
        );
        img = img.resize(limits.max_width, limits.max_height, FilterType::Lanczos3);
    }
    let (width, height) = img.dimensions();
    let mut bytes = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .map_err(|e| DiagramError::InvalidImage(e.to_string()))?;

    Ok(Raster {
        bytes,
        width,
        height,
    })
}

/// Pixel size of an encoded image.
///
/// PNG headers are read directly; other formats are decoded.
#[must_use]
pub fn dimensions(data: &[u8]) -> Option<(u32, u32)> {
    png_dimensions(data).or_else(|| {
        image::load_from_memory(data)
            .ok()
            .map(|img| img.dimensions())
    })
}

/// Width and height from a PNG IHDR chunk (bytes 16-24, big-endian).
fn png_dimensions(data: &[u8]) -> Option<(u32, u32)> {
    if data.len() < 24 || &data[0..8] != b"\x89PNG\r\n\x1a\n" {
        return None;
    }
    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Some((width, height))
}

fn looks_like_svg(data: &[u8]) -> bool {
    let head = &data[..data.len().min(512)];
    let text = String::from_utf8_lossy(head);
    let text = text.trim_start();
    text.starts_with("<svg") || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Rasterize SVG at the given DPI.
pub fn rasterize_svg(data: &[u8], dpi: u32) -> Result<Vec<u8>, DiagramError> {
    let text = std::str::from_utf8(data)
        .map_err(|_| DiagramError::InvalidImage("SVG is not valid UTF-8".to_owned()))?;

    #[allow(clippy::cast_precision_loss)]
    let dpi = dpi as f32;
    let scale = dpi / 96.0;
    let options = resvg::usvg::Options {
        dpi,
        ..resvg::usvg::Options::default()
    };
    let tree = resvg::usvg::Tree::from_str(text, &options)
        .map_err(|e| DiagramError::InvalidImage(format!("SVG parse error: {e}")))?;

    let size = tree.size().to_int_size();
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let (width, height) = (
        (size.width() as f32 * scale).ceil() as u32,
        (size.height() as f32 * scale).ceil() as u32,
    );
    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| DiagramError::InvalidImage(format!("bad SVG size {width}x{height}")))?;
    pixmap.fill(resvg::tiny_skia::Color::WHITE);
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    pixmap
        .encode_png()
        .map_err(|e| DiagramError::InvalidImage(format!("PNG encoding error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbaImage};
    use pretty_assertions::assert_eq;

    fn encode(img: &DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    fn png(width: u32, height: u32) -> Vec<u8> {
        encode(
            &DynamicImage::ImageRgba8(RgbaImage::new(width, height)),
            ImageFormat::Png,
        )
    }

    #[test]
    fn test_png_dimensions_from_header() {
        assert_eq!(png_dimensions(&png(120, 45)), Some((120, 45)));
        assert_eq!(png_dimensions(b"not a png"), None);
    }

    #[test]
    fn test_small_png_passes_through() {
        let data = png(200, 100);
        let raster = normalize(&data, RasterLimits::default()).unwrap();
        assert_eq!(raster.bytes, data);
        assert_eq!((raster.width, raster.height), (200, 100));
    }

    #[test]
    fn test_large_png_is_downscaled_preserving_aspect() {
        let limits = RasterLimits {
            max_width: 100,
            max_height: 100,
            dpi: 96,
        };
        let raster = normalize(&png(400, 200), limits).unwrap();
        assert_eq!((raster.width, raster.height), (100, 50));
        assert_eq!(dimensions(&raster.bytes), Some((100, 50)));
    }

    #[test]
    fn test_jpeg_is_reencoded_as_png() {
        let jpeg = encode(
            &DynamicImage::ImageRgb8(image::RgbImage::new(30, 20)),
            ImageFormat::Jpeg,
        );
        let raster = normalize(&jpeg, RasterLimits::default()).unwrap();
        assert_eq!(image::guess_format(&raster.bytes).unwrap(), ImageFormat::Png);
        assert_eq!((raster.width, raster.height), (30, 20));
    }

    #[test]
    fn test_svg_is_rasterized() {
        let svg = br#"<svg xmlns="http://www.w3.org/2000/svg" width="48" height="24"><rect width="48" height="24" fill="red"/></svg>"#;
        let limits = RasterLimits {
            dpi: 192,
            ..RasterLimits::default()
        };
        let raster = normalize(svg, limits).unwrap();
        assert_eq!((raster.width, raster.height), (96, 48));
    }

    #[test]
    fn test_garbage_is_invalid_image() {
        let err = normalize(b"definitely not an image", RasterLimits::default()).unwrap_err();
        assert!(matches!(err, DiagramError::InvalidImage(_)));
    }
}

// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of FluxION.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Raster images placed in the report, currently the optional cover logo.

use std::path::{Path, PathBuf};

use image::DynamicImage;
use miniz_oxide::deflate::{CompressionLevel, compress_to_vec_zlib};
use tracing::{debug, warn};

use crate::error::{ReportError, ReportResult};

/// Decoded image, recompressed with Flate for embedding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfImage {
    pub width: u32,
    pub height: u32,
    /// Zlib-compressed 8-bit RGB samples
    pub rgb: Vec<u8>,
    /// Zlib-compressed 8-bit alpha samples, absent for opaque sources
    pub alpha: Option<Vec<u8>>,
}

impl PdfImage {
    /// Decode a PNG or JPEG file held in memory
    ///
    /// # Errors
    ///
    /// `ReportError::Render` when the bytes are not a supported image.
    pub fn decode(bytes: &[u8]) -> ReportResult<Self> {
        let dynamic = image::load_from_memory(bytes)
            .map_err(|e| ReportError::Render(format!("unreadable image: {e}")))?;
        Self::from_dynamic(&dynamic)
    }

    /// Read and decode an image file
    ///
    /// # Errors
    ///
    /// `ReportError::Io` when the file cannot be read, `ReportError::Render` when it is
    /// not a supported image.
    pub fn open(path: &Path) -> ReportResult<Self> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    fn from_dynamic(dynamic: &DynamicImage) -> ReportResult<Self> {
        let (width, height) = (dynamic.width(), dynamic.height());
        if width == 0 || height == 0 {
            return Err(ReportError::Render("image has no pixels".to_owned()));
        }

        let level = CompressionLevel::DefaultLevel as u8;
        let rgb = compress_to_vec_zlib(dynamic.to_rgb8().as_raw(), level);
        let alpha = dynamic.color().has_alpha().then(|| {
            let samples: Vec<u8> = dynamic.to_rgba8().pixels().map(|p| p.0[3]).collect();
            compress_to_vec_zlib(&samples, level)
        });

        Ok(Self {
            width,
            height,
            rgb,
            alpha,
        })
    }

    /// Largest size with the image's aspect ratio inside a `max_width` × `max_height` box, in mm
    #[must_use]
    pub fn fit(&self, max_width: f32, max_height: f32) -> (f32, f32) {
        let ratio = self.height as f32 / self.width as f32;
        let width = max_width.min(max_height / ratio);
        (width, width * ratio)
    }
}

/// `path` when it names an existing regular file
#[must_use]
pub fn validate_logo(path: &Path) -> Option<PathBuf> {
    if path.as_os_str().is_empty() {
        return None;
    }
    if !path.is_file() {
        warn!("⚠️ [PDF] Logo {} not found or not a file, skipping", path.display());
        return None;
    }
    Some(path.to_path_buf())
}

/// The cover logo at `path`, or `None` when it is missing or unreadable
#[must_use]
pub fn load_logo(path: &Path) -> Option<PdfImage> {
    let path = validate_logo(path)?;
    match PdfImage::open(&path) {
        Ok(logo) => {
            debug!("🖼️ [PDF] Logo {} loaded ({}x{})", path.display(), logo.width, logo.height);
            Some(logo)
        }
        Err(e) => {
            warn!("⚠️ [PDF] Logo {} ignored: {e}", path.display());
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};

    use super::*;

    fn encode(image: DynamicImage, format: ImageFormat) -> Vec<u8> {
        let mut bytes = Vec::new();
        image.write_to(&mut Cursor::new(&mut bytes), format).unwrap();
        bytes
    }

    #[test]
    fn test_decode_png_with_transparency() {
        let png = encode(
            DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 2, Rgba([46, 134, 193, 128]))),
            ImageFormat::Png,
        );
        let logo = PdfImage::decode(&png).unwrap();

        assert_eq!((logo.width, logo.height), (4, 2));
        let rgb = miniz_oxide::inflate::decompress_to_vec_zlib(&logo.rgb).unwrap();
        assert_eq!(rgb.len(), 4 * 2 * 3);
        assert_eq!(&rgb[..3], &[46, 134, 193]);
        let alpha = miniz_oxide::inflate::decompress_to_vec_zlib(&logo.alpha.unwrap()).unwrap();
        assert_eq!(alpha, vec![128; 8]);
    }

    #[test]
    fn test_decode_opaque_jpeg_has_no_mask() {
        let jpeg = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(8, 8, Rgb([255, 255, 255]))),
            ImageFormat::Jpeg,
        );
        let logo = PdfImage::decode(&jpeg).unwrap();
        assert_eq!((logo.width, logo.height), (8, 8));
        assert!(logo.alpha.is_none());
    }

    #[test]
    fn test_garbage_is_rejected() {
        assert!(matches!(
            PdfImage::decode(b"not an image"),
            Err(ReportError::Render(_))
        ));
    }

    #[test]
    fn test_fit_keeps_aspect_ratio() {
        let wide = PdfImage {
            width: 400,
            height: 100,
            rgb: Vec::new(),
            alpha: None,
        };
        assert_eq!(wide.fit(108.0, 90.0), (108.0, 27.0));

        let tall = PdfImage {
            width: 100,
            height: 200,
            ..wide
        };
        assert_eq!(tall.fit(108.0, 90.0), (45.0, 90.0));
    }

    #[test]
    fn test_missing_or_directory_logo_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(validate_logo(Path::new("")), None);
        assert_eq!(validate_logo(&dir.path().join("logo.png")), None);
        assert_eq!(validate_logo(dir.path()), None);
        assert!(load_logo(&dir.path().join("logo.png")).is_none());
    }

    #[test]
    fn test_load_logo_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("logo.png");
        let png = encode(
            DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 3, Rgb([0, 0, 0]))),
            ImageFormat::Png,
        );
        std::fs::write(&path, png).unwrap();
        assert_eq!(validate_logo(&path), Some(path.clone()));
        assert_eq!(load_logo(&path).map(|logo| logo.width), Some(3));

        let broken = dir.path().join("broken.png");
        std::fs::write(&broken, b"\x89PNG truncated").unwrap();
        assert!(load_logo(&broken).is_none());
    }
}

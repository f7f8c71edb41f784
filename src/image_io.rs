//! Image loading and export
//!
//! Decodes input files into RGBA buffers for the crop engine and writes
//! cropped results back out. Metadata such as EXIF is not carried over.

use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat, RgbaImage};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

use crate::crop::{CropError, CropGeometry, Rect};

/// File extensions treated as images when expanding directories
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "webp",
];

/// Image I/O error types
#[derive(Debug, Error)]
pub enum ImageIoError {
    #[error("Image not found: {0}")]
    ImageNotFound(PathBuf),

    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    Crop(#[from] CropError),
}

pub type Result<T> = std::result::Result<T, ImageIoError>;

/// Dimensions and estimated encoded size of a crop
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CropSummary {
    pub width: u32,
    pub height: u32,
    pub estimated_bytes: usize,
}

impl CropSummary {
    /// Summarize `image`, estimating its size as PNG
    pub fn of(image: &RgbaImage) -> Result<Self> {
        let (width, height) = image.dimensions();
        let mut buf = Vec::new();
        PngEncoder::new(&mut buf)
            .write_image(image.as_raw(), width, height, ExtendedColorType::Rgba8)
            .map_err(|e| ImageIoError::InvalidImage(e.to_string()))?;
        Ok(Self {
            width,
            height,
            estimated_bytes: buf.len(),
        })
    }

    /// Estimated size in KiB
    pub fn estimated_kib(&self) -> f64 {
        self.estimated_bytes as f64 / 1024.0
    }
}

/// Decode an image file into RGBA8
pub fn load_image(path: &Path) -> Result<RgbaImage> {
    if !path.exists() {
        return Err(ImageIoError::ImageNotFound(path.to_path_buf()));
    }
    let img = image::open(path).map_err(|e| ImageIoError::InvalidImage(e.to_string()))?;
    debug!(path = %path.display(), width = img.width(), height = img.height(), "image decoded");
    Ok(img.to_rgba8())
}

/// Copy the pixels of `rect` out of `image`
pub fn extract_crop(image: &RgbaImage, rect: Rect) -> Result<RgbaImage> {
    let rect = CropGeometry::validate(rect)?;
    let bounds = Rect::full(image.width(), image.height());
    if !bounds.contains(&rect) {
        return Err(CropError::InvalidInput(format!(
            "crop {rect} exceeds the {}x{} image",
            image.width(),
            image.height()
        ))
        .into());
    }

    Ok(image::imageops::crop_imm(
        image,
        rect.x as u32,
        rect.y as u32,
        rect.width as u32,
        rect.height as u32,
    )
    .to_image())
}

/// Write `image`; the format follows the file extension.
///
/// Formats without alpha support get an RGB copy.
pub fn save_image(image: &RgbaImage, path: &Path) -> Result<()> {
    let format = ImageFormat::from_path(path)
        .map_err(|_| ImageIoError::UnsupportedFormat(path.display().to_string()))?;
    if !format.can_write() {
        return Err(ImageIoError::UnsupportedFormat(format!("{format:?}")));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let result = match format {
        ImageFormat::Jpeg | ImageFormat::Bmp => {
            DynamicImage::ImageRgba8(image.clone()).to_rgb8().save_with_format(path, format)
        }
        _ => image.save_with_format(path, format),
    };
    result.map_err(|e| ImageIoError::InvalidImage(e.to_string()))?;
    debug!(path = %path.display(), "image written");
    Ok(())
}

/// Output path for `input`: `<output_dir>/<stem><suffix>.<ext>`
pub fn output_path_for(input: &Path, output_dir: &Path, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "png".to_string());
    output_dir.join(format!("{stem}{suffix}.{ext}"))
}

/// True when `path` has a supported image extension
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

/// True when `path` looks like an earlier output written with `suffix`
pub fn is_crop_output(path: &Path, suffix: &str) -> bool {
    !suffix.is_empty()
        && path
            .file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| stem.ends_with(suffix))
}

/// Collect image files from a list of files and directories.
///
/// Directory entries are sorted and skip earlier outputs carrying
/// `output_suffix`; explicit files are kept even without a known extension.
pub fn collect_image_files(inputs: &[PathBuf], output_suffix: &str) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        if input.is_file() {
            files.push(input.clone());
        } else if input.is_dir() {
            let mut found = Vec::new();
            for entry in std::fs::read_dir(input)? {
                let path = entry?.path();
                if path.is_file()
                    && is_supported_image(&path)
                    && !is_crop_output(&path, output_suffix)
                {
                    found.push(path);
                }
            }
            found.sort();
            files.extend(found);
        } else {
            return Err(ImageIoError::ImageNotFound(input.clone()));
        }
    }

    Ok(files)
}

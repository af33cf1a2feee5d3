//! Image resizing for logo thumbnails and region icons.
//!
//! Every output is written as PNG. SVG sources are rasterized with resvg
//! at the requested size, everything else is decoded with the `image`
//! crate and resampled with a Lanczos filter.

use std::path::Path;

use image::imageops::{self, FilterType};
use image::{ImageFormat, RgbaImage};
use resvg::{tiny_skia, usvg};

use crate::error::{Error, Result};

/// Whether `path` has an `.svg` extension.
#[must_use]
pub fn is_svg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("svg"))
}

/// Output name for an image: its stem with a `.png` extension.
#[must_use]
pub fn png_name(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(filename);
    format!("{stem}.png")
}

/// Scale `width` so that `height` becomes `target`, keeping the aspect
/// ratio. Never returns 0.
fn scaled(width: u32, height: u32, target: u32) -> u32 {
    let scaled = u64::from(width) * u64::from(target) / u64::from(height.max(1));
    u32::try_from(scaled.max(1)).unwrap_or(u32::MAX)
}

#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
fn rasterize_svg(source: &Path, height: u32) -> Result<RgbaImage> {
    let data = std::fs::read(source)?;
    let tree = usvg::Tree::from_data(&data, &usvg::Options::default())
        .map_err(|e| Error::image(source, e))?;

    let size = tree.size();
    let scale = height as f32 / size.height();
    let width = ((size.width() * scale).round() as u32).max(1);

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| Error::image(source, format!("cannot allocate {width}x{height} canvas")))?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );

    let pixels = pixmap
        .pixels()
        .iter()
        .flat_map(|p| {
            let c = p.demultiply();
            [c.red(), c.green(), c.blue(), c.alpha()]
        })
        .collect();
    RgbaImage::from_raw(width, height, pixels)
        .ok_or_else(|| Error::image(source, "rendered buffer has the wrong size"))
}

fn open_raster(source: &Path) -> Result<RgbaImage> {
    let img = image::open(source).map_err(|e| Error::image(source, e))?;
    Ok(img.to_rgba8())
}

fn save_png(img: &RgbaImage, dest: &Path) -> Result<()> {
    img.save_with_format(dest, ImageFormat::Png)
        .map_err(|e| Error::image(dest, e))
}

/// Write a PNG copy of `source` scaled to `height` pixels high.
///
/// Returns the dimensions of the written image.
///
/// # Errors
///
/// Returns [`Error::Image`] if the source cannot be decoded or the PNG
/// cannot be written.
pub fn thumbnail_to_height(source: &Path, dest: &Path, height: u32) -> Result<(u32, u32)> {
    let thumb = if is_svg(source) {
        rasterize_svg(source, height)?
    } else {
        let img = open_raster(source)?;
        let width = scaled(img.width(), img.height(), height);
        imageops::resize(&img, width, height, FilterType::Lanczos3)
    };
    save_png(&thumb, dest)?;
    Ok(thumb.dimensions())
}

/// Write `source` as a `size`×`size` PNG icon.
///
/// Larger images are shrunk to fit, keeping their aspect ratio; smaller
/// ones keep their size. The image is centered on a transparent canvas.
///
/// # Errors
///
/// Returns [`Error::Image`] if the source cannot be decoded or the PNG
/// cannot be written.
pub fn fit_square(source: &Path, dest: &Path, size: u32) -> Result<()> {
    let mut img = if is_svg(source) {
        rasterize_svg(source, size)?
    } else {
        open_raster(source)?
    };

    let (width, height) = img.dimensions();
    if width > size || height > size {
        let (w, h) = if width >= height {
            (size, scaled(height, width, size))
        } else {
            (scaled(width, height, size), size)
        };
        img = imageops::resize(&img, w, h, FilterType::Lanczos3);
    }

    let mut canvas = RgbaImage::new(size, size);
    let x = (size - img.width()) / 2;
    let y = (size - img.height()) / 2;
    imageops::overlay(&mut canvas, &img, i64::from(x), i64::from(y));
    save_png(&canvas, dest)
}

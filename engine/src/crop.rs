//! Crop and placement math, plus crop rasterization for image wallpapers.
//!
//! Two coordinate conventions are in play. Media layers are positioned with a
//! gravity-filled (aspect-fill) resize plus a transform in Y-up layer space;
//! the rasterizer draws into a pixel buffer with Y pointing down. The user's
//! crop offsets are Y-down, so the layer path inverts the vertical offset
//! while the rasterizer applies it directly. Both paths produce the same
//! visual placement.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::{DynamicImage, ImageBuffer, Rgba};

use crate::types::CropSpec;

/// Transform applied to a gravity-filled media layer: uniform scale about the
/// layer center plus a translation in Y-up layer space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayerPlacement {
    pub scale: f64,
    pub tx: f64,
    pub ty: f64,
}

impl Default for LayerPlacement {
    fn default() -> Self {
        Self {
            scale: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }
}

/// Placement of resized content inside a container, in Y-down pixel space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Compute the layer transform for a crop. The layer is assumed to already
/// aspect-fill its window via resize gravity, so only the user adjustment
/// remains. The vertical offset flips sign going from the Y-down crop space
/// to the Y-up layer space.
pub fn layer_placement(crop: &CropSpec) -> LayerPlacement {
    LayerPlacement {
        scale: crop.scale,
        tx: crop.offset_x,
        ty: -crop.offset_y,
    }
}

/// Size of `content` scaled to fully cover `container` while preserving
/// aspect ratio. One dimension matches the container exactly, the other
/// overflows.
pub fn aspect_fill_size(content: (u32, u32), container: (u32, u32)) -> (f64, f64) {
    let (cw, ch) = (content.0 as f64, content.1 as f64);
    let (tw, th) = (container.0 as f64, container.1 as f64);

    let content_aspect = cw / ch;
    let container_aspect = tw / th;

    if content_aspect > container_aspect {
        // Wider than the container: match height, overflow width.
        (th * content_aspect, th)
    } else {
        // Taller (or equal): match width, overflow height.
        (tw, tw / content_aspect)
    }
}

/// Full placement of content inside a container for a crop, in Y-down pixel
/// space: aspect-fill, user zoom about the center, then pan.
pub fn placement_rect(content: (u32, u32), container: (u32, u32), crop: &CropSpec) -> PlacementRect {
    let (fill_w, fill_h) = aspect_fill_size(content, container);
    let width = fill_w * crop.scale;
    let height = fill_h * crop.scale;

    let (tw, th) = (container.0 as f64, container.1 as f64);
    PlacementRect {
        x: (tw - width) / 2.0 + crop.offset_x,
        y: (th - height) / 2.0 + crop.offset_y,
        width,
        height,
    }
}

/// Fast image resizing using fast_image_resize (Lanczos3).
fn resize_image_fast(
    image: &DynamicImage,
    target_width: u32,
    target_height: u32,
) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    use fast_image_resize as fr;

    let src_image = image.to_rgba8();
    let (src_width, src_height) = src_image.dimensions();

    let src = fr::images::Image::from_vec_u8(
        TryInto::try_into(src_width)?,
        TryInto::try_into(src_height)?,
        src_image.into_raw(),
        fr::PixelType::U8x4,
    )
    .context("Failed to create source image")?;

    let mut dst = fr::images::Image::new(
        TryInto::try_into(target_width)?,
        TryInto::try_into(target_height)?,
        fr::PixelType::U8x4,
    );

    let mut resizer = fr::Resizer::new();
    resizer
        .resize(
            &src,
            &mut dst,
            &fr::ResizeOptions::new()
                .resize_alg(fr::ResizeAlg::Convolution(fr::FilterType::Lanczos3)),
        )
        .context("Failed to resize image")?;

    ImageBuffer::from_raw(target_width, target_height, dst.into_vec())
        .context("Failed to create output image buffer")
}

/// Rasterize a cropped image at the target display resolution.
///
/// The content is aspect-filled, zoomed, and panned per the crop, then
/// composited onto an opaque black canvas. Regions the content does not cover
/// (possible with negative zoom headroom or large pans) stay black.
pub fn render_cropped(
    image: &DynamicImage,
    crop: &CropSpec,
    target_width: u32,
    target_height: u32,
) -> Result<ImageBuffer<Rgba<u8>, Vec<u8>>> {
    let placement = placement_rect(
        (image.width(), image.height()),
        (target_width, target_height),
        crop,
    );

    let draw_width = placement.width.round().max(1.0) as u32;
    let draw_height = placement.height.round().max(1.0) as u32;
    let resized = resize_image_fast(image, draw_width, draw_height)?;

    let mut canvas =
        ImageBuffer::from_pixel(target_width, target_height, Rgba([0, 0, 0, 255]));
    image::imageops::overlay(
        &mut canvas,
        &resized,
        placement.x.round() as i64,
        placement.y.round() as i64,
    );

    Ok(canvas)
}

/// Rasterize a cropped source image to a kept temporary PNG and return its
/// path. The caller hands the path to the platform desktop-picture API, which
/// only accepts files.
pub fn render_cropped_to_temp(
    source: &Path,
    crop: &CropSpec,
    target_width: u32,
    target_height: u32,
) -> Result<PathBuf> {
    let image = image::open(source)
        .with_context(|| format!("Failed to open image: {}", source.display()))?;

    let canvas = render_cropped(&image, crop, target_width, target_height)?;

    let file = tempfile::Builder::new()
        .prefix("fluxwall-crop-")
        .suffix(".png")
        .tempfile()
        .context("Failed to create temp file for cropped image")?;
    let path = file.into_temp_path().keep()?;

    canvas
        .save_with_format(&path, image::ImageFormat::Png)
        .with_context(|| format!("Failed to write cropped image: {}", path.display()))?;

    log::debug!(
        "Rendered cropped image {}x{} -> {}",
        target_width,
        target_height,
        path.display()
    );
    Ok(path)
}

/// Synthesize a flat-color desktop picture, used when the platform cannot
/// supply a default wallpaper to restore.
pub fn flat_color_picture(width: u32, height: u32, rgba: [u8; 4]) -> Result<PathBuf> {
    let canvas: ImageBuffer<Rgba<u8>, Vec<u8>> =
        ImageBuffer::from_pixel(width, height, Rgba(rgba));

    let file = tempfile::Builder::new()
        .prefix("fluxwall-fallback-")
        .suffix(".png")
        .tempfile()
        .context("Failed to create temp file for fallback picture")?;
    let path = file.into_temp_path().keep()?;

    canvas
        .save_with_format(&path, image::ImageFormat::Png)
        .context("Failed to write fallback picture")?;

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_aspect_fill_wide_content() {
        // 2:1 content into a 1:1 container fills by height.
        let (w, h) = aspect_fill_size((200, 100), (100, 100));
        assert!(close(h, 100.0));
        assert!(close(w, 200.0));
    }

    #[test]
    fn test_aspect_fill_tall_content() {
        // 1:2 content into a 1:1 container fills by width.
        let (w, h) = aspect_fill_size((100, 200), (100, 100));
        assert!(close(w, 100.0));
        assert!(close(h, 200.0));
    }

    #[test]
    fn test_aspect_fill_matching_aspect() {
        let (w, h) = aspect_fill_size((1920, 1080), (3840, 2160));
        assert!(close(w, 3840.0));
        assert!(close(h, 2160.0));
    }

    #[test]
    fn test_identity_crop_centers_fill() {
        // With the default crop, matching aspect content covers the container
        // exactly, anchored at the origin.
        let rect = placement_rect((1920, 1080), (1920, 1080), &CropSpec::default());
        assert!(close(rect.x, 0.0));
        assert!(close(rect.y, 0.0));
        assert!(close(rect.width, 1920.0));
        assert!(close(rect.height, 1080.0));
    }

    #[test]
    fn test_zoom_expands_about_center() {
        let crop = CropSpec {
            scale: 2.0,
            ..CropSpec::default()
        };
        let rect = placement_rect((100, 100), (100, 100), &crop);
        assert!(close(rect.width, 200.0));
        assert!(close(rect.x, -50.0));
        assert!(close(rect.y, -50.0));
    }

    #[test]
    fn test_pan_moves_pixel_rect_down() {
        // Positive offset_y pans down in pixel space.
        let crop = CropSpec {
            offset_y: 10.0,
            ..CropSpec::default()
        };
        let rect = placement_rect((100, 100), (100, 100), &crop);
        assert!(close(rect.y, 10.0));
    }

    #[test]
    fn test_layer_placement_inverts_vertical_offset() {
        let crop = CropSpec {
            scale: 1.5,
            offset_x: 12.0,
            offset_y: 30.0,
        };
        let placement = layer_placement(&crop);
        assert!(close(placement.scale, 1.5));
        assert!(close(placement.tx, 12.0));
        assert!(close(placement.ty, -30.0));
    }

    #[test]
    fn test_render_cropped_covers_canvas() {
        let image = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
            64,
            64,
            Rgba([255, 255, 255, 255]),
        ));
        let canvas = render_cropped(&image, &CropSpec::default(), 32, 32).unwrap();
        assert_eq!(canvas.dimensions(), (32, 32));
        // Identity crop of matching-aspect content leaves no black borders.
        assert_eq!(canvas.get_pixel(0, 0)[0], 255);
        assert_eq!(canvas.get_pixel(31, 31)[0], 255);
    }

    #[test]
    fn test_render_cropped_pan_leaves_black_edge() {
        let image = DynamicImage::ImageRgba8(ImageBuffer::from_pixel(
            32,
            32,
            Rgba([255, 255, 255, 255]),
        ));
        let crop = CropSpec {
            offset_x: 16.0,
            ..CropSpec::default()
        };
        let canvas = render_cropped(&image, &crop, 32, 32).unwrap();
        // Panned right: the left edge exposes the black canvas.
        assert_eq!(canvas.get_pixel(0, 16)[0], 0);
        assert_eq!(canvas.get_pixel(31, 16)[0], 255);
    }

    #[test]
    fn test_flat_color_picture_written() {
        let path = flat_color_picture(16, 16, [40, 40, 40, 255]).unwrap();
        let reopened = image::open(&path).unwrap().to_rgba8();
        assert_eq!(reopened.dimensions(), (16, 16));
        assert_eq!(reopened.get_pixel(8, 8)[0], 40);
        std::fs::remove_file(path).ok();
    }
}

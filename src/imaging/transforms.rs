//! Built-in transforms for [`DynamicImage`].
//!
//! | Step type | Options |
//! |---|---|
//! | `thumbnail` | `size = [w, h]`, `mode = "inset" \| "outbound"`, `allow_upscale` |
//! | `resize` | `size = [w, h]` (exact, ignores aspect ratio) |
//! | `relative_resize` | exactly one of `heighten`, `widen`, `increase`, `scale` |
//! | `crop` | `start = [x, y]` (default origin), `size = [w, h]` |
//! | `rotate` | `angle` (multiple of 90) |
//! | `flip` | `axis = "x" \| "y"` |
//! | `grayscale` | none |
//! | `upscale` | `min = [w, h]` |
//! | `downscale` | `max = [w, h]` |
//!
//! Dimension math lives in [`calculations`](super::calculations); this
//! module only parses options and calls into the `image` crate.
//!
//! No resize produces an edge longer than [`MAX_EDGE`]; larger or
//! overflowing targets are [`TransformError::Geometry`].

use super::calculations::{
    calculate_center_offset, calculate_downscale, calculate_fill_dimensions, calculate_heighten,
    calculate_increase, calculate_inset_dimensions, calculate_outbound_box, calculate_scale,
    calculate_upscale, calculate_widen,
};
use crate::filter::{StepOptions, Transform, TransformError, TransformRegistry, parse_options};
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};
use serde::Deserialize;

const FILTER: FilterType = FilterType::Lanczos3;

/// Register every built-in transform under its step type name.
pub fn register_builtin_transforms(registry: &mut TransformRegistry<DynamicImage>) {
    registry.register(Thumbnail::STEP, Thumbnail);
    registry.register(Resize::STEP, Resize);
    registry.register(RelativeResize::STEP, RelativeResize);
    registry.register(Crop::STEP, Crop);
    registry.register(Rotate::STEP, Rotate);
    registry.register(Flip::STEP, Flip);
    registry.register(Grayscale::STEP, Grayscale);
    registry.register(Upscale::STEP, Upscale);
    registry.register(Downscale::STEP, Downscale);
}

fn invalid(step: &str, message: impl Into<String>) -> TransformError {
    TransformError::InvalidOptions {
        step: step.to_string(),
        message: message.into(),
    }
}

fn non_zero(step: &str, key: &str, [w, h]: [u32; 2]) -> Result<(u32, u32), TransformError> {
    if w == 0 || h == 0 {
        return Err(invalid(step, format!("{key} must be non-zero, got [{w}, {h}]")));
    }
    Ok((w, h))
}

/// Largest edge any resize may produce.
pub const MAX_EDGE: u32 = 16_384;

fn resize_to(
    step: &str,
    image: DynamicImage,
    (w, h): (u32, u32),
) -> Result<DynamicImage, TransformError> {
    if w > MAX_EDGE || h > MAX_EDGE {
        return Err(TransformError::Geometry(format!(
            "{step}: target {w}x{h} exceeds the {MAX_EDGE}px edge limit"
        )));
    }
    if image.dimensions() == (w, h) {
        Ok(image)
    } else {
        Ok(image.resize_exact(w, h, FILTER))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct NoOptions {}

// =============================================================================
// thumbnail
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThumbnailMode {
    /// Fit inside the box, keeping the whole image.
    #[default]
    Inset,
    /// Cover the box, center-cropping the overflow.
    Outbound,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ThumbnailOptions {
    size: [u32; 2],
    #[serde(default)]
    mode: ThumbnailMode,
    #[serde(default)]
    allow_upscale: bool,
}

pub struct Thumbnail;

impl Thumbnail {
    pub const STEP: &'static str = "thumbnail";
}

impl Transform<DynamicImage> for Thumbnail {
    fn apply(
        &self,
        image: DynamicImage,
        options: &StepOptions,
    ) -> Result<DynamicImage, TransformError> {
        let opts: ThumbnailOptions = parse_options(Self::STEP, options)?;
        let bounds = non_zero(Self::STEP, "size", opts.size)?;
        let source = image.dimensions();

        match opts.mode {
            ThumbnailMode::Inset => resize_to(
                Self::STEP,
                image,
                calculate_inset_dimensions(source, bounds, opts.allow_upscale),
            ),
            ThumbnailMode::Outbound => {
                let target = calculate_outbound_box(source, bounds, opts.allow_upscale);
                let fill = calculate_fill_dimensions(source, target);
                let filled = resize_to(Self::STEP, image, fill)?;
                let (x, y) = calculate_center_offset(fill, target);
                Ok(filled.crop_imm(x, y, target.0, target.1))
            }
        }
    }
}

// =============================================================================
// resize / relative_resize
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResizeOptions {
    size: [u32; 2],
}

pub struct Resize;

impl Resize {
    pub const STEP: &'static str = "resize";
}

impl Transform<DynamicImage> for Resize {
    fn apply(
        &self,
        image: DynamicImage,
        options: &StepOptions,
    ) -> Result<DynamicImage, TransformError> {
        let opts: ResizeOptions = parse_options(Self::STEP, options)?;
        resize_to(Self::STEP, image, non_zero(Self::STEP, "size", opts.size)?)
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RelativeResizeOptions {
    heighten: Option<u32>,
    widen: Option<u32>,
    increase: Option<u32>,
    scale: Option<f64>,
}

pub struct RelativeResize;

impl RelativeResize {
    pub const STEP: &'static str = "relative_resize";
}

impl Transform<DynamicImage> for RelativeResize {
    fn apply(
        &self,
        image: DynamicImage,
        options: &StepOptions,
    ) -> Result<DynamicImage, TransformError> {
        let opts: RelativeResizeOptions = parse_options(Self::STEP, options)?;
        let source = image.dimensions();

        let target = match (opts.heighten, opts.widen, opts.increase, opts.scale) {
            (Some(h), None, None, None) if h > 0 => calculate_heighten(source, h),
            (None, Some(w), None, None) if w > 0 => calculate_widen(source, w),
            (None, None, Some(n), None) => calculate_increase(source, n).ok_or_else(|| {
                TransformError::Geometry(format!(
                    "{}: increasing {}x{} by {n} overflows",
                    Self::STEP,
                    source.0,
                    source.1
                ))
            })?,
            (None, None, None, Some(f)) if f > 0.0 && f.is_finite() => {
                calculate_scale(source, f)
            }
            _ => {
                return Err(invalid(
                    Self::STEP,
                    "expected exactly one positive value of heighten, widen, increase or scale",
                ));
            }
        };
        resize_to(Self::STEP, image, target)
    }
}

// =============================================================================
// crop
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CropOptions {
    #[serde(default)]
    start: [u32; 2],
    size: [u32; 2],
}

pub struct Crop;

impl Crop {
    pub const STEP: &'static str = "crop";
}

impl Transform<DynamicImage> for Crop {
    fn apply(
        &self,
        image: DynamicImage,
        options: &StepOptions,
    ) -> Result<DynamicImage, TransformError> {
        let opts: CropOptions = parse_options(Self::STEP, options)?;
        let (w, h) = non_zero(Self::STEP, "size", opts.size)?;
        let [x, y] = opts.start;
        let (img_w, img_h) = image.dimensions();

        let fits = x.checked_add(w).is_some_and(|r| r <= img_w)
            && y.checked_add(h).is_some_and(|b| b <= img_h);
        if !fits {
            return Err(TransformError::Geometry(format!(
                "crop {w}x{h} at ({x}, {y}) exceeds image {img_w}x{img_h}"
            )));
        }
        Ok(image.crop_imm(x, y, w, h))
    }
}

// =============================================================================
// rotate / flip
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RotateOptions {
    angle: i64,
}

pub struct Rotate;

impl Rotate {
    pub const STEP: &'static str = "rotate";
}

impl Transform<DynamicImage> for Rotate {
    fn apply(
        &self,
        image: DynamicImage,
        options: &StepOptions,
    ) -> Result<DynamicImage, TransformError> {
        let opts: RotateOptions = parse_options(Self::STEP, options)?;
        match opts.angle.rem_euclid(360) {
            0 => Ok(image),
            90 => Ok(image.rotate90()),
            180 => Ok(image.rotate180()),
            270 => Ok(image.rotate270()),
            _ => Err(invalid(
                Self::STEP,
                format!("angle must be a multiple of 90, got {}", opts.angle),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum FlipAxis {
    #[serde(alias = "x", alias = "horizontal")]
    Horizontal,
    #[serde(alias = "y", alias = "vertical")]
    Vertical,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FlipOptions {
    axis: FlipAxis,
}

pub struct Flip;

impl Flip {
    pub const STEP: &'static str = "flip";
}

impl Transform<DynamicImage> for Flip {
    fn apply(
        &self,
        image: DynamicImage,
        options: &StepOptions,
    ) -> Result<DynamicImage, TransformError> {
        let opts: FlipOptions = parse_options(Self::STEP, options)?;
        Ok(match opts.axis {
            FlipAxis::Horizontal => image.fliph(),
            FlipAxis::Vertical => image.flipv(),
        })
    }
}

// =============================================================================
// grayscale
// =============================================================================

pub struct Grayscale;

impl Grayscale {
    pub const STEP: &'static str = "grayscale";
}

impl Transform<DynamicImage> for Grayscale {
    fn apply(
        &self,
        image: DynamicImage,
        options: &StepOptions,
    ) -> Result<DynamicImage, TransformError> {
        parse_options::<NoOptions>(Self::STEP, options)?;
        Ok(image.grayscale())
    }
}

// =============================================================================
// upscale / downscale
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct UpscaleOptions {
    min: [u32; 2],
}

pub struct Upscale;

impl Upscale {
    pub const STEP: &'static str = "upscale";
}

impl Transform<DynamicImage> for Upscale {
    fn apply(
        &self,
        image: DynamicImage,
        options: &StepOptions,
    ) -> Result<DynamicImage, TransformError> {
        let opts: UpscaleOptions = parse_options(Self::STEP, options)?;
        let min = non_zero(Self::STEP, "min", opts.min)?;
        Ok(match calculate_upscale(image.dimensions(), min) {
            Some(target) => resize_to(Self::STEP, image, target)?,
            None => image,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct DownscaleOptions {
    max: [u32; 2],
}

pub struct Downscale;

impl Downscale {
    pub const STEP: &'static str = "downscale";
}

impl Transform<DynamicImage> for Downscale {
    fn apply(
        &self,
        image: DynamicImage,
        options: &StepOptions,
    ) -> Result<DynamicImage, TransformError> {
        let opts: DownscaleOptions = parse_options(Self::STEP, options)?;
        let max = non_zero(Self::STEP, "max", opts.max)?;
        Ok(match calculate_downscale(image.dimensions(), max) {
            Some(target) => resize_to(Self::STEP, image, target)?,
            None => image,
        })
    }
}

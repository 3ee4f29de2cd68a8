//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Scale a dimension by `ratio`, never collapsing to zero.
fn scale(value: u32, ratio: f64) -> u32 {
    ((value as f64 * ratio).round() as u32).max(1)
}

/// Fit `source` inside `bounds`, preserving aspect ratio.
///
/// When `allow_upscale` is false a source already inside the bounds is
/// returned unchanged.
///
/// # Examples
/// ```
/// # use filterchain::imaging::calculations::calculate_inset_dimensions;
/// assert_eq!(calculate_inset_dimensions((800, 600), (180, 180), false), (180, 135));
/// assert_eq!(calculate_inset_dimensions((100, 50), (180, 180), false), (100, 50));
/// ```
pub fn calculate_inset_dimensions(
    source: (u32, u32),
    bounds: (u32, u32),
    allow_upscale: bool,
) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (max_w, max_h) = bounds;

    let ratio = (max_w as f64 / src_w as f64).min(max_h as f64 / src_h as f64);
    if ratio >= 1.0 && !allow_upscale {
        return source;
    }
    (scale(src_w, ratio), scale(src_h, ratio))
}

/// Calculate dimensions needed to fill a target area (resize before crop).
///
/// Returns dimensions that completely cover the target area while maintaining
/// the source aspect ratio. One dimension will match exactly, the other may exceed.
pub fn calculate_fill_dimensions(source: (u32, u32), target: (u32, u32)) -> (u32, u32) {
    let (src_w, src_h) = source;
    let (tgt_w, tgt_h) = target;

    let src_aspect = src_w as f64 / src_h as f64;
    let tgt_aspect = tgt_w as f64 / tgt_h as f64;

    if src_aspect > tgt_aspect {
        // Source is wider: height will match, width will exceed
        let h = tgt_h;
        let w = ((h as f64 * src_aspect).round() as u32).max(tgt_w);
        (w, h)
    } else {
        // Source is taller: width will match, height will exceed
        let w = tgt_w;
        let h = ((w as f64 / src_aspect).round() as u32).max(tgt_h);
        (w, h)
    }
}

/// Target box for an outbound thumbnail.
///
/// Without upscaling, a source smaller than the box shrinks the box so the
/// crop never exceeds the source.
pub fn calculate_outbound_box(
    source: (u32, u32),
    bounds: (u32, u32),
    allow_upscale: bool,
) -> (u32, u32) {
    if allow_upscale {
        bounds
    } else {
        (bounds.0.min(source.0), bounds.1.min(source.1))
    }
}

/// Top-left corner of a `crop` centered inside `outer`.
pub fn calculate_center_offset(outer: (u32, u32), crop: (u32, u32)) -> (u32, u32) {
    (
        outer.0.saturating_sub(crop.0) / 2,
        outer.1.saturating_sub(crop.1) / 2,
    )
}

/// Scale so the height becomes `height`.
pub fn calculate_heighten(source: (u32, u32), height: u32) -> (u32, u32) {
    (scale(source.0, height as f64 / source.1 as f64), height)
}

/// Scale so the width becomes `width`.
pub fn calculate_widen(source: (u32, u32), width: u32) -> (u32, u32) {
    (width, scale(source.1, width as f64 / source.0 as f64))
}

/// Grow both edges by `amount` pixels; `None` if an edge overflows `u32`.
pub fn calculate_increase(source: (u32, u32), amount: u32) -> Option<(u32, u32)> {
    Some((source.0.checked_add(amount)?, source.1.checked_add(amount)?))
}

/// Multiply both edges by `factor`.
pub fn calculate_scale(source: (u32, u32), factor: f64) -> (u32, u32) {
    (scale(source.0, factor), scale(source.1, factor))
}

/// Grow `source` until both edges reach `min`; `None` if already large enough.
pub fn calculate_upscale(source: (u32, u32), min: (u32, u32)) -> Option<(u32, u32)> {
    let ratio = (min.0 as f64 / source.0 as f64).max(min.1 as f64 / source.1 as f64);
    (ratio > 1.0).then(|| calculate_scale(source, ratio))
}

/// Shrink `source` until both edges fit `max`; `None` if already small enough.
pub fn calculate_downscale(source: (u32, u32), max: (u32, u32)) -> Option<(u32, u32)> {
    let ratio = (max.0 as f64 / source.0 as f64).min(max.1 as f64 / source.1 as f64);
    (ratio < 1.0).then(|| calculate_scale(source, ratio))
}

//! Scalar → RGBA mapping: contrast curve, optional normalisation, and a
//! black → red → orange → yellow → white heat gradient.

/// Value used for every cell when normalising a field with zero range.
pub const FLAT_FIELD_LEVEL: f32 = 0.5;

/// Stretch a value's distance from 0.5 by `exp(contrast)`.
#[inline]
pub fn apply_contrast(v: f32, contrast: f32) -> f32 {
    (v - 0.5) * contrast.exp() + 0.5
}

/// Contrast-adjust a whole field into display levels in [0, 1].
///
/// With `normalize` the adjusted field is rescaled so its minimum becomes 0
/// and its maximum 1; otherwise it is clamped.
pub fn tone_map(field: &[f32], contrast: f32, normalize: bool) -> Vec<f32> {
    let mut levels: Vec<f32> = field.iter().map(|&v| apply_contrast(v, contrast)).collect();

    if normalize {
        let (lo, hi) = levels
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
        let range = hi - lo;
        if range > 0.0 && range.is_finite() {
            let inv = 1.0 / range;
            for v in &mut levels {
                *v = ((*v - lo) * inv).clamp(0.0, 1.0);
            }
        } else {
            levels.fill(FLAT_FIELD_LEVEL);
        }
    } else {
        for v in &mut levels {
            *v = v.clamp(0.0, 1.0);
        }
    }
    levels
}

/// Four-segment heat gradient. Alpha is always opaque.
pub fn map_color(value: f32) -> [u8; 4] {
    let v = value.clamp(0.0, 1.0);
    let (r, g, b) = if v < 0.25 {
        (v / 0.25 * 255.0, 0.0, 0.0)
    } else if v < 0.5 {
        (255.0, (v - 0.25) / 0.25 * 165.0, 0.0)
    } else if v < 0.75 {
        (255.0, 165.0 + (v - 0.5) / 0.25 * 90.0, 0.0)
    } else {
        (255.0, 255.0, (v - 0.75) / 0.25 * 255.0)
    };
    [channel(r), channel(g), channel(b), 255]
}

fn channel(x: f32) -> u8 {
    x.round().clamp(0.0, 255.0) as u8
}

/// RGBA bytes for a scalar field, row-major, 4 bytes per cell.
pub fn color_buffer(field: &[f32], contrast: f32, normalize: bool) -> Vec<u8> {
    let levels = tone_map(field, contrast, normalize);
    let mut out = Vec::with_capacity(levels.len() * 4);
    for v in levels {
        out.extend_from_slice(&map_color(v));
    }
    out
}

/// Blend every cell with its 8 toroidal neighbours.
///
/// `out[i] = src[i] * (1 - s) + neighbours(i) * (s / 8)`. Reads only `src`,
/// so `out` must be a separate buffer.
pub fn smooth_toroidal(src: &[f32], out: &mut [f32], w: usize, h: usize, s: f32) {
    assert_eq!(src.len(), w * h, "source buffer does not match grid");
    assert_eq!(out.len(), w * h, "output buffer does not match grid");

    if s == 0.0 {
        out.copy_from_slice(src);
        return;
    }

    let keep = 1.0 - s;
    let share = s / 8.0;

    for y in 0..h {
        let ym = wrap(y as isize - 1, h);
        let yp = wrap(y as isize + 1, h);
        for x in 0..w {
            let xm = wrap(x as isize - 1, w);
            let xp = wrap(x as isize + 1, w);

            let ring = src[ym * w + xm]
                + src[ym * w + x]
                + src[ym * w + xp]
                + src[y * w + xm]
                + src[y * w + xp]
                + src[yp * w + xm]
                + src[yp * w + x]
                + src[yp * w + xp];

            let i = y * w + x;
            out[i] = src[i] * keep + ring * share;
        }
    }
}

/// Wrap one axis coordinate into `0..dim`.
#[inline]
pub(crate) fn wrap(c: isize, dim: usize) -> usize {
    c.rem_euclid(dim as isize) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_smoothing_is_identity() {
        let src: Vec<f32> = (0..35).map(|i| (i as f32 * 0.37).fract()).collect();
        let mut out = vec![0.0; src.len()];
        smooth_toroidal(&src, &mut out, 7, 5, 0.0);
        assert_eq!(out, src);
    }

    #[test]
    fn corner_reads_opposite_corner() {
        let (w, h) = (5, 4);
        let mut src = vec![0.0; w * h];
        src[(h - 1) * w + (w - 1)] = 8.0;
        let mut out = vec![0.0; w * h];
        smooth_toroidal(&src, &mut out, w, h, 0.5);
        // (0,0) has the marker as its up-left neighbour: 8 * 0.5 / 8.
        assert!((out[0] - 0.5).abs() < 1e-6);
        // The marker cell keeps half its own value.
        assert!((out[(h - 1) * w + (w - 1)] - 4.0).abs() < 1e-6);
    }

    #[test]
    fn constant_field_is_fixed_point() {
        let src = vec![0.3; 12];
        let mut out = vec![0.0; 12];
        smooth_toroidal(&src, &mut out, 4, 3, 0.9);
        assert!(out.iter().all(|v| (v - 0.3).abs() < 1e-6));
    }

    #[test]
    fn wrap_handles_both_edges() {
        assert_eq!(wrap(-1, 6), 5);
        assert_eq!(wrap(6, 6), 0);
        assert_eq!(wrap(3, 6), 3);
    }

    #[test]
    fn mass_is_conserved() {
        let src: Vec<f32> = (0..64).map(|i| ((i * 13) % 7) as f32).collect();
        let mut out = vec![0.0; 64];
        smooth_toroidal(&src, &mut out, 8, 8, 0.6);
        let a: f32 = src.iter().sum();
        let b: f32 = out.iter().sum();
        assert!((a - b).abs() < 1e-3);
    }
}

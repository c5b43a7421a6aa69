use rand::Rng;

/// Fill `out` with the mean of `draws` uniform samples per cell.
///
/// More draws pull the distribution toward 0.5 (sum-of-uniforms bell curve);
/// one draw is plain uniform noise. Every value stays in [0, 1).
pub fn fill_uniform_mean<R: Rng + ?Sized>(out: &mut [f32], draws: usize, rng: &mut R) {
    assert!(draws >= 1, "at least one draw per cell");
    let inv = 1.0 / draws as f32;
    for v in out.iter_mut() {
        let mut sum = 0.0f32;
        for _ in 0..draws {
            sum += rng.gen::<f32>();
        }
        // f32 rounding of sum * inv can land exactly on 1.0 for sums just under `draws`.
        *v = (sum * inv).min(1.0 - f32::EPSILON);
    }
}

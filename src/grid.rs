use rand::{rngs::StdRng, SeedableRng};
use tracing::{debug, trace};

use crate::blend::{blend_frame, HistoryRing};
use crate::color;
use crate::config::FieldConfig;
use crate::error::FieldError;
use crate::noise::fill_uniform_mean;
use crate::smooth::smooth_toroidal;
use crate::trend::{TrendTracker, HISTORY_CAP};

/// Cell count for a grid, or `TooLarge` when any buffer size overflows.
fn checked_cells(width: usize, height: usize, frame_history: usize) -> Result<usize, FieldError> {
    let too_large = FieldError::TooLarge {
        width,
        height,
        frame_history,
    };
    let n = width.checked_mul(height).ok_or_else(|| too_large.clone())?;
    n.checked_mul(HISTORY_CAP)
        .and_then(|_| n.checked_mul(frame_history))
        .ok_or(too_large)?;
    Ok(n)
}

/// Summary of the current frame, for HUDs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldStats {
    pub min: f32,
    pub max: f32,
    pub mean: f32,
}

/// The heat field: current frame, history ring and per-cell trends.
pub struct Grid {
    w: usize,
    h: usize,
    rng: StdRng,
    current: Vec<f32>,
    // Scratch buffers reused every frame.
    noise: Vec<f32>,
    spatial: Vec<f32>,
    predicted: Vec<f32>,
    ring: HistoryRing,
    trend: TrendTracker,
    frames: u64,
}

impl Grid {
    /// New zeroed grid seeded from OS entropy.
    pub fn new(width: usize, height: usize, frame_history: usize) -> Result<Self, FieldError> {
        Self::with_rng(width, height, frame_history, StdRng::from_entropy())
    }

    /// Like [`Grid::new`] but reproducible.
    pub fn with_seed(
        width: usize,
        height: usize,
        frame_history: usize,
        seed: u64,
    ) -> Result<Self, FieldError> {
        Self::with_rng(width, height, frame_history, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        width: usize,
        height: usize,
        frame_history: usize,
        rng: StdRng,
    ) -> Result<Self, FieldError> {
        if width == 0 || height == 0 {
            return Err(FieldError::ZeroDimension { width, height });
        }
        if frame_history == 0 {
            return Err(FieldError::ZeroFrameHistory);
        }
        let n = checked_cells(width, height, frame_history)?;
        debug!(width, height, frame_history, "allocating heat grid");
        Ok(Self {
            w: width,
            h: height,
            rng,
            current: vec![0.0; n],
            noise: vec![0.0; n],
            spatial: vec![0.0; n],
            predicted: vec![0.0; n],
            ring: HistoryRing::new(n, frame_history),
            trend: TrendTracker::new(n),
            frames: 0,
        })
    }

    /// Advance one frame and return it.
    pub fn update(&mut self, cfg: &FieldConfig) -> Result<&[f32], FieldError> {
        cfg.validate()?;

        if cfg.frame_history != self.ring.frames() {
            checked_cells(self.w, self.h, cfg.frame_history)?;
            debug!(
                from = self.ring.frames(),
                to = cfg.frame_history,
                "reallocating history ring"
            );
            self.ring.reset(cfg.frame_history);
        }

        fill_uniform_mean(&mut self.noise, cfg.random_values, &mut self.rng);
        smooth_toroidal(
            &self.noise,
            &mut self.spatial,
            self.w,
            self.h,
            cfg.spatial_smoothing,
        );

        // History takes this frame's sample before it is read back.
        self.trend.push_frame(&self.spatial);
        for (i, p) in self.predicted.iter_mut().enumerate() {
            *p = self.trend.predict(i);
        }

        blend_frame(
            &self.spatial,
            &self.predicted,
            &self.ring,
            cfg.regression_weight,
            cfg.temporal_smoothing,
            &mut self.current,
        );
        self.ring.push(&self.current);
        self.frames += 1;

        if tracing::enabled!(tracing::Level::TRACE) {
            let s = self.stats();
            trace!(frame = self.frames, min = s.min, max = s.max, mean = s.mean, "frame");
        }
        Ok(&self.current)
    }

    /// RGBA bytes for the last frame.
    pub fn color_buffer(&self, contrast: f32, normalize: bool) -> Vec<u8> {
        color::color_buffer(&self.current, contrast, normalize)
    }

    /// Zero the ring (resized to `frame_history`) and drop every cell's history.
    /// The current frame is left alone.
    pub fn reset(&mut self, frame_history: usize) -> Result<(), FieldError> {
        if frame_history == 0 {
            return Err(FieldError::ZeroFrameHistory);
        }
        checked_cells(self.w, self.h, frame_history)?;
        debug!(frame_history, "resetting heat grid history");
        self.ring.reset(frame_history);
        self.trend.clear();
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.w * self.h
    }

    pub fn dimensions(&self) -> (usize, usize) {
        (self.w, self.h)
    }

    pub fn current(&self) -> &[f32] {
        &self.current
    }

    pub fn history_index(&self) -> usize {
        self.ring.index()
    }

    pub fn frame_history(&self) -> usize {
        self.ring.frames()
    }

    /// One slot of the history ring.
    pub fn history_frame(&self, slot: usize) -> &[f32] {
        self.ring.slot(slot)
    }

    /// Smoothed samples recorded for `cell`, oldest first.
    pub fn cell_history(&self, cell: usize) -> impl Iterator<Item = f32> + '_ {
        self.trend.history(cell)
    }

    /// Trend extrapolation for `cell` from its recorded history.
    pub fn predict(&self, cell: usize) -> f32 {
        self.trend.predict(cell)
    }

    /// Frames advanced since construction.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn stats(&self) -> FieldStats {
        let mut min = f32::INFINITY;
        let mut max = f32::NEG_INFINITY;
        let mut sum = 0.0f64;
        for &v in &self.current {
            min = min.min(v);
            max = max.max(v);
            sum += v as f64;
        }
        FieldStats {
            min,
            max,
            mean: (sum / self.current.len() as f64) as f32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_bad_construction() {
        assert!(matches!(
            Grid::new(0, 4, 2),
            Err(FieldError::ZeroDimension { width: 0, height: 4 })
        ));
        assert!(matches!(Grid::new(4, 4, 0), Err(FieldError::ZeroFrameHistory)));
    }

    #[test]
    fn oversized_grids_are_rejected() {
        assert_eq!(
            Grid::new(usize::MAX / 2 + 1, 2, 1).err(),
            Some(FieldError::TooLarge {
                width: usize::MAX / 2 + 1,
                height: 2,
                frame_history: 1,
            })
        );
        // Fits as a cell count but not as a 100-sample trend arena.
        let w = usize::MAX / HISTORY_CAP + 1;
        assert!(matches!(Grid::new(w, 1, 1), Err(FieldError::TooLarge { .. })));
    }

    #[test]
    fn oversized_history_is_rejected_before_mutation() {
        let mut g = Grid::with_seed(4, 4, 2, 6).unwrap();
        assert!(matches!(g.reset(usize::MAX), Err(FieldError::TooLarge { .. })));
        let cfg = FieldConfig::default().with_frame_history(usize::MAX);
        assert!(matches!(g.update(&cfg), Err(FieldError::TooLarge { .. })));
        assert_eq!(g.frame_history(), 2);
        assert_eq!(g.frames(), 0);
    }

    #[test]
    fn fresh_grid_is_zeroed() {
        let g = Grid::with_seed(6, 3, 4, 1).unwrap();
        assert_eq!(g.size(), 18);
        assert_eq!(g.dimensions(), (6, 3));
        assert!(g.current().iter().all(|&v| v == 0.0));
        assert_eq!(g.history_index(), 0);
        assert_eq!(g.predict(0), 0.0);
    }

    #[test]
    fn update_rejects_invalid_config_without_advancing() {
        let mut g = Grid::with_seed(4, 4, 2, 3).unwrap();
        let cfg = FieldConfig::default().with_random_values(0);
        assert_eq!(g.update(&cfg).unwrap_err(), FieldError::ZeroRandomValues);
        assert_eq!(g.frames(), 0);
        assert_eq!(g.history_index(), 0);
    }

    #[test]
    fn history_tracks_spatial_values() {
        // With no temporal or trend mixing the frame is the smoothed noise itself.
        let cfg = FieldConfig::default()
            .with_temporal_smoothing(0.0)
            .with_regression_weight(0.0)
            .with_frame_history(2);
        let mut g = Grid::with_seed(5, 5, 2, 11).unwrap();
        for _ in 0..3 {
            g.update(&cfg).unwrap();
        }
        let last: Vec<f32> = g.cell_history(7).collect();
        assert_eq!(last.len(), 3);
        assert_eq!(last[2], g.current()[7]);
    }

    #[test]
    fn cell_history_keeps_last_hundred() {
        let cfg = FieldConfig::default().with_temporal_smoothing(0.0).with_regression_weight(0.0);
        let mut g = Grid::with_seed(3, 2, cfg.frame_history, 5).unwrap();
        let mut pushed = Vec::new();
        for _ in 0..160 {
            let frame = g.update(&cfg).unwrap();
            pushed.push(frame[4]);
        }
        let kept: Vec<f32> = g.cell_history(4).collect();
        assert_eq!(kept.len(), HISTORY_CAP);
        assert_eq!(kept, pushed[60..]);
    }

    #[test]
    fn ring_cursor_wraps() {
        let cfg = FieldConfig::default().with_frame_history(5);
        let mut g = Grid::with_seed(4, 3, 5, 9).unwrap();
        for k in 0..5 {
            assert_eq!(g.history_index(), k);
            g.update(&cfg).unwrap();
        }
        assert_eq!(g.history_index(), 0);

        // Slot 0 is rewritten on the first frame of every cycle and then left alone.
        g.update(&cfg).unwrap();
        assert_eq!(g.history_index(), 1);
        let snapshot = g.current().to_vec();
        assert_eq!(g.history_frame(0), snapshot.as_slice());
        for _ in 0..4 {
            g.update(&cfg).unwrap();
            assert_eq!(g.history_frame(0), snapshot.as_slice());
        }
        assert_eq!(g.history_index(), 0);
    }

    #[test]
    fn changing_frame_history_reallocates_ring() {
        let mut g = Grid::with_seed(4, 4, 3, 2).unwrap();
        let cfg = FieldConfig::default().with_frame_history(3);
        g.update(&cfg).unwrap();
        g.update(&cfg).unwrap();

        let cfg = cfg.with_frame_history(7);
        g.update(&cfg).unwrap();
        assert_eq!(g.frame_history(), 7);
        assert_eq!(g.history_index(), 1);
        // The per-cell trend survives a ring resize.
        assert_eq!(g.cell_history(0).count(), 3);
    }

    #[test]
    fn reset_clears_history_but_keeps_frame() {
        let cfg = FieldConfig::default();
        let mut g = Grid::with_seed(5, 4, cfg.frame_history, 21).unwrap();
        for _ in 0..12 {
            g.update(&cfg).unwrap();
        }
        let before = g.current().to_vec();

        g.reset(3).unwrap();
        assert_eq!(g.current(), before.as_slice());
        assert_eq!(g.frame_history(), 3);
        assert_eq!(g.history_index(), 0);
        for f in 0..3 {
            assert!(g.history_frame(f).iter().all(|&v| v == 0.0));
        }
        for i in 0..g.size() {
            assert_eq!(g.cell_history(i).count(), 0);
            assert_eq!(g.predict(i), 0.0);
        }
        assert_eq!(g.reset(0), Err(FieldError::ZeroFrameHistory));
    }

    #[test]
    fn same_seed_same_frames() {
        let cfg = FieldConfig::default();
        let mut a = Grid::with_seed(8, 6, 8, 77).unwrap();
        let mut b = Grid::with_seed(8, 6, 8, 77).unwrap();
        for _ in 0..10 {
            a.update(&cfg).unwrap();
            b.update(&cfg).unwrap();
        }
        assert_eq!(a.current(), b.current());
    }

    #[test]
    fn stats_and_colors_follow_current() {
        let mut g = Grid::with_seed(10, 10, 4, 4).unwrap();
        g.update(&FieldConfig::default().with_frame_history(4)).unwrap();
        let s = g.stats();
        assert!(s.min <= s.mean && s.mean <= s.max);

        let rgba = g.color_buffer(0.0, true);
        assert_eq!(rgba.len(), g.size() * 4);
        assert!(rgba.chunks_exact(4).all(|px| px[3] == 255));
    }
}

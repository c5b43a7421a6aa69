use crate::error::FieldError;

/// Per-frame knobs consumed by [`Grid::update`](crate::Grid::update).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldConfig {
    /// Uniform draws averaged per cell. 1 = raw uniform noise.
    pub random_values: usize,
    /// Weight given to the 8 toroidal neighbours, in [0, 1).
    pub spatial_smoothing: f32,
    /// Weight given to the history ring, in [0, 1).
    pub temporal_smoothing: f32,
    /// Ring length. Changing it between frames reallocates the ring.
    pub frame_history: usize,
    /// Weight given to the per-cell trend prediction, in [0, 1].
    pub regression_weight: f32,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            random_values: 3,
            spatial_smoothing: 0.5,
            temporal_smoothing: 0.5,
            frame_history: 8,
            regression_weight: 0.3,
        }
    }
}

impl FieldConfig {
    pub fn with_random_values(mut self, n: usize) -> Self {
        self.random_values = n;
        self
    }

    pub fn with_spatial_smoothing(mut self, s: f32) -> Self {
        self.spatial_smoothing = s;
        self
    }

    pub fn with_temporal_smoothing(mut self, t: f32) -> Self {
        self.temporal_smoothing = t;
        self
    }

    pub fn with_frame_history(mut self, frames: usize) -> Self {
        self.frame_history = frames;
        self
    }

    pub fn with_regression_weight(mut self, r: f32) -> Self {
        self.regression_weight = r;
        self
    }

    pub fn validate(&self) -> Result<(), FieldError> {
        if self.random_values == 0 {
            return Err(FieldError::ZeroRandomValues);
        }
        if self.frame_history == 0 {
            return Err(FieldError::ZeroFrameHistory);
        }
        half_open("spatial_smoothing", self.spatial_smoothing)?;
        half_open("temporal_smoothing", self.temporal_smoothing)?;
        if !(0.0..=1.0).contains(&self.regression_weight) {
            return Err(FieldError::OutOfRange {
                name: "regression_weight",
                value: self.regression_weight,
                range: "[0, 1]",
            });
        }
        Ok(())
    }
}

// NaN fails `contains`, so it is rejected along with out-of-range values.
fn half_open(name: &'static str, value: f32) -> Result<(), FieldError> {
    if (0.0..1.0).contains(&value) {
        Ok(())
    } else {
        Err(FieldError::OutOfRange {
            name,
            value,
            range: "[0, 1)",
        })
    }
}

use thiserror::Error;

/// Errors raised when a grid or a frame configuration is unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("grid dimensions must be non-zero (got {width}x{height})")]
    ZeroDimension { width: usize, height: usize },
    /// Cell count, trend arena or history ring would not fit in `usize`.
    #[error("grid {width}x{height} with {frame_history} history frames is too large")]
    TooLarge {
        width: usize,
        height: usize,
        frame_history: usize,
    },
    #[error("frame_history must be at least 1")]
    ZeroFrameHistory,
    #[error("random_values must be at least 1")]
    ZeroRandomValues,
    /// A real-valued knob fell outside its accepted interval (or was NaN).
    #[error("{name} = {value} is outside {range}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        range: &'static str,
    },
}

/// Round-robin store of the last `frames` blended grids, one flat buffer.
#[derive(Clone, Debug)]
pub struct HistoryRing {
    cells: usize,
    frames: usize,
    data: Vec<f32>,
    index: usize,
}

impl HistoryRing {
    pub fn new(cells: usize, frames: usize) -> Self {
        assert!(frames >= 1, "history ring needs at least one frame");
        Self {
            cells,
            frames,
            data: vec![0.0; cells * frames],
            index: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Slot the next `push` will overwrite.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn slot(&self, f: usize) -> &[f32] {
        &self.data[f * self.cells..(f + 1) * self.cells]
    }

    /// Sum of one cell over every slot, stale ones included.
    pub fn cell_sum(&self, cell: usize) -> f32 {
        (0..self.frames).map(|f| self.data[f * self.cells + cell]).sum()
    }

    pub fn push(&mut self, frame: &[f32]) {
        assert_eq!(frame.len(), self.cells, "frame does not match ring");
        let start = self.index * self.cells;
        self.data[start..start + self.cells].copy_from_slice(frame);
        self.index = (self.index + 1) % self.frames;
    }

    /// Zero every slot, resizing to `frames`, and rewind the cursor.
    pub fn reset(&mut self, frames: usize) {
        assert!(frames >= 1, "history ring needs at least one frame");
        self.frames = frames;
        self.data.clear();
        self.data.resize(self.cells * frames, 0.0);
        self.index = 0;
    }
}

/// Mix the smoothed field, its trend prediction and the history ring.
///
/// `out[i] = (spatial*(1-r) + predicted*r) * (1-t) + Σ ring[f][i] * t/F`.
/// The ring is not advanced here.
pub fn blend_frame(
    spatial: &[f32],
    predicted: &[f32],
    ring: &HistoryRing,
    regression_weight: f32,
    temporal_smoothing: f32,
    out: &mut [f32],
) {
    assert_eq!(spatial.len(), out.len(), "spatial buffer does not match output");
    assert_eq!(predicted.len(), out.len(), "prediction buffer does not match output");
    assert_eq!(ring.cells, out.len(), "ring does not match output");

    let r = regression_weight;
    let t = temporal_smoothing;
    let per_frame = t / ring.frames as f32;

    for (i, o) in out.iter_mut().enumerate() {
        let current = spatial[i] * (1.0 - r) + predicted[i] * r;
        *o = current * (1.0 - t) + ring.cell_sum(i) * per_frame;
    }
}

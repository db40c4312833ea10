//! Coarse floor-height grid over a container footprint.
//!
//! Each cell stores the highest occupied Z inside it. Queries and updates cover
//! every cell a footprint rectangle touches, so partially covered cells count
//! as fully occupied and boxes can never intersect.

/// Per-run height map; created empty for every container and discarded after.
#[derive(Clone, Debug)]
pub struct HeightMap {
    resolution: f64,
    cells_l: usize,
    cells_w: usize,
    heights: Vec<f64>,
}

impl HeightMap {
    /// Creates a flat map over a `length × width` footprint.
    ///
    /// `resolution` is the cell edge in container units and must be positive.
    pub fn new(length: f64, width: f64, resolution: f64) -> Self {
        let cells_l = cell_count(length, resolution);
        let cells_w = cell_count(width, resolution);
        Self {
            resolution,
            cells_l,
            cells_w,
            heights: vec![0.0; cells_l * cells_w],
        }
    }

    pub fn cells_l(&self) -> usize {
        self.cells_l
    }

    pub fn cells_w(&self) -> usize {
        self.cells_w
    }

    pub fn resolution(&self) -> f64 {
        self.resolution
    }

    /// Origins of all cells, length-major.
    pub fn cell_origins(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        (0..self.cells_l).flat_map(move |i| {
            (0..self.cells_w).map(move |j| (i as f64 * self.resolution, j as f64 * self.resolution))
        })
    }

    /// Highest occupied Z under the footprint `[pos_l, pos_l+len) × [pos_w, pos_w+wid)`.
    pub fn floor_height(&self, pos_l: f64, pos_w: f64, len: f64, wid: f64) -> f64 {
        let (li, lj, ui, uj) = self.cell_span(pos_l, pos_w, len, wid);
        let mut max_h = 0.0_f64;
        for i in li..ui {
            let row = &self.heights[i * self.cells_w..(i + 1) * self.cells_w];
            for &h in &row[lj..uj] {
                if h > max_h {
                    max_h = h;
                }
            }
        }
        max_h
    }

    /// Sets every cell under the footprint to `height`.
    ///
    /// Callers pass `floor_height(..) + box height`, so cells only ever rise.
    pub fn raise(&mut self, pos_l: f64, pos_w: f64, len: f64, wid: f64, height: f64) {
        let (li, lj, ui, uj) = self.cell_span(pos_l, pos_w, len, wid);
        for i in li..ui {
            let row = &mut self.heights[i * self.cells_w..(i + 1) * self.cells_w];
            for h in &mut row[lj..uj] {
                *h = height;
            }
        }
    }

    fn cell_span(&self, pos_l: f64, pos_w: f64, len: f64, wid: f64) -> (usize, usize, usize, usize) {
        let start_i = ((pos_l / self.resolution).floor().max(0.0) as usize).min(self.cells_l);
        let start_j = ((pos_w / self.resolution).floor().max(0.0) as usize).min(self.cells_w);
        let end_i = (((pos_l + len) / self.resolution).ceil().max(0.0) as usize).min(self.cells_l);
        let end_j = (((pos_w + wid) / self.resolution).ceil().max(0.0) as usize).min(self.cells_w);
        (start_i, start_j, end_i.max(start_i), end_j.max(start_j))
    }
}

fn cell_count(extent: f64, resolution: f64) -> usize {
    if extent <= 0.0 || resolution <= 0.0 || !extent.is_finite() {
        return 0;
    }
    (extent / resolution).ceil() as usize
}

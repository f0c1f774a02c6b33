use crate::common::*;

/// The spatial resolution of a dense map in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    pub h: usize,
    pub w: usize,
}

impl GridSize {
    pub fn try_new(h: usize, w: usize) -> Result<Self> {
        ensure!(h > 0 && w > 0, "grid size must be positive, but get {}x{}", h, w);
        Ok(Self { h, w })
    }

    pub fn new(h: usize, w: usize) -> Self {
        Self::try_new(h, w).unwrap()
    }

    pub fn num_cells(&self) -> usize {
        self.h * self.w
    }

    /// Find the `(row, col)` cell containing a normalized point.
    ///
    /// Returns `None` if the point falls outside the grid.
    pub fn cell_of(&self, x: f64, y: f64) -> Option<(usize, usize)> {
        let col = (x * self.w as f64).floor();
        let row = (y * self.h as f64).floor();
        let within = |value: f64, len: usize| value >= 0.0 && value < len as f64;
        (within(row, self.h) && within(col, self.w)).then(|| (row as usize, col as usize))
    }

    /// The normalized center of cell `(row, col)`.
    pub fn anchor_at(&self, row: usize, col: usize) -> AnchorPoint {
        AnchorPoint {
            x: (col as f64 + 0.5) / self.w as f64,
            y: (row as f64 + 0.5) / self.h as f64,
        }
    }
}

/// The normalized center of a grid cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorPoint {
    pub x: f64,
    pub y: f64,
}

/// The lookup table of cell centers for one resolution, in row-major order.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct AnchorGrid {
    #[get = "pub"]
    size: GridSize,
    #[get = "pub"]
    points: Vec<AnchorPoint>,
}

impl AnchorGrid {
    /// Generate the `h * w` anchor points. Cell `(row, col)` is centered at
    /// `((col + 0.5) / w, (row + 0.5) / h)`.
    pub fn generate(size: GridSize) -> Self {
        let GridSize { h, w } = size;
        let points = iproduct!(0..h, 0..w)
            .map(|(row, col)| size.anchor_at(row, col))
            .collect();
        Self { size, points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> Option<&AnchorPoint> {
        if row >= self.size.h || col >= self.size.w {
            return None;
        }
        self.points.get(row * self.size.w + col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn anchor_grid_is_row_major() {
        let grid = AnchorGrid::generate(GridSize::new(2, 4));
        assert_eq!(grid.len(), 8);

        let second = grid.points()[1];
        assert_abs_diff_eq!(second.x, 0.375);
        assert_abs_diff_eq!(second.y, 0.25);

        let last = grid.get(1, 3).unwrap();
        assert_abs_diff_eq!(last.x, 0.875);
        assert_abs_diff_eq!(last.y, 0.75);
        assert!(grid.get(2, 0).is_none());
    }

    #[test]
    fn cell_lookup_matches_anchor() {
        let size = GridSize::new(1000, 1000);
        assert_eq!(size.cell_of(0.201, 0.402), Some((402, 201)));
        assert_eq!(size.cell_of(1.0, 0.5), None);
        assert_eq!(size.cell_of(-0.001, 0.5), None);

        let grid = AnchorGrid::generate(GridSize::new(3, 5));
        grid.points().iter().enumerate().for_each(|(index, point)| {
            let cell = grid.size().cell_of(point.x, point.y).unwrap();
            assert_eq!(cell, (index / 5, index % 5));
        });
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        assert!(GridSize::try_new(0, 3).is_err());
    }
}

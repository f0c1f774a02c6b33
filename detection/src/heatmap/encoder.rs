use super::{Heatmap, RegressionKind, RegressionMap};
use crate::{anchor::GridSize, common::*};

/// The spread of the Gaussian splatted at each box center.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GaussianMode {
    /// Isotropic, with the standard deviation being `sigma` cells.
    Fixed,
    /// Follows the box shape, with the standard deviation being
    /// `sigma * box_size_in_cells / 6` per axis.
    Aspect,
}

impl Default for GaussianMode {
    fn default() -> Self {
        Self::Fixed
    }
}

#[derive(Debug, Clone)]
pub struct HeatmapEncoderInit {
    pub num_classes: usize,
    pub sigma: f64,
    pub mode: GaussianMode,
    pub regression_kind: RegressionKind,
}

impl HeatmapEncoderInit {
    pub fn new(num_classes: usize) -> Self {
        Self {
            num_classes,
            sigma: 2.0,
            mode: GaussianMode::default(),
            regression_kind: RegressionKind::default(),
        }
    }

    pub fn build(self) -> Result<HeatmapEncoder> {
        let Self {
            num_classes,
            sigma,
            mode,
            regression_kind,
        } = self;

        ensure!(num_classes > 0, "num_classes must be positive");
        ensure!(
            sigma.is_finite() && sigma > 0.0,
            "sigma must be positive, but get {}",
            sigma
        );

        Ok(HeatmapEncoder {
            num_classes,
            sigma,
            mode,
            regression_kind,
        })
    }
}

/// The dense training target of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapTarget {
    pub heatmap: Heatmap,
    pub regression: RegressionMap,
}

#[derive(Debug, Clone)]
pub struct HeatmapEncoder {
    num_classes: usize,
    sigma: f64,
    mode: GaussianMode,
    regression_kind: RegressionKind,
}

impl HeatmapEncoder {
    const MIN_SIGMA: f64 = 0.5;

    pub fn num_classes(&self) -> usize {
        self.num_classes
    }

    pub fn regression_kind(&self) -> RegressionKind {
        self.regression_kind
    }

    /// Encode the ground truth boxes of one image into dense maps.
    ///
    /// Overlapping Gaussians are merged by maximum. When two boxes fall on
    /// the same center cell, the later box owns the regression values.
    /// Boxes centered outside the grid are skipped.
    pub fn encode(
        &self,
        target: &LabeledBoxSet<Yolo<f64>>,
        grid: GridSize,
    ) -> Result<HeatmapTarget> {
        target.ensure_classes_below(self.num_classes)?;

        let mut heatmap = Heatmap::zeros(self.num_classes, grid);
        let mut regression = RegressionMap::zeros(self.regression_kind, grid);

        for Label { rect, class } in target.iter() {
            let [cx, cy, w, h] = rect.cxcywh();
            if w <= 0.0 || h <= 0.0 {
                warn!("zero-size ground truth box {:?} of class {}", rect, class);
            }

            let (row, col) = match grid.cell_of(cx, cy) {
                Some(cell) => cell,
                None => {
                    debug!("drop box {:?}, its center is out of the grid", rect);
                    continue;
                }
            };

            let (sigma_x, sigma_y) = self.sigmas(w, h, grid);
            splat_gaussian(heatmap.array_mut(), class, row, col, sigma_x, sigma_y);

            let values = match self.regression_kind {
                RegressionKind::Size => vec![w, h],
                RegressionKind::OffsetSize => {
                    let anchor = grid.anchor_at(row, col);
                    vec![cx - anchor.x, cy - anchor.y, w, h]
                }
            };
            regression.set_values_at(row, col, &values);
        }

        Ok(HeatmapTarget {
            heatmap,
            regression,
        })
    }

    /// Encode a batch of images in parallel. The output follows the input order.
    pub fn encode_batch(
        &self,
        targets: &[LabeledBoxSet<Yolo<f64>>],
        grid: GridSize,
    ) -> Result<Vec<HeatmapTarget>> {
        targets
            .par_iter()
            .map(|target| self.encode(target, grid))
            .collect()
    }

    fn sigmas(&self, w: f64, h: f64, grid: GridSize) -> (f64, f64) {
        match self.mode {
            GaussianMode::Fixed => (self.sigma, self.sigma),
            GaussianMode::Aspect => {
                let sigma_x = self.sigma * w * grid.w as f64 / 6.0;
                let sigma_y = self.sigma * h * grid.h as f64 / 6.0;
                (sigma_x.max(Self::MIN_SIGMA), sigma_y.max(Self::MIN_SIGMA))
            }
        }
    }
}

/// Max-merge an unnormalized Gaussian peaking at 1 on `(row, col)` into one
/// class channel, within `ceil(3 * sigma)` cells per axis.
fn splat_gaussian(
    heatmap: &mut Array3<f64>,
    class: usize,
    row: usize,
    col: usize,
    sigma_x: f64,
    sigma_y: f64,
) {
    let (_, height, width) = heatmap.dim();
    let radius_x = ((sigma_x * 3.0).ceil() as usize).min(width);
    let radius_y = ((sigma_y * 3.0).ceil() as usize).min(height);
    let rows = row.saturating_sub(radius_y)..=row.saturating_add(radius_y).min(height - 1);
    let cols = col.saturating_sub(radius_x)..=col.saturating_add(radius_x).min(width - 1);
    let denom_x = 2.0 * sigma_x * sigma_x;
    let denom_y = 2.0 * sigma_y * sigma_y;

    iproduct!(rows, cols).for_each(|(r, c)| {
        let dx = c as f64 - col as f64;
        let dy = r as f64 - row as f64;
        let value = (-(dx * dx / denom_x + dy * dy / denom_y)).exp();
        let cell = &mut heatmap[[class, r, c]];
        if value > *cell {
            *cell = value;
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn labeled(boxes: &[([f64; 4], usize)]) -> LabeledBoxSet<Yolo<f64>> {
        boxes
            .iter()
            .map(|&(cxcywh, class)| Label {
                rect: Yolo::from_cxcywh(cxcywh),
                class,
            })
            .collect()
    }

    #[test]
    fn gaussian_peaks_at_center() -> Result<()> {
        let encoder = HeatmapEncoderInit::new(2).build()?;
        let grid = GridSize::new(8, 8);
        let target = encoder.encode(&labeled(&[([0.5, 0.25, 0.2, 0.2], 1)]), grid)?;
        let heatmap = target.heatmap.array();

        assert_eq!(heatmap[[1, 2, 4]], 1.0);
        assert_abs_diff_eq!(heatmap[[1, 2, 5]], (-1.0f64 / 8.0).exp());
        assert!(heatmap.index_axis(Axis(0), 0).iter().all(|&value| value == 0.0));
        assert!(heatmap.iter().all(|&value| (0.0..=1.0).contains(&value)));
        Ok(())
    }

    #[test]
    fn overlapping_gaussians_take_maximum() -> Result<()> {
        let encoder = HeatmapEncoderInit::new(1).build()?;
        let grid = GridSize::new(8, 8);
        let boxes = labeled(&[([0.3, 0.5, 0.1, 0.1], 0), ([0.55, 0.5, 0.1, 0.1], 0)]);
        let target = encoder.encode(&boxes, grid)?;
        let heatmap = target.heatmap.array();

        // cell (4, 3) is one cell away from the first center and one from the second
        let one_away = (-1.0f64 / 8.0).exp();
        assert_abs_diff_eq!(heatmap[[0, 4, 3]], one_away);
        assert!(heatmap.iter().all(|&value| value <= 1.0));
        Ok(())
    }

    #[test]
    fn later_box_wins_the_regression_cell() -> Result<()> {
        let encoder = HeatmapEncoderInit {
            regression_kind: RegressionKind::Size,
            ..HeatmapEncoderInit::new(2)
        }
        .build()?;
        let grid = GridSize::new(4, 4);
        let boxes = labeled(&[([0.3, 0.3, 0.2, 0.1], 0), ([0.4, 0.4, 0.3, 0.4], 1)]);
        let target = encoder.encode(&boxes, grid)?;

        assert_eq!(target.regression.values_at(1, 1), vec![0.3, 0.4]);
        assert_eq!(target.heatmap.array()[[0, 1, 1]], 1.0);
        assert_eq!(target.heatmap.array()[[1, 1, 1]], 1.0);
        Ok(())
    }

    #[test]
    fn out_of_grid_boxes_are_dropped() -> Result<()> {
        let encoder = HeatmapEncoderInit::new(1).build()?;
        let grid = GridSize::new(4, 4);
        let target = encoder.encode(&labeled(&[([1.2, 0.5, 0.1, 0.1], 0)]), grid)?;
        assert!(target.heatmap.array().iter().all(|&value| value == 0.0));
        assert!(target.regression.array().iter().all(|&value| value == 0.0));
        Ok(())
    }

    #[test]
    fn aspect_mode_follows_box_shape() -> Result<()> {
        let encoder = HeatmapEncoderInit {
            sigma: 1.0,
            mode: GaussianMode::Aspect,
            ..HeatmapEncoderInit::new(1)
        }
        .build()?;
        let grid = GridSize::new(32, 32);
        let target = encoder.encode(&labeled(&[([0.5, 0.5, 0.75, 0.1875], 0)]), grid)?;
        let heatmap = target.heatmap.array();

        // sigma is 4 cells along x and 1 cell along y
        assert_abs_diff_eq!(heatmap[[0, 16, 20]], (-16.0f64 / 32.0).exp());
        assert_abs_diff_eq!(heatmap[[0, 17, 16]], (-0.5f64).exp());
        Ok(())
    }

    #[test]
    fn invalid_input_is_rejected() -> Result<()> {
        assert!(HeatmapEncoderInit {
            sigma: 0.0,
            ..HeatmapEncoderInit::new(1)
        }
        .build()
        .is_err());

        let encoder = HeatmapEncoderInit::new(1).build()?;
        let boxes = labeled(&[([0.5, 0.5, 0.1, 0.1], 1)]);
        assert!(encoder.encode(&boxes, GridSize::new(4, 4)).is_err());
        Ok(())
    }

    #[test]
    fn huge_sigma_covers_the_grid() -> Result<()> {
        let encoder = HeatmapEncoderInit {
            sigma: 1e300,
            ..HeatmapEncoderInit::new(1)
        }
        .build()?;
        let grid = GridSize::new(3, 5);
        let target = encoder.encode(&labeled(&[([0.9, 0.9, 0.1, 0.1], 0)]), grid)?;
        assert!(target.heatmap.array().iter().all(|&value| value == 1.0));
        Ok(())
    }

    #[test]
    fn batch_keeps_input_order() -> Result<()> {
        let encoder = HeatmapEncoderInit::new(1).build()?;
        let grid = GridSize::new(8, 8);
        let targets = vec![
            labeled(&[([0.1, 0.1, 0.1, 0.1], 0)]),
            LabeledBoxSet::empty(),
            labeled(&[([0.9, 0.9, 0.1, 0.1], 0)]),
        ];
        let batch = encoder.encode_batch(&targets, grid)?;
        let sequential = targets
            .iter()
            .map(|target| encoder.encode(target, grid))
            .collect::<Result<Vec<_>>>()?;
        assert_eq!(batch, sequential);
        Ok(())
    }
}

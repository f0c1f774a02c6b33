use super::{Heatmap, RegressionKind, RegressionMap};
use crate::{
    anchor::{AnchorGrid, AnchorPoint},
    common::*,
};

#[derive(Debug, Clone)]
pub struct HeatmapDecoderInit {
    pub confidence_threshold: f64,
    /// The side length of the local maximum neighborhood. It must be odd.
    pub kernel_size: usize,
}

impl HeatmapDecoderInit {
    pub fn build(self) -> Result<HeatmapDecoder> {
        let Self {
            confidence_threshold,
            kernel_size,
        } = self;

        ensure!(
            (0.0..=1.0).contains(&confidence_threshold),
            "confidence_threshold must be in range [0, 1], but get {}",
            confidence_threshold
        );
        ensure!(
            kernel_size % 2 == 1,
            "kernel_size must be a positive odd number, but get {}",
            kernel_size
        );

        Ok(HeatmapDecoder {
            confidence_threshold,
            radius: kernel_size / 2,
        })
    }
}

impl Default for HeatmapDecoderInit {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.3,
            kernel_size: 3,
        }
    }
}

#[derive(Debug, Clone)]
pub struct HeatmapDecoder {
    confidence_threshold: f64,
    radius: usize,
}

/// A retained heatmap cell.
#[derive(Debug, Clone, Copy)]
struct Peak {
    confidence: R64,
    row: usize,
    col: usize,
    class: usize,
}

impl HeatmapDecoder {
    /// Extract boxes from predicted maps.
    ///
    /// A cell is kept if it exceeds the confidence threshold and is not
    /// smaller than any cell of the same class in its neighborhood. The
    /// output is ordered by descending confidence, then row-major cell order,
    /// then class id.
    pub fn decode(
        &self,
        heatmap: &Heatmap,
        regression: &RegressionMap,
    ) -> Result<Detections<Yolo<f64>>> {
        let grid = heatmap.grid_size();
        ensure!(
            grid == regression.grid_size(),
            "heatmap grid {:?} does not match regression grid {:?}",
            grid,
            regression.grid_size()
        );

        let array = heatmap.array();
        let mut peaks: Vec<Peak> = iproduct!(0..heatmap.num_classes(), 0..grid.h, 0..grid.w)
            .filter_map(|(class, row, col)| {
                let value = array[[class, row, col]];
                (value > self.confidence_threshold && self.is_local_max(array, class, row, col))
                    .then(|| Peak {
                        confidence: r64(value),
                        row,
                        col,
                        class,
                    })
            })
            .collect();
        peaks.sort_by(|lhs, rhs| {
            rhs.confidence
                .cmp(&lhs.confidence)
                .then_with(|| (lhs.row, lhs.col, lhs.class).cmp(&(rhs.row, rhs.col, rhs.class)))
        });

        let anchors = AnchorGrid::generate(grid);
        let detections = peaks
            .into_iter()
            .map(|peak| {
                let Peak {
                    confidence,
                    row,
                    col,
                    class,
                } = peak;
                let anchor = anchors
                    .get(row, col)
                    .ok_or_else(|| format_err!("cell ({}, {}) is out of the grid", row, col))?;
                let values = regression.values_at(row, col);
                let rect = reconstruct_box(anchor, *regression.kind(), &values)?;
                Ok(ScoredLabel {
                    rect,
                    class,
                    confidence: confidence.raw(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Detections::try_from_iter(detections)
    }

    /// Decode a batch of images in parallel. The output follows the input order.
    pub fn decode_batch(
        &self,
        heatmaps: &[Heatmap],
        regressions: &[RegressionMap],
    ) -> Result<Vec<Detections<Yolo<f64>>>> {
        ensure!(
            heatmaps.len() == regressions.len(),
            "the number of heatmaps {} does not match the number of regression maps {}",
            heatmaps.len(),
            regressions.len()
        );
        heatmaps
            .par_iter()
            .zip(regressions)
            .map(|(heatmap, regression)| self.decode(heatmap, regression))
            .collect()
    }

    fn is_local_max(&self, array: &Array3<f64>, class: usize, row: usize, col: usize) -> bool {
        let (_, height, width) = array.dim();
        let value = array[[class, row, col]];
        let row_end = row.saturating_add(self.radius).min(height - 1);
        let col_end = col.saturating_add(self.radius).min(width - 1);
        let rows = row.saturating_sub(self.radius)..=row_end;
        let cols = col.saturating_sub(self.radius)..=col_end;
        iproduct!(rows, cols).all(|(r, c)| array[[class, r, c]] <= value)
    }
}

fn reconstruct_box(
    anchor: &AnchorPoint,
    kind: RegressionKind,
    values: &[f64],
) -> Result<Yolo<f64>> {
    ensure!(
        values.iter().all(|value| value.is_finite()),
        "non-finite regression values {:?}",
        values
    );
    let cxcywh = match (kind, values) {
        (RegressionKind::Size, &[w, h]) => [anchor.x, anchor.y, w, h],
        (RegressionKind::OffsetSize, &[dx, dy, w, h]) => [anchor.x + dx, anchor.y + dy, w, h],
        _ => bail!(
            "expect {} regression values, but get {}",
            kind.num_channels(),
            values.len()
        ),
    };
    let [cx, cy, w, h] = cxcywh;
    Yolo::try_from_cxcywh([cx, cy, w.max(0.0), h.max(0.0)])
}

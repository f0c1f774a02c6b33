use crate::common::*;

/// Multi-level anchor boxes in the RetinaNet/EfficientDet layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PyramidAnchorsInit {
    /// Level `p` has stride `2^p`.
    pub pyramid_levels: Vec<u32>,
    pub scales: Vec<f64>,
    /// Aspect ratios `h / w`.
    pub ratios: Vec<f64>,
    /// Multiplier on the base size `2^(p + 2)`.
    pub anchor_size: f64,
}

impl PyramidAnchorsInit {
    pub fn build(self) -> Result<PyramidAnchors> {
        let Self {
            pyramid_levels,
            scales,
            ratios,
            anchor_size,
        } = self;

        ensure!(!pyramid_levels.is_empty(), "pyramid_levels must not be empty");
        ensure!(
            pyramid_levels.iter().all(|&level| level < 16),
            "pyramid level must be less than 16"
        );
        ensure!(!scales.is_empty(), "scales must not be empty");
        ensure!(!ratios.is_empty(), "ratios must not be empty");
        ensure!(
            scales
                .iter()
                .chain(&ratios)
                .all(|&value| value.is_finite() && value > 0.0),
            "scales and ratios must be positive"
        );
        ensure!(
            anchor_size.is_finite() && anchor_size > 0.0,
            "anchor_size must be positive"
        );

        // per-cell anchor shapes, ratio-major
        let shapes: Vec<[f64; 2]> = iproduct!(ratios.iter(), scales.iter())
            .map(|(&ratio, &scale)| {
                let area = scale * scale;
                let w = (area / ratio).sqrt();
                let h = w * ratio;
                [w, h]
            })
            .collect();

        Ok(PyramidAnchors {
            pyramid_levels,
            anchor_size,
            shapes,
        })
    }
}

impl Default for PyramidAnchorsInit {
    fn default() -> Self {
        Self {
            pyramid_levels: vec![3, 4, 5, 6, 7],
            scales: vec![1.0, 2f64.powf(1.0 / 3.0), 2f64.powf(2.0 / 3.0)],
            ratios: vec![0.5, 1.0, 2.0],
            anchor_size: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PyramidAnchors {
    pyramid_levels: Vec<u32>,
    anchor_size: f64,
    /// Unit `[w, h]` per (ratio, scale) pair, multiplied by the level base size.
    shapes: Vec<[f64; 2]>,
}

impl PyramidAnchors {
    pub fn anchors_per_cell(&self) -> usize {
        self.shapes.len()
    }

    /// The `(rows, cols)` of the feature map at a level for an image size.
    pub fn level_grid(&self, level: u32, image_size: &ImageSize<f64>) -> (usize, usize) {
        let stride = (1u64 << level) as f64;
        let rows = (image_size.h() / stride).ceil() as usize;
        let cols = (image_size.w() / stride).ceil() as usize;
        (rows, cols)
    }

    /// Generate anchor boxes in pixels.
    ///
    /// Boxes are ordered by level, then row-major cell, then (ratio, scale).
    pub fn generate(&self, image_size: &ImageSize<f64>) -> BoxSet<Pascal<f64>> {
        self.pyramid_levels
            .iter()
            .flat_map(|&level| {
                let stride = (1u64 << level) as f64;
                let base = self.anchor_size * (1u64 << (level + 2)) as f64;
                let (rows, cols) = self.level_grid(level, image_size);

                iproduct!(0..rows, 0..cols, self.shapes.iter()).map(move |(row, col, &[w, h])| {
                    let cx = (col as f64 + 0.5) * stride;
                    let cy = (row as f64 + 0.5) * stride;
                    let half_w = base * w / 2.0;
                    let half_h = base * h / 2.0;
                    Pascal::from_xyxy([cx - half_w, cy - half_h, cx + half_w, cy + half_h])
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn single_level_layout() -> Result<()> {
        let anchors = PyramidAnchorsInit {
            pyramid_levels: vec![6],
            scales: vec![1.0],
            ratios: vec![0.5, 1.0, 2.0],
            anchor_size: 1.0,
        }
        .build()?;
        let size = ImageSize::from_wh([1024.0, 1024.0]);
        let boxes = anchors.generate(&size);

        assert_eq!(anchors.level_grid(6, &size), (16, 16));
        assert_eq!(boxes.len(), 16 * 16 * 3);

        // the first cell is centered at half a stride
        boxes.iter().take(3).for_each(|rect| {
            assert_abs_diff_eq!(rect.cx(), 32.0, epsilon = 1e-9);
            assert_abs_diff_eq!(rect.cy(), 32.0, epsilon = 1e-9);
            assert_abs_diff_eq!(rect.area(), 256.0 * 256.0, epsilon = 1e-6);
        });
        assert_abs_diff_eq!(boxes[0].h() / boxes[0].w(), 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(boxes[2].h() / boxes[2].w(), 2.0, epsilon = 1e-9);

        // the next cell moves along the row
        assert_abs_diff_eq!(boxes[3].cx(), 96.0, epsilon = 1e-9);
        assert_abs_diff_eq!(boxes[3].cy(), 32.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn odd_image_size_rounds_up() -> Result<()> {
        let anchors = PyramidAnchorsInit {
            pyramid_levels: vec![3, 4],
            scales: vec![1.0, 1.25],
            ratios: vec![1.0],
            anchor_size: 2.0,
        }
        .build()?;
        let size = ImageSize::from_wh([100.0, 60.0]);
        let boxes = anchors.generate(&size);

        assert_eq!(anchors.level_grid(3, &size), (8, 13));
        assert_eq!(anchors.level_grid(4, &size), (4, 7));
        assert_eq!(boxes.len(), (8 * 13 + 4 * 7) * 2);
        assert_abs_diff_eq!(boxes[0].w(), 64.0, epsilon = 1e-9);
        assert_abs_diff_eq!(boxes[1].w(), 80.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn invalid_init_is_rejected() {
        let init = PyramidAnchorsInit {
            ratios: vec![0.0],
            ..Default::default()
        };
        assert!(init.build().is_err());
        let init = PyramidAnchorsInit {
            pyramid_levels: vec![],
            ..Default::default()
        };
        assert!(init.build().is_err());
    }
}

use crate::{anchor::GridSize, common::*};

/// The layout of the regression channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegressionKind {
    /// `[w, h]` of the box.
    Size,
    /// `[dx, dy, w, h]`, the center offset from the cell anchor followed by the box size.
    OffsetSize,
}

impl RegressionKind {
    pub fn num_channels(&self) -> usize {
        match self {
            Self::Size => 2,
            Self::OffsetSize => 4,
        }
    }

    pub fn from_num_channels(num_channels: usize) -> Result<Self> {
        let kind = match num_channels {
            2 => Self::Size,
            4 => Self::OffsetSize,
            _ => bail!(
                "regression map must have 2 or 4 channels, but get {}",
                num_channels
            ),
        };
        Ok(kind)
    }
}

impl Default for RegressionKind {
    fn default() -> Self {
        Self::OffsetSize
    }
}

/// Checked per-class center likelihood map in shape `[classes, h, w]`.
///
/// Values are finite and lie in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct Heatmap {
    #[get = "pub"]
    array: Array3<f64>,
}

impl Heatmap {
    pub fn zeros(num_classes: usize, grid: GridSize) -> Self {
        Self {
            array: Array3::zeros((num_classes, grid.h, grid.w)),
        }
    }

    pub fn num_classes(&self) -> usize {
        self.array.len_of(Axis(0))
    }

    pub fn grid_size(&self) -> GridSize {
        let (_, h, w) = self.array.dim();
        GridSize { h, w }
    }

    pub fn into_array(self) -> Array3<f64> {
        self.array
    }

    pub(crate) fn array_mut(&mut self) -> &mut Array3<f64> {
        &mut self.array
    }
}

impl TryFrom<Array3<f64>> for Heatmap {
    type Error = Error;

    fn try_from(array: Array3<f64>) -> Result<Self, Self::Error> {
        let (_, h, w) = array.dim();
        ensure!(h > 0 && w > 0, "heatmap must have a non-empty grid");
        ensure!(
            array
                .iter()
                .all(|&value| value.is_finite() && (0.0..=1.0).contains(&value)),
            "heatmap values must be finite and in range [0, 1]"
        );
        Ok(Self { array })
    }
}

/// Checked box regression map in shape `[k, h, w]` with `k` being 2 or 4.
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct RegressionMap {
    #[get = "pub"]
    array: Array3<f64>,
    #[get = "pub"]
    kind: RegressionKind,
}

impl RegressionMap {
    pub fn zeros(kind: RegressionKind, grid: GridSize) -> Self {
        Self {
            array: Array3::zeros((kind.num_channels(), grid.h, grid.w)),
            kind,
        }
    }

    pub fn grid_size(&self) -> GridSize {
        let (_, h, w) = self.array.dim();
        GridSize { h, w }
    }

    /// The regression values at a cell, one per channel.
    pub fn values_at(&self, row: usize, col: usize) -> Vec<f64> {
        self.array.slice(ndarray::s![.., row, col]).to_vec()
    }

    pub fn into_array(self) -> Array3<f64> {
        self.array
    }

    pub(crate) fn set_values_at(&mut self, row: usize, col: usize, values: &[f64]) {
        self.array
            .slice_mut(ndarray::s![.., row, col])
            .iter_mut()
            .zip(values)
            .for_each(|(dst, &src)| *dst = src);
    }
}

impl TryFrom<Array3<f64>> for RegressionMap {
    type Error = Error;

    fn try_from(array: Array3<f64>) -> Result<Self, Self::Error> {
        let (num_channels, h, w) = array.dim();
        let kind = RegressionKind::from_num_channels(num_channels)?;
        ensure!(h > 0 && w > 0, "regression map must have a non-empty grid");
        Ok(Self { array, kind })
    }
}

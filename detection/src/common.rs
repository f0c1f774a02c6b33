pub use anyhow::{bail, ensure, format_err, Context as _, Error, Result};
pub use bbox::{prelude::*, BoxSet, ImageSize, Pascal, Yolo};
pub use getset::{CopyGetters, Getters};
pub use itertools::{iproduct, izip, Itertools as _};
pub use label::{Detections, Label, LabeledBoxSet, ScoredLabel};
pub use log::{debug, info, warn};
pub use ndarray::{Array2, Array3, ArrayBase, ArrayView2, ArrayView3, Axis, Data, Dimension};
pub use noisy_float::prelude::*;
pub use rayon::prelude::*;
pub use serde::{Deserialize, Serialize};
pub use std::{
    borrow::Borrow,
    cmp::Ordering,
    collections::BTreeMap,
    fmt::Debug,
    fs,
    iter,
    path::Path,
};

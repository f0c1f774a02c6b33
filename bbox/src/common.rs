pub use anyhow::{ensure, Result};
pub use num_traits::{Float, NumCast, One, ToPrimitive, Zero};
pub use std::{
    iter::FromIterator,
    ops::{Index, Mul},
    slice,
    vec,
};

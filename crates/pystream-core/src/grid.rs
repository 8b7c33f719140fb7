//! Dense row-major raster of `f64` values.
//!
//! Every spatial quantity of the model (terrain, climate frames, state
//! variables) is a `Grid` with the same shape, so cell `i` of one grid
//! lines up with cell `i` of any other.
use std::ops::{Index, IndexMut};

use crate::error::{Result, StreamError};

/// `(rows, cols)`.
pub type Shape = (usize, usize);

#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Grid {
    /// Create a grid from row-major data.
    pub fn new(rows: usize, cols: usize, data: Vec<f64>) -> Result<Self> {
        if rows == 0 || cols == 0 {
            return Err(StreamError::InvalidInput(format!(
                "grid dimensions must be positive, got ({rows}, {cols})"
            )));
        }
        if data.len() != rows * cols {
            return Err(StreamError::LengthMismatch {
                expected: rows * cols,
                found: data.len(),
            });
        }
        Ok(Self { rows, cols, data })
    }

    /// Build a grid from nested rows, which must all have the same length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_rows = rows.len();
        let n_cols = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_rows * n_cols);
        for (r, row) in rows.into_iter().enumerate() {
            if row.len() != n_cols {
                return Err(StreamError::InvalidInput(format!(
                    "row {r} has {} values, expected {n_cols}",
                    row.len()
                )));
            }
            data.extend(row);
        }
        Self::new(n_rows, n_cols, data)
    }

    pub fn filled(shape: Shape, value: f64) -> Self {
        Self {
            rows: shape.0,
            cols: shape.1,
            data: vec![value; shape.0 * shape.1],
        }
    }

    pub fn zeros(shape: Shape) -> Self {
        Self::filled(shape, 0.0)
    }

    pub fn shape(&self) -> Shape {
        (self.rows, self.cols)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Number of cells.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Flat index of `(row, col)`.
    #[inline]
    pub fn index_of(&self, row: usize, col: usize) -> usize {
        row * self.cols + col
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            Some(self.data[self.index_of(row, col)])
        } else {
            None
        }
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f64> {
        self.data
    }

    pub fn iter(&self) -> std::slice::Iter<'_, f64> {
        self.data.iter()
    }

    /// Apply `f` to every cell.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Grid {
        Grid {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Combine two grids of the same shape cell by cell.
    pub fn zip_with(&self, other: &Grid, f: impl Fn(f64, f64) -> f64) -> Result<Grid> {
        other.ensure_shape("grid", self.shape())?;
        Ok(Grid {
            rows: self.rows,
            cols: self.cols,
            data: self
                .data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        })
    }

    /// Fail with `ShapeMismatch` unless this grid has shape `expected`.
    pub fn ensure_shape(&self, what: &str, expected: Shape) -> Result<()> {
        if self.shape() != expected {
            return Err(StreamError::shape(what, expected, self.shape()));
        }
        Ok(())
    }

    /// Largest value, ignoring NaN. `None` if every cell is NaN.
    pub fn nan_max(&self) -> Option<f64> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }

    /// Mean over the cells where `mask` is true (all cells when `None`).
    /// Returns NaN when no cell is selected.
    pub fn mean(&self, mask: Option<&[bool]>) -> f64 {
        masked_mean(&self.data, mask)
    }

    /// `(min, max)` ignoring NaN.
    pub fn range(&self) -> Option<(f64, f64)> {
        let mut it = self.data.iter().copied().filter(|v| !v.is_nan());
        let first = it.next()?;
        Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Mean of `values` where `mask` is true. NaN when nothing is selected.
pub(crate) fn masked_mean(values: &[f64], mask: Option<&[bool]>) -> f64 {
    let (sum, n) = match mask {
        Some(m) => values
            .iter()
            .zip(m)
            .filter(|&(_, &keep)| keep)
            .fold((0.0, 0usize), |(s, n), (&v, _)| (s + v, n + 1)),
        None => (values.iter().sum(), values.len()),
    };
    if n == 0 {
        f64::NAN
    } else {
        sum / n as f64
    }
}

impl Index<(usize, usize)> for Grid {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        assert!(row < self.rows && col < self.cols, "cell ({row}, {col}) out of bounds");
        &self.data[row * self.cols + col]
    }
}

impl IndexMut<(usize, usize)> for Grid {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        assert!(row < self.rows && col < self.cols, "cell ({row}, {col}) out of bounds");
        &mut self.data[row * self.cols + col]
    }
}

/// STREAM model state variables.
///
/// Three grids carried from one month to the next:
/// - `snow_accum`: snow pack [mm]
/// - `available_water`: soil water available to plants [mm]
/// - `ground_water`: groundwater reservoir [mm]
///
/// Every store starts empty, which is why a run needs warm-up months.
use super::constants::N_STATE_GRIDS;
use crate::error::{Result, StreamError};
use crate::grid::{Grid, Shape};

#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub snow_accum: Grid,
    pub available_water: Grid,
    pub ground_water: Grid,
}

impl State {
    /// Empty stores on a grid of `shape`.
    pub fn initialize(shape: Shape) -> Self {
        Self {
            snow_accum: Grid::zeros(shape),
            available_water: Grid::zeros(shape),
            ground_water: Grid::zeros(shape),
        }
    }

    pub fn shape(&self) -> Shape {
        self.snow_accum.shape()
    }

    /// Serialize to a flat vector.
    ///
    /// Layout: [snow_accum, available_water, ground_water], each row-major.
    pub fn to_vec(&self) -> Vec<f64> {
        let mut out = Vec::with_capacity(N_STATE_GRIDS * self.snow_accum.len());
        out.extend_from_slice(self.snow_accum.as_slice());
        out.extend_from_slice(self.available_water.as_slice());
        out.extend_from_slice(self.ground_water.as_slice());
        out
    }

    /// Deserialize from the layout of [`State::to_vec`].
    pub fn from_vec(shape: Shape, data: &[f64]) -> Result<Self> {
        let n = shape.0 * shape.1;
        if data.len() != N_STATE_GRIDS * n {
            return Err(StreamError::LengthMismatch {
                expected: N_STATE_GRIDS * n,
                found: data.len(),
            });
        }
        let grid = |k: usize| Grid::new(shape.0, shape.1, data[k * n..(k + 1) * n].to_vec());
        Ok(Self {
            snow_accum: grid(0)?,
            available_water: grid(1)?,
            ground_water: grid(2)?,
        })
    }

    /// Fail unless every grid has `shape`.
    pub fn ensure_shape(&self, shape: Shape) -> Result<()> {
        self.snow_accum.ensure_shape("snow accumulation state", shape)?;
        self.available_water.ensure_shape("available water state", shape)?;
        self.ground_water.ensure_shape("ground water state", shape)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_is_empty() {
        let s = State::initialize((3, 4));
        assert_eq!(s.shape(), (3, 4));
        assert!(s.to_vec().iter().all(|&v| v == 0.0));
        assert_eq!(s.to_vec().len(), 36);
    }

    #[test]
    fn vec_roundtrip() {
        let mut s = State::initialize((2, 2));
        s.snow_accum[(0, 1)] = 5.0;
        s.ground_water[(1, 1)] = 7.0;
        let back = State::from_vec((2, 2), &s.to_vec()).unwrap();
        assert_eq!(back, s);
    }

    #[test]
    fn from_vec_wrong_length() {
        assert!(State::from_vec((2, 2), &[0.0; 11]).is_err());
    }

    #[test]
    fn ensure_shape_detects_mismatch() {
        let s = State::initialize((2, 2));
        assert!(s.ensure_shape((2, 2)).is_ok());
        assert!(s.ensure_shape((3, 2)).is_err());
    }
}

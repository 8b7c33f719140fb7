//! D8 flow directions and weighted flow accumulation.
//!
//! Every valid cell drains to the one neighbour with the steepest downhill
//! gradient. Cells without a lower valid neighbour (pits, flats, cells at the
//! grid edge sloping outwards) terminate the flow path. The accumulated value
//! of a cell is its own weight plus the weights of every cell upstream.
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::{Result, StreamError};
use crate::grid::{Grid, Shape};
use crate::raster::CellSize;

/// Neighbour offsets `(d_row, d_col)` in N, NE, E, SE, S, SW, W, NW order.
const OFFSETS: [(isize, isize); 8] = [
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
];

/// Receiving cell of every valid cell and an upstream-first processing order.
#[derive(Debug, Clone)]
pub struct FlowNetwork {
    shape: Shape,
    receivers: Vec<Option<usize>>,
    valid: Vec<bool>,
    /// Valid cells sorted by decreasing elevation.
    order: Vec<usize>,
}

impl FlowNetwork {
    /// Compute D8 flow directions over `dem`.
    ///
    /// Cells equal to `nodata` or NaN are excluded: they neither drain nor
    /// receive. The gradient towards a neighbour is the elevation drop divided
    /// by the distance between cell centres.
    pub fn d8(dem: &Grid, nodata: Option<f64>, cell_size: CellSize) -> Self {
        let (rows, cols) = dem.shape();
        let z = dem.as_slice();
        let valid: Vec<bool> = z
            .iter()
            .map(|&v| !v.is_nan() && nodata != Some(v))
            .collect();
        let diagonal = cell_size.x.hypot(cell_size.y);

        let mut receivers = vec![None; z.len()];
        for r in 0..rows {
            for c in 0..cols {
                let idx = r * cols + c;
                if !valid[idx] {
                    continue;
                }
                let mut best: Option<(usize, f64)> = None;
                for (n, dist) in neighbours(r, c, rows, cols, cell_size, diagonal) {
                    if !valid[n] {
                        continue;
                    }
                    let drop = z[idx] - z[n];
                    if drop <= 0.0 {
                        continue;
                    }
                    let slope = drop / dist;
                    if best.map_or(true, |(_, s)| slope > s) {
                        best = Some((n, slope));
                    }
                }
                receivers[idx] = best.map(|(n, _)| n);
            }
        }

        let mut order: Vec<usize> = (0..z.len()).filter(|&i| valid[i]).collect();
        order.sort_by(|&a, &b| z[b].total_cmp(&z[a]));

        Self {
            shape: (rows, cols),
            receivers,
            valid,
            order,
        }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Cell receiving the flow of `idx`, if any.
    pub fn receiver(&self, idx: usize) -> Option<usize> {
        self.receivers.get(idx).copied().flatten()
    }

    pub fn is_valid(&self, idx: usize) -> bool {
        self.valid.get(idx).copied().unwrap_or(false)
    }

    pub fn valid_mask(&self) -> &[bool] {
        &self.valid
    }

    /// Valid cells whose flow path ends in the cell itself.
    pub fn n_terminal(&self) -> usize {
        self.order
            .iter()
            .filter(|&&i| self.receivers[i].is_none())
            .count()
    }

    /// Cells draining directly into `idx`.
    pub fn donors(&self, idx: usize) -> SmallVec<[usize; 8]> {
        let (rows, cols) = self.shape;
        let (r, c) = (idx / cols, idx % cols);
        OFFSETS
            .iter()
            .filter_map(|&(dr, dc)| offset(r, c, dr, dc, rows, cols))
            .filter(|&n| self.receivers[n] == Some(idx))
            .collect()
    }

    /// Weighted flow accumulation.
    ///
    /// `weights` is in flat row-major order. Invalid cells are 0 in the
    /// result and their weights are ignored.
    pub fn accumulate(&self, weights: &[f64]) -> Result<Grid> {
        let n = self.shape.0 * self.shape.1;
        if weights.len() != n {
            return Err(StreamError::LengthMismatch {
                expected: n,
                found: weights.len(),
            });
        }
        let mut acc: Vec<f64> = weights
            .iter()
            .zip(&self.valid)
            .map(|(&w, &ok)| if ok { w } else { 0.0 })
            .collect();
        // Receivers are strictly lower, so descending elevation is a valid
        // upstream-first order.
        for &i in &self.order {
            if let Some(recv) = self.receivers[i] {
                acc[recv] += acc[i];
            }
        }
        Grid::new(self.shape.0, self.shape.1, acc)
    }
}

fn offset(r: usize, c: usize, dr: isize, dc: isize, rows: usize, cols: usize) -> Option<usize> {
    let nr = r.checked_add_signed(dr)?;
    let nc = c.checked_add_signed(dc)?;
    (nr < rows && nc < cols).then(|| nr * cols + nc)
}

fn neighbours(
    r: usize,
    c: usize,
    rows: usize,
    cols: usize,
    cell_size: CellSize,
    diagonal: f64,
) -> SmallVec<[(usize, f64); 8]> {
    OFFSETS
        .iter()
        .filter_map(|&(dr, dc)| {
            let dist = match (dr, dc) {
                (0, _) => cell_size.x,
                (_, 0) => cell_size.y,
                _ => diagonal,
            };
            offset(r, c, dr, dc, rows, cols).map(|n| (n, dist))
        })
        .collect()
}

/// Cell where the simulated discharge is read.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Outlet {
    /// Cell with the largest accumulated flow.
    #[default]
    MaxAccumulation,
    /// A fixed gauge cell.
    Cell { row: usize, col: usize },
}

impl Outlet {
    /// Fail if a fixed cell lies outside `shape`.
    pub fn validate(&self, shape: Shape) -> Result<()> {
        match *self {
            Outlet::Cell { row, col } if row >= shape.0 || col >= shape.1 => {
                Err(StreamError::InvalidInput(format!(
                    "outlet cell ({row}, {col}) lies outside the grid {shape:?}"
                )))
            }
            _ => Ok(()),
        }
    }

    /// Read the flow at the outlet. NaN values are ignored for the maximum;
    /// an all-NaN grid reads as 0.
    pub fn read(&self, accumulated: &Grid) -> f64 {
        match *self {
            Outlet::MaxAccumulation => accumulated.nan_max().unwrap_or(0.0),
            Outlet::Cell { row, col } => accumulated.get(row, col).unwrap_or(0.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit() -> CellSize {
        CellSize::square(1.0).unwrap()
    }

    /// A 3x3 cone draining to the centre cell.
    fn bowl() -> Grid {
        Grid::from_rows(vec![
            vec![9.0, 8.0, 9.0],
            vec![8.0, 1.0, 8.0],
            vec![9.0, 8.0, 9.0],
        ])
        .unwrap()
    }

    #[test]
    fn every_cell_drains_to_the_pit() {
        let net = FlowNetwork::d8(&bowl(), None, unit());
        for i in 0..9 {
            if i == 4 {
                assert_eq!(net.receiver(i), None);
            } else {
                assert_eq!(net.receiver(i), Some(4), "cell {i}");
            }
        }
        assert_eq!(net.n_terminal(), 1);
        assert_eq!(net.donors(4).len(), 8);
    }

    #[test]
    fn accumulation_counts_upstream_cells() {
        let net = FlowNetwork::d8(&bowl(), None, unit());
        let acc = net.accumulate(&[1.0; 9]).unwrap();
        assert_eq!(acc[(1, 1)], 9.0);
        assert_eq!(acc[(0, 0)], 1.0);
        assert_eq!(Outlet::MaxAccumulation.read(&acc), 9.0);
    }

    #[test]
    fn steepest_descent_prefers_larger_gradient() {
        // Centre at 10: north drop 4 over 1, north-east drop 5 over sqrt(2).
        let dem = Grid::from_rows(vec![
            vec![20.0, 6.0, 5.0],
            vec![20.0, 10.0, 20.0],
            vec![20.0, 20.0, 20.0],
        ])
        .unwrap();
        let net = FlowNetwork::d8(&dem, None, unit());
        assert_eq!(net.receiver(4), Some(1));
    }

    #[test]
    fn slope_accounts_for_rectangular_cells() {
        // East neighbour drops 3 over 10 units, south drops 2 over 1 unit.
        let dem = Grid::from_rows(vec![vec![10.0, 7.0], vec![8.0, 9.0]]).unwrap();
        let net = FlowNetwork::d8(&dem, None, CellSize::new(10.0, 1.0).unwrap());
        assert_eq!(net.receiver(0), Some(2));
    }

    #[test]
    fn river_conserves_mass() {
        let dem = Grid::from_rows(vec![vec![5.0, 4.0, 3.0, 2.0, 1.0]]).unwrap();
        let net = FlowNetwork::d8(&dem, None, unit());
        let weights = [0.5, 1.5, 2.0, 0.0, 1.0];
        let acc = net.accumulate(&weights).unwrap();
        assert_relative_eq!(acc[(0, 4)], 5.0);
        let terminal_sum: f64 = (0..5)
            .filter(|&i| net.receiver(i).is_none())
            .map(|i| acc.as_slice()[i])
            .sum();
        assert_relative_eq!(terminal_sum, weights.iter().sum::<f64>());
    }

    #[test]
    fn nodata_cells_block_flow() {
        let dem = Grid::from_rows(vec![vec![5.0, -9999.0, 1.0]]).unwrap();
        let net = FlowNetwork::d8(&dem, Some(-9999.0), unit());
        assert_eq!(net.receiver(0), None);
        assert!(!net.is_valid(1));
        let acc = net.accumulate(&[1.0, 100.0, 1.0]).unwrap();
        assert_eq!(acc.as_slice(), &[1.0, 0.0, 1.0]);
    }

    #[test]
    fn flats_terminate() {
        let net = FlowNetwork::d8(&Grid::filled((2, 2), 3.0), None, unit());
        assert_eq!(net.n_terminal(), 4);
    }

    #[test]
    fn accumulate_checks_length() {
        let net = FlowNetwork::d8(&bowl(), None, unit());
        assert!(net.accumulate(&[1.0; 4]).is_err());
    }

    #[test]
    fn fixed_outlet_reads_its_cell() {
        let acc = Grid::from_rows(vec![vec![1.0, 7.0], vec![3.0, 2.0]]).unwrap();
        assert_eq!(Outlet::Cell { row: 1, col: 0 }.read(&acc), 3.0);
        assert!(Outlet::Cell { row: 2, col: 0 }.validate((2, 2)).is_err());
        assert!(Outlet::MaxAccumulation.validate((2, 2)).is_ok());
    }
}

//! Annual heat index and Thornthwaite exponent grids.
use tracing::debug;

use super::constants::MONTHS_PER_YEAR;
use super::processes::{compute_alpha, heat_index_term};
use crate::error::{Result, StreamError};
use crate::grid::Grid;

/// Heat index of one year: per cell sum of `(T / 5)^1.514` over twelve
/// monthly temperature grids, scaled by `heat_coeff`.
pub fn annual_heat_index(months: &[&Grid], heat_coeff: f64) -> Result<Grid> {
    if months.len() != MONTHS_PER_YEAR {
        return Err(StreamError::IncompleteYear {
            months: months.len(),
        });
    }
    let shape = months[0].shape();
    let mut index = Grid::zeros(shape);
    for month in months {
        month.ensure_shape("temperature grid", shape)?;
        for (acc, &t) in index.as_mut_slice().iter_mut().zip(month.iter()) {
            *acc += heat_index_term(t);
        }
    }
    for v in index.as_mut_slice() {
        *v *= heat_coeff;
    }

    if let Some((lo, hi)) = index.range() {
        debug!(min = lo, max = hi, "annual heat index");
    }
    Ok(index)
}

/// Thornthwaite exponent of every cell.
pub fn alpha_grid(heat_index: &Grid) -> Grid {
    heat_index.map(compute_alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn constant_year() {
        let t = Grid::filled((2, 3), 10.0);
        let months: Vec<&Grid> = std::iter::repeat(&t).take(12).collect();
        let hi = annual_heat_index(&months, 1.0).unwrap();
        let expected = 12.0 * 2.0_f64.powf(1.514);
        for &v in hi.iter() {
            assert_relative_eq!(v, expected, epsilon = 1e-10);
        }
    }

    #[test]
    fn freezing_months_and_nan_count_as_zero() {
        let warm = Grid::filled((1, 2), 5.0);
        let cold = Grid::filled((1, 2), -8.0);
        let nan = Grid::filled((1, 2), f64::NAN);
        let mut months = vec![&warm; 6];
        months.extend(vec![&cold; 5]);
        months.push(&nan);
        let hi = annual_heat_index(&months, 2.0).unwrap();
        assert_relative_eq!(hi[(0, 0)], 12.0);
    }

    #[test]
    fn needs_twelve_months() {
        let t = Grid::filled((1, 1), 10.0);
        let err = annual_heat_index(&[&t; 11], 1.0).unwrap_err();
        assert!(matches!(err, StreamError::IncompleteYear { months: 11 }));
    }

    #[test]
    fn shape_mismatch_in_year() {
        let a = Grid::filled((1, 1), 10.0);
        let b = Grid::filled((2, 1), 10.0);
        let mut months = vec![&a; 11];
        months.push(&b);
        assert!(matches!(
            annual_heat_index(&months, 1.0),
            Err(StreamError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn alpha_of_zero_heat_index() {
        let a = alpha_grid(&Grid::zeros((2, 2)));
        assert!(a.iter().all(|&v| v == 0.49239));
    }
}

/// STREAM calibrated parameters.
///
/// Eight coefficients scaling the snow, evapotranspiration, soil and
/// groundwater routines. Defaults are the usual starting values of a
/// monthly STREAM calibration.
use serde::{Deserialize, Serialize};

use super::constants::{ALL_BOUNDS, N_PARAMS, PARAM_BOUNDS, PARAM_NAMES};
use crate::error::{Result, StreamError};
use crate::traits::ModelParams;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Parameters {
    /// Scale factor on the computed annual heat index [-].
    pub heat_coeff: f64,
    /// No snowfall above this temperature [°C].
    pub temp_snow_fall: f64,
    /// No melt below this temperature [°C].
    pub temp_snow_melt: f64,
    /// Degree-month melt factor [mm/°C].
    pub snow_melt_coeff: f64,
    /// Multiplier on the crop factor raster [-].
    pub cropf_coeff: f64,
    /// Multiplier on the water holding capacity raster [-].
    pub whc_coeff: f64,
    /// Share of soil excess going to groundwater [-].
    pub togw: f64,
    /// Share of groundwater released as base flow each month [-].
    pub c: f64,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            heat_coeff: 1.0,
            temp_snow_fall: 2.0,
            temp_snow_melt: 0.0,
            snow_melt_coeff: 15.0,
            cropf_coeff: 1.5,
            whc_coeff: 1.5,
            togw: 0.5,
            c: 0.2,
        }
    }
}

impl Parameters {
    /// Create new Parameters, returning an error if any value is out of bounds.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        heat_coeff: f64,
        temp_snow_fall: f64,
        temp_snow_melt: f64,
        snow_melt_coeff: f64,
        cropf_coeff: f64,
        whc_coeff: f64,
        togw: f64,
        c: f64,
    ) -> Result<Self> {
        let p = Self {
            heat_coeff,
            temp_snow_fall,
            temp_snow_melt,
            snow_melt_coeff,
            cropf_coeff,
            whc_coeff,
            togw,
            c,
        };
        p.validate()?;
        Ok(p)
    }

    /// Check every value against its calibration bounds.
    pub fn validate(&self) -> Result<()> {
        for (i, val) in self.values().into_iter().enumerate() {
            let bounds = ALL_BOUNDS[i];
            if !(bounds.min..=bounds.max).contains(&val) {
                return Err(StreamError::InvalidParameter {
                    name: PARAM_NAMES[i].to_string(),
                    value: val,
                    min: bounds.min,
                    max: bounds.max,
                });
            }
        }
        Ok(())
    }

    fn values(&self) -> [f64; N_PARAMS] {
        [
            self.heat_coeff,
            self.temp_snow_fall,
            self.temp_snow_melt,
            self.snow_melt_coeff,
            self.cropf_coeff,
            self.whc_coeff,
            self.togw,
            self.c,
        ]
    }
}

impl ModelParams for Parameters {
    const N_PARAMS: usize = N_PARAMS;
    const PARAM_NAMES: &'static [&'static str] = PARAM_NAMES;
    const PARAM_BOUNDS: &'static [(f64, f64)] = PARAM_BOUNDS;

    fn from_array(arr: &[f64]) -> Result<Self> {
        if arr.len() != N_PARAMS {
            return Err(StreamError::LengthMismatch {
                expected: N_PARAMS,
                found: arr.len(),
            });
        }
        Self::new(
            arr[0], arr[1], arr[2], arr[3], arr[4], arr[5], arr[6], arr[7],
        )
    }

    fn to_array(&self) -> Vec<f64> {
        self.values().to_vec()
    }
}

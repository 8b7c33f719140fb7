//! STREAM numerical constants and model contract.
//!
//! Centralises the fixed values of the snow, Thornthwaite and
//! Thornthwaite-Mather routines, unit conversions and parameter bounds.

// -- Time and units --

/// Seconds in a model month (30 days).
pub const MONTH_SECONDS: f64 = 2_592_000.0;

/// Months per year, the length of a heat index period.
pub const MONTHS_PER_YEAR: usize = 12;

/// Millimetres of water depth per metre.
pub const MM_PER_M: f64 = 1000.0;

/// Reference day length of Thornthwaite's equation [h].
pub const REFERENCE_DAYLIGHT_HOURS: f64 = 12.0;

/// Months discarded before scoring a simulation.
pub const DEFAULT_WARMUP_MONTHS: usize = 6;

/// Longest possible day [h].
pub const MAX_DAYLIGHT_HOURS: f64 = 24.0;

// -- Thornthwaite potential evapotranspiration --

/// Above this temperature [°C] PET follows the quadratic high-temperature fit.
pub const PET_HIGH_TEMP: f64 = 26.5;

/// Coefficients `(a, b, c)` of `a + b T + c T²` for hot months [mm/month].
pub const PET_HIGH_TEMP_COEFFS: (f64, f64, f64) = (-415.85, 32.24, -0.43);

/// Scale of the unadjusted Thornthwaite equation [mm/month].
pub const PET_SCALE: f64 = 16.0;

/// Exponent of the monthly heat index term `(T / 5)^1.514`.
pub const HEAT_INDEX_EXPONENT: f64 = 1.514;

/// Divisor of the monthly heat index term [°C].
pub const HEAT_INDEX_DIVISOR: f64 = 5.0;

/// Cubic polynomial of the Thornthwaite (1948) exponent, lowest degree first.
pub const ALPHA_COEFFS: [f64; 4] = [0.49239, 0.01792, -0.000_077_177_1, 0.000_000_675];

// -- Model contract constants --

/// Parameter names in canonical order.
pub const PARAM_NAMES: &[&str] = &[
    "heat_coeff",
    "temp_snow_fall",
    "temp_snow_melt",
    "snow_melt_coeff",
    "cropf_coeff",
    "whc_coeff",
    "togw",
    "c",
];

/// Number of parameters.
pub const N_PARAMS: usize = 8;

/// Number of state grids (snow, available water, ground water).
pub const N_STATE_GRIDS: usize = 3;

// -- Parameter bounds --

/// Parameter bounds for calibration.
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

/// Scale factor on the annual heat index [-].
pub const HEAT_COEFF_BOUNDS: Bounds = Bounds { min: 0.1, max: 3.0 };

/// Snowfall threshold temperature [°C].
pub const TEMP_SNOW_FALL_BOUNDS: Bounds = Bounds {
    min: -10.0,
    max: 10.0,
};

/// Melt threshold temperature [°C].
pub const TEMP_SNOW_MELT_BOUNDS: Bounds = Bounds {
    min: -10.0,
    max: 10.0,
};

/// Degree-month melt factor [mm/°C/month].
pub const SNOW_MELT_COEFF_BOUNDS: Bounds = Bounds {
    min: 0.0,
    max: 100.0,
};

/// Crop factor multiplier [-].
pub const CROPF_COEFF_BOUNDS: Bounds = Bounds { min: 0.1, max: 5.0 };

/// Water holding capacity multiplier [-].
pub const WHC_COEFF_BOUNDS: Bounds = Bounds { min: 0.1, max: 5.0 };

/// Share of soil excess recharging groundwater [-].
pub const TOGW_BOUNDS: Bounds = Bounds { min: 0.0, max: 1.0 };

/// Groundwater recession constant [1/month].
pub const C_BOUNDS: Bounds = Bounds { min: 0.0, max: 1.0 };

/// All bounds in parameter order.
pub const ALL_BOUNDS: [&Bounds; N_PARAMS] = [
    &HEAT_COEFF_BOUNDS,
    &TEMP_SNOW_FALL_BOUNDS,
    &TEMP_SNOW_MELT_BOUNDS,
    &SNOW_MELT_COEFF_BOUNDS,
    &CROPF_COEFF_BOUNDS,
    &WHC_COEFF_BOUNDS,
    &TOGW_BOUNDS,
    &C_BOUNDS,
];

/// Parameter bounds as `(min, max)` tuples, in PARAM_NAMES order.
pub const PARAM_BOUNDS: &[(f64, f64)] = &[
    (0.1, 3.0),     // heat_coeff
    (-10.0, 10.0),  // temp_snow_fall
    (-10.0, 10.0),  // temp_snow_melt
    (0.0, 100.0),   // snow_melt_coeff
    (0.1, 5.0),     // cropf_coeff
    (0.1, 5.0),     // whc_coeff
    (0.0, 1.0),     // togw
    (0.0, 1.0),     // c
];

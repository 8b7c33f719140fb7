//! TOML description of a simulation run.
//!
//! ```toml
//! [terrain]
//! dem = "dem.asc"
//! cropf = "cropf.asc"
//! whc = "whc.asc"
//! # resolution = { x = 100.0, y = 100.0 }
//!
//! [climate]
//! precipitation = "prec.csv"
//! temperature = "temp.csv"
//!
//! [parameters]
//! togw = 0.4
//!
//! [simulation]
//! warmup_months = 6
//! # outlet = { row = 12, col = 30 }
//!
//! [observed]
//! path = "gauge.csv"
//! column = "flow"
//!
//! [output]
//! path = "report.csv"
//! ```
//!
//! Relative paths are resolved against the directory of the config file.
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, StreamError};
use crate::forcing::ClimateForcing;
use crate::grid::Grid;
use crate::raster::{self, CellSize};
use crate::report;
use crate::routing::Outlet;
use crate::stream::constants::{DEFAULT_WARMUP_MONTHS, MAX_DAYLIGHT_HOURS};
use crate::stream::{MonthlySimulation, Parameters};
use crate::terrain::{Terrain, TerrainInputs, DEFAULT_NODATA, DEFAULT_WHC_EPSILON};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerrainConfig {
    pub dem: PathBuf,
    pub cropf: PathBuf,
    pub whc: PathBuf,
    pub resolution: Option<CellSize>,
    #[serde(default = "default_nodata")]
    pub nodata: f64,
    #[serde(default = "default_whc_epsilon")]
    pub whc_epsilon: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClimateConfig {
    pub precipitation: PathBuf,
    pub temperature: PathBuf,
    /// Defaults to the first variable of the file.
    pub precipitation_variable: Option<String>,
    pub temperature_variable: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationSection {
    pub daylight_hours: Option<Vec<f64>>,
    pub warmup_months: usize,
    /// Raster of a fixed annual heat index, instead of one per year.
    pub heat_index: Option<PathBuf>,
    pub alpha: Option<PathBuf>,
    pub outlet: Option<Outlet>,
}

impl Default for SimulationSection {
    fn default() -> Self {
        Self {
            daylight_hours: None,
            warmup_months: DEFAULT_WARMUP_MONTHS,
            heat_index: None,
            alpha: None,
            outlet: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ObservedConfig {
    pub path: PathBuf,
    /// Defaults to the last column.
    pub column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub terrain: TerrainConfig,
    pub climate: ClimateConfig,
    #[serde(default)]
    pub parameters: Parameters,
    #[serde(default)]
    pub simulation: SimulationSection,
    pub observed: Option<ObservedConfig>,
    pub output: Option<OutputConfig>,
}

fn default_nodata() -> f64 {
    DEFAULT_NODATA
}

fn default_whc_epsilon() -> f64 {
    DEFAULT_WHC_EPSILON
}

fn resolve(base_dir: &Path, path: &mut PathBuf) {
    if path.is_relative() {
        *path = base_dir.join(&*path);
    }
}

impl SimulationConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            StreamError::InvalidInput(format!("cannot read {}: {e}", path.display()))
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let config = Self::from_toml_str(&content, base_dir)?;
        info!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    /// Parse and validate a configuration, resolving relative paths
    /// against `base_dir`.
    pub fn from_toml_str(content: &str, base_dir: &Path) -> Result<Self> {
        let mut config: Self = toml::from_str(content)?;
        config.resolve_paths(base_dir);
        config.validate()?;
        Ok(config)
    }

    fn resolve_paths(&mut self, base_dir: &Path) {
        resolve(base_dir, &mut self.terrain.dem);
        resolve(base_dir, &mut self.terrain.cropf);
        resolve(base_dir, &mut self.terrain.whc);
        resolve(base_dir, &mut self.climate.precipitation);
        resolve(base_dir, &mut self.climate.temperature);
        if let Some(p) = self.simulation.heat_index.as_mut() {
            resolve(base_dir, p);
        }
        if let Some(p) = self.simulation.alpha.as_mut() {
            resolve(base_dir, p);
        }
        if let Some(obs) = self.observed.as_mut() {
            resolve(base_dir, &mut obs.path);
        }
        if let Some(out) = self.output.as_mut() {
            resolve(base_dir, &mut out.path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.parameters.validate()?;
        if let Some(res) = self.terrain.resolution {
            CellSize::new(res.x, res.y)?;
        }
        if let Some(hours) = &self.simulation.daylight_hours {
            if hours.is_empty() || hours.iter().any(|h| !(0.0..=MAX_DAYLIGHT_HOURS).contains(h)) {
                return Err(StreamError::InvalidInput(format!(
                    "daylight_hours must be a non-empty list of values in [0, {MAX_DAYLIGHT_HOURS}]"
                )));
            }
        }
        if self.simulation.alpha.is_some() && self.simulation.heat_index.is_none() {
            return Err(StreamError::InvalidInput(
                "alpha can only be given together with heat_index".to_string(),
            ));
        }
        Ok(())
    }

    pub fn load_terrain(&self) -> Result<Terrain> {
        let t = &self.terrain;
        let mut inputs = TerrainInputs::new(t.dem.clone(), t.cropf.clone(), t.whc.clone())
            .with_nodata(t.nodata)
            .with_whc_epsilon(t.whc_epsilon);
        if let Some(res) = t.resolution {
            inputs = inputs.with_resolution(res);
        }
        Terrain::load(inputs)
    }

    pub fn load_forcing(&self) -> Result<ClimateForcing> {
        let c = &self.climate;
        ClimateForcing::load(
            c.precipitation.clone(),
            c.precipitation_variable.as_deref(),
            c.temperature.clone(),
            c.temperature_variable.as_deref(),
        )
    }

    /// Fixed heat index and alpha rasters, when configured.
    pub fn load_heat_inputs(&self) -> Result<(Option<Grid>, Option<Grid>)> {
        let read = |p: &Option<PathBuf>| -> Result<Option<Grid>> {
            p.as_ref()
                .map(|p| raster::read_ascii_grid(p).map(|r| r.grid))
                .transpose()
        };
        Ok((read(&self.simulation.heat_index)?, read(&self.simulation.alpha)?))
    }

    /// Load every input and assemble the simulation.
    pub fn build_simulation(&self) -> Result<MonthlySimulation> {
        let terrain = self.load_terrain()?;
        let forcing = self.load_forcing()?;
        let months = forcing.num_months();
        if self.simulation.warmup_months >= months {
            return Err(StreamError::InvalidInput(format!(
                "warmup_months = {} leaves nothing of {months} simulated months",
                self.simulation.warmup_months
            )));
        }
        let mut sim = MonthlySimulation::new(terrain, forcing, self.parameters)?;
        if let Some(hours) = &self.simulation.daylight_hours {
            sim = sim.with_daylight_hours(hours.clone())?;
        }
        if let Some(outlet) = self.simulation.outlet {
            sim = sim.with_outlet(outlet)?;
        }
        Ok(sim)
    }

    /// Observed discharge [m³/s], when configured.
    pub fn observed(&self) -> Result<Option<Vec<f64>>> {
        self.observed
            .as_ref()
            .map(|o| report::read_series_csv(&o.path, o.column.as_deref()))
            .transpose()
    }

    pub fn warmup_months(&self) -> usize {
        self.simulation.warmup_months
    }

    pub fn output_path(&self) -> Option<&Path> {
        self.output.as_ref().map(|o| o.path.as_path())
    }
}

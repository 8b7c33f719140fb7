use std::fmt::Write as _;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use pystream_core::config::SimulationConfig;
use pystream_core::metrics::Metric;
use pystream_core::report::{self, Summary};

/// Simulate the configured basin, write the report and return the summary.
pub fn run(config_path: &Path, output: Option<&Path>) -> Result<String> {
    let config = SimulationConfig::from_file(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let mut sim = config
        .build_simulation()
        .context("failed to prepare the simulation")?;
    let (heat_index, alpha) = config
        .load_heat_inputs()
        .context("failed to read the heat index rasters")?;
    let observed = config
        .observed()
        .context("failed to read the observed discharge")?;

    let series = sim
        .simulate(heat_index.as_ref(), alpha.as_ref())
        .context("simulation failed")?;

    if let Some(path) = output.or(config.output_path()) {
        report::write_report_csv(path, &series, observed.as_deref())
            .with_context(|| format!("failed to write {}", path.display()))?;
        info!(path = %path.display(), "wrote report");
    }

    let summary = Summary::new(&series, observed.as_deref(), config.warmup_months())?;
    Ok(summary.to_string())
}

/// Load every input of a configuration and describe it.
pub fn check(config_path: &Path) -> Result<String> {
    let config = SimulationConfig::from_file(config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;
    let sim = config
        .build_simulation()
        .context("inputs are inconsistent")?;
    let (heat_index, alpha) = config
        .load_heat_inputs()
        .context("failed to read the heat index rasters")?;

    let terrain = sim.terrain();
    let shape = terrain.shape();
    for (name, grid) in [("heat index", &heat_index), ("alpha", &alpha)] {
        if let Some(g) = grid {
            g.ensure_shape(name, shape)?;
        }
    }
    if heat_index.is_none() && sim.num_months() % 12 != 0 {
        bail!(
            "{} months is not a whole number of years; give a heat index raster",
            sim.num_months()
        );
    }

    let mut out = String::new();
    let valid = terrain.valid_mask().iter().filter(|&&v| v).count();
    let res = terrain.cell_size();
    writeln!(out, "grid:        {} x {} cells ({valid} valid)", shape.0, shape.1)?;
    writeln!(out, "resolution:  {} x {}", res.x, res.y)?;
    writeln!(out, "months:      {}", sim.num_months())?;
    writeln!(out, "variables:   {} / {}", sim.forcing().precip_name(), sim.forcing().temp_name())?;
    write!(
        out,
        "heat index:  {}",
        if heat_index.is_some() { "fixed raster" } else { "computed per year" }
    )?;
    if let Some(obs) = config.observed().context("failed to read the observed discharge")? {
        if obs.len() != sim.num_months() {
            bail!(
                "observed series has {} values for {} simulated months",
                obs.len(),
                sim.num_months()
            );
        }
        write!(out, "\nobserved:    {} values", obs.len())?;
    }
    Ok(out)
}

/// Score two discharge series read from CSV files.
pub fn score(
    simulated: &Path,
    simulated_column: Option<&str>,
    observed: &Path,
    observed_column: Option<&str>,
    warmup: usize,
    metric: &str,
) -> Result<String> {
    let metric: Metric = metric.parse()?;
    let sim = match simulated_column {
        Some(c) => report::read_series_csv(simulated, Some(c)),
        None => report::read_series_csv(simulated, Some("gauge_flow"))
            .or_else(|_| report::read_series_csv(simulated, None)),
    }
    .with_context(|| format!("failed to read {}", simulated.display()))?;
    let obs = report::read_series_csv(observed, observed_column)
        .with_context(|| format!("failed to read {}", observed.display()))?;

    if sim.len() != obs.len() {
        bail!(
            "simulated series has {} values, observed has {}",
            sim.len(),
            obs.len()
        );
    }
    if warmup >= sim.len() {
        bail!("{warmup} warm-up months leave nothing of {} values to score", sim.len());
    }

    let value = metric.evaluate(&obs[warmup..], &sim[warmup..])?;
    Ok(format!("{metric} (excluding {warmup} warm-up months): {value:.4}"))
}

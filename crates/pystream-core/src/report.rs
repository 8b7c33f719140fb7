//! Discharge series I/O and run summaries.
use std::fmt;
use std::path::Path;

use tracing::debug;

use crate::error::{Result, StreamError};
use crate::metrics;
use crate::stream::constants::MONTHS_PER_YEAR;
use crate::stream::fluxes::FluxesTimeseries;

/// Read one numeric column of a CSV file with a header row.
///
/// Without `column`, the last column is read. Empty cells are rejected.
pub fn read_series_csv(path: impl AsRef<Path>, column: Option<&str>) -> Result<Vec<f64>> {
    let path = path.as_ref();
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)?;
    let headers = rdr.headers()?.clone();
    let idx = match column {
        Some(name) => headers.iter().position(|h| h == name).ok_or_else(|| {
            StreamError::UnknownVariable {
                name: name.to_string(),
                available: headers.iter().map(str::to_string).collect(),
            }
        })?,
        None => headers.len().checked_sub(1).ok_or_else(|| {
            StreamError::InvalidInput(format!("{} has no columns", path.display()))
        })?,
    };

    let mut values = Vec::new();
    for (i, record) in rdr.records().enumerate() {
        let record = record?;
        let field = record.get(idx).unwrap_or_default();
        let v: f64 = field.parse().map_err(|_| {
            StreamError::InvalidInput(format!(
                "{}: row {} column `{}`: `{field}` is not a number",
                path.display(),
                i + 1,
                &headers[idx]
            ))
        })?;
        values.push(v);
    }
    debug!(path = %path.display(), column = &headers[idx], len = values.len(), "read series");
    Ok(values)
}

/// Write every flux of a simulation, one row per month.
///
/// Columns: `month` (0-based), `month_of_year` (1..=12), the flux fields in
/// declaration order, then `observed` when given.
pub fn write_report_csv(
    path: impl AsRef<Path>,
    series: &FluxesTimeseries,
    observed: Option<&[f64]>,
) -> Result<()> {
    if let Some(obs) = observed {
        if obs.len() != series.len() {
            return Err(StreamError::LengthMismatch {
                expected: series.len(),
                found: obs.len(),
            });
        }
    }

    let columns = series.columns();
    let mut wtr = csv::Writer::from_path(path.as_ref())?;
    let mut header = vec!["month", "month_of_year"];
    header.extend(columns.iter().map(|(name, _)| *name));
    if observed.is_some() {
        header.push("observed");
    }
    wtr.write_record(&header)?;

    for t in 0..series.len() {
        let mut record = vec![t.to_string(), (t % MONTHS_PER_YEAR + 1).to_string()];
        record.extend(columns.iter().map(|(_, values)| values[t].to_string()));
        if let Some(obs) = observed {
            record.push(obs[t].to_string());
        }
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Headline numbers of a simulation.
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub months: usize,
    pub warmup_months: usize,
    pub mean_gauge_flow: f64,
    pub peak_gauge_flow: f64,
    /// Nash-Sutcliffe efficiency after the warm-up, when observations exist.
    pub nash_sutcliffe: Option<f64>,
}

impl Summary {
    pub fn new(
        series: &FluxesTimeseries,
        observed: Option<&[f64]>,
        warmup_months: usize,
    ) -> Result<Self> {
        let flow = &series.gauge_flow;
        let nash_sutcliffe = match observed {
            Some(obs) => Some(metrics::nash_sutcliffe(flow, obs, warmup_months)?),
            None => None,
        };
        let mean_gauge_flow = if flow.is_empty() {
            f64::NAN
        } else {
            flow.iter().sum::<f64>() / flow.len() as f64
        };
        Ok(Self {
            months: series.len(),
            warmup_months,
            mean_gauge_flow,
            peak_gauge_flow: flow.iter().copied().fold(f64::NAN, f64::max),
            nash_sutcliffe,
        })
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "months simulated: {}", self.months)?;
        writeln!(f, "mean gauge flow:  {:.4} m^3/s", self.mean_gauge_flow)?;
        write!(f, "peak gauge flow:  {:.4} m^3/s", self.peak_gauge_flow)?;
        if let Some(ns) = self.nash_sutcliffe {
            write!(f, "\nNash-Sutcliffe")?;
            if self.warmup_months > 0 {
                write!(f, " (excluding {} warm-up months)", self.warmup_months)?;
            }
            write!(f, ": {ns:.4}")?;
        }
        Ok(())
    }
}

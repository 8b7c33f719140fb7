//! Gridded monthly climate forcing.
//!
//! A [`ClimateDataset`] holds one or more named variables, each a sequence of
//! grids (one per month). On disk a dataset is a CSV file in long format:
//!
//! ```text
//! time,row,col,prec
//! 0,0,0,81.5
//! 0,0,1,79.0
//! ...
//! ```
//!
//! Every `(time, row, col)` triple must appear exactly once.
use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Result, StreamError};
use crate::grid::{Grid, Shape};

const INDEX_COLUMNS: [&str; 3] = ["time", "row", "col"];

/// Named variables over a common `(time, row, col)` domain.
#[derive(Debug, Clone)]
pub struct ClimateDataset {
    shape: Shape,
    n_times: usize,
    variables: Vec<(String, Vec<Grid>)>,
}

/// One variable of a dataset.
#[derive(Debug, Clone)]
pub struct ClimateSeries {
    pub name: String,
    pub frames: Vec<Grid>,
}

impl ClimateDataset {
    /// Build a dataset from named frame sequences.
    ///
    /// All variables must have the same number of frames and every frame the
    /// same shape.
    pub fn new(variables: Vec<(String, Vec<Grid>)>) -> Result<Self> {
        let (shape, n_times) = match variables.first() {
            Some((name, frames)) => match frames.first() {
                Some(g) => (g.shape(), frames.len()),
                None => {
                    return Err(StreamError::InvalidInput(format!(
                        "variable `{name}` has no time steps"
                    )))
                }
            },
            None => {
                return Err(StreamError::InvalidInput(
                    "climate dataset has no variables".to_string(),
                ))
            }
        };
        for (name, frames) in &variables {
            if frames.len() != n_times {
                return Err(StreamError::InvalidInput(format!(
                    "variable `{name}` has {} time steps, expected {n_times}",
                    frames.len()
                )));
            }
            for (t, frame) in frames.iter().enumerate() {
                frame.ensure_shape(&format!("`{name}` at time {t}"), shape)?;
            }
        }
        Ok(Self {
            shape,
            n_times,
            variables,
        })
    }

    /// Dataset with a single variable.
    pub fn single(name: impl Into<String>, frames: Vec<Grid>) -> Result<Self> {
        Self::new(vec![(name.into(), frames)])
    }

    /// Parse the long CSV format from any reader.
    pub fn from_reader<R: std::io::Read>(reader: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();
        if headers.len() <= INDEX_COLUMNS.len()
            || headers.iter().take(3).ne(INDEX_COLUMNS.iter().copied())
        {
            return Err(StreamError::InvalidInput(format!(
                "climate CSV header must start with `time,row,col` followed by \
                 at least one variable, got `{}`",
                headers.iter().collect::<Vec<_>>().join(",")
            )));
        }
        let names: Vec<String> = headers.iter().skip(3).map(str::to_string).collect();

        let mut records: Vec<(usize, usize, usize, Vec<f64>)> = Vec::new();
        let (mut n_times, mut rows, mut cols) = (0, 0, 0);
        for (i, record) in rdr.records().enumerate() {
            let record = record?;
            let line = i + 2;
            let index = |k: usize| -> Result<usize> {
                record.get(k).and_then(|s| s.parse().ok()).ok_or_else(|| {
                    StreamError::InvalidInput(format!(
                        "line {line}: `{}` must be a non-negative integer",
                        INDEX_COLUMNS[k]
                    ))
                })
            };
            let (t, r, c) = (index(0)?, index(1)?, index(2)?);
            let values = record
                .iter()
                .skip(3)
                .map(|s| {
                    s.parse::<f64>().map_err(|_| {
                        StreamError::InvalidInput(format!("line {line}: invalid value `{s}`"))
                    })
                })
                .collect::<Result<Vec<f64>>>()?;
            n_times = n_times.max(t.saturating_add(1));
            rows = rows.max(r.saturating_add(1));
            cols = cols.max(c.saturating_add(1));
            records.push((t, r, c, values));
        }

        let expected = n_times
            .checked_mul(rows)
            .and_then(|n| n.checked_mul(cols))
            .ok_or_else(|| {
                StreamError::InvalidInput(format!(
                    "climate CSV indices span {n_times} x {rows} x {cols} cells, too many to store"
                ))
            })?;
        if expected == 0 || records.len() != expected {
            return Err(StreamError::InvalidInput(format!(
                "climate CSV must list every (time, row, col) once: found {} records \
                 for {n_times} x {rows} x {cols}",
                records.len()
            )));
        }

        let mut data = vec![vec![f64::NAN; expected]; names.len()];
        let mut seen = vec![false; expected];
        for (t, r, c, values) in records {
            let flat = (t * rows + r) * cols + c;
            if std::mem::replace(&mut seen[flat], true) {
                return Err(StreamError::InvalidInput(format!(
                    "duplicate record for time {t}, row {r}, col {c}"
                )));
            }
            for (var, v) in values.into_iter().enumerate() {
                data[var][flat] = v;
            }
        }

        let frame_len = rows * cols;
        let variables = names
            .into_iter()
            .zip(data)
            .map(|(name, values)| {
                let frames = values
                    .chunks(frame_len)
                    .map(|chunk| Grid::new(rows, cols, chunk.to_vec()))
                    .collect::<Result<Vec<Grid>>>()?;
                Ok((name, frames))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::new(variables)
    }

    /// Read the long CSV format from a file.
    pub fn from_csv(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let ds = Self::from_reader(file)?;
        debug!(
            path = %path.display(),
            variables = ?ds.variable_names(),
            months = ds.n_times,
            shape = ?ds.shape,
            "read climate dataset"
        );
        Ok(ds)
    }

    /// Write the long CSV format.
    pub fn to_csv(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)?;
        let mut header: Vec<&str> = INDEX_COLUMNS.to_vec();
        header.extend(self.variables.iter().map(|(n, _)| n.as_str()));
        wtr.write_record(&header)?;
        let (rows, cols) = self.shape;
        for t in 0..self.n_times {
            for r in 0..rows {
                for c in 0..cols {
                    let mut record = vec![t.to_string(), r.to_string(), c.to_string()];
                    for (_, frames) in &self.variables {
                        record.push(frames[t][(r, c)].to_string());
                    }
                    wtr.write_record(&record)?;
                }
            }
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn n_times(&self) -> usize {
        self.n_times
    }

    pub fn variable_names(&self) -> Vec<String> {
        self.variables.iter().map(|(n, _)| n.clone()).collect()
    }

    /// Pick a variable by name, or the first one when `name` is `None`.
    pub fn select(&self, name: Option<&str>) -> Result<ClimateSeries> {
        let found = match name {
            None => self.variables.first(),
            Some(n) => self.variables.iter().find(|(v, _)| v == n),
        };
        match found {
            Some((n, frames)) => Ok(ClimateSeries {
                name: n.clone(),
                frames: frames.clone(),
            }),
            None => Err(StreamError::UnknownVariable {
                name: name.unwrap_or_default().to_string(),
                available: self.variable_names(),
            }),
        }
    }

    /// Dataset restricted to the time steps in `range`.
    pub fn slice_time(&self, range: Range<usize>) -> Result<Self> {
        if range.start >= range.end || range.end > self.n_times {
            return Err(StreamError::InvalidInput(format!(
                "time slice {range:?} is outside 0..{}",
                self.n_times
            )));
        }
        let variables = self
            .variables
            .iter()
            .map(|(n, frames)| (n.clone(), frames[range.clone()].to_vec()))
            .collect();
        Self::new(variables)
    }
}

/// Where a climate dataset comes from.
#[derive(Debug, Clone)]
pub enum ClimateSource {
    Path(PathBuf),
    Dataset(ClimateDataset),
}

impl ClimateSource {
    /// Load the dataset and pick `varname` (first variable by default).
    pub fn resolve(self, varname: Option<&str>) -> Result<ClimateSeries> {
        match self {
            ClimateSource::Path(p) => ClimateDataset::from_csv(p)?.select(varname),
            ClimateSource::Dataset(ds) => ds.select(varname),
        }
    }
}

impl From<ClimateDataset> for ClimateSource {
    fn from(ds: ClimateDataset) -> Self {
        ClimateSource::Dataset(ds)
    }
}

impl From<PathBuf> for ClimateSource {
    fn from(p: PathBuf) -> Self {
        ClimateSource::Path(p)
    }
}

/// Validated precipitation [mm/month] and temperature [°C] series.
#[derive(Debug, Clone)]
pub struct ClimateForcing {
    precip: ClimateSeries,
    temp: ClimateSeries,
}

impl ClimateForcing {
    /// Both series must cover the same months on the same grid.
    pub fn new(precip: ClimateSeries, temp: ClimateSeries) -> Result<Self> {
        if precip.frames.len() != temp.frames.len() {
            return Err(StreamError::TimeMismatch {
                precipitation: precip.frames.len(),
                temperature: temp.frames.len(),
            });
        }
        if precip.frames.is_empty() {
            return Err(StreamError::InvalidInput("climate series are empty".to_string()));
        }
        let shape = precip.frames[0].shape();
        for (t, frame) in temp.frames.iter().enumerate() {
            frame.ensure_shape(&format!("temperature at month {t}"), shape)?;
        }
        Ok(Self { precip, temp })
    }

    /// Load both datasets and select their variables.
    pub fn load(
        precip: impl Into<ClimateSource>,
        precip_var: Option<&str>,
        temp: impl Into<ClimateSource>,
        temp_var: Option<&str>,
    ) -> Result<Self> {
        Self::new(
            precip.into().resolve(precip_var)?,
            temp.into().resolve(temp_var)?,
        )
    }

    pub fn num_months(&self) -> usize {
        self.precip.frames.len()
    }

    pub fn shape(&self) -> Shape {
        self.precip.frames[0].shape()
    }

    pub fn precip_name(&self) -> &str {
        &self.precip.name
    }

    pub fn temp_name(&self) -> &str {
        &self.temp.name
    }

    pub fn precip(&self, month: usize) -> &Grid {
        &self.precip.frames[month]
    }

    pub fn temp(&self, month: usize) -> &Grid {
        &self.temp.frames[month]
    }

    /// Temperature grids of months `range`.
    pub fn temp_frames(&self, range: Range<usize>) -> &[Grid] {
        &self.temp.frames[range]
    }
}

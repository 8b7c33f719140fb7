//! ESRI ASCII grid reading and writing.
//!
//! ```text
//! ncols        4
//! nrows        3
//! xllcorner    6.00
//! yllcorner    46.00
//! cellsize     0.05
//! NODATA_value -9999
//! 412 405 398 390
//! ...
//! ```
//!
//! `dx`/`dy` may replace `cellsize` for non-square cells. Header keys are
//! case-insensitive. Rows are listed from north to south.
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StreamError};
use crate::grid::Grid;

/// Cell dimensions in map units, `(x, y)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CellSize {
    pub x: f64,
    pub y: f64,
}

impl CellSize {
    pub fn new(x: f64, y: f64) -> Result<Self> {
        if !(x > 0.0 && y > 0.0) || !x.is_finite() || !y.is_finite() {
            return Err(StreamError::InvalidInput(format!(
                "cell size must be positive and finite, got ({x}, {y})"
            )));
        }
        Ok(Self { x, y })
    }

    pub fn square(size: f64) -> Result<Self> {
        Self::new(size, size)
    }

    /// Cell area in squared map units.
    pub fn area(&self) -> f64 {
        self.x * self.y
    }
}

/// Georeferencing information of a raster.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterMeta {
    pub cell_size: CellSize,
    pub xll: f64,
    pub yll: f64,
    pub nodata: Option<f64>,
}

impl RasterMeta {
    pub fn new(cell_size: CellSize) -> Self {
        Self {
            cell_size,
            xll: 0.0,
            yll: 0.0,
            nodata: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    pub grid: Grid,
    pub meta: RasterMeta,
}

#[derive(Default)]
struct Header {
    ncols: Option<usize>,
    nrows: Option<usize>,
    xll: Option<f64>,
    yll: Option<f64>,
    cellsize: Option<f64>,
    dx: Option<f64>,
    dy: Option<f64>,
    nodata: Option<f64>,
}

fn header_error(line: usize, message: String) -> StreamError {
    StreamError::Raster {
        path: None,
        line: Some(line),
        message,
    }
}

const HEADER_KEYS: [&str; 10] = [
    "ncols",
    "nrows",
    "xllcorner",
    "xllcenter",
    "yllcorner",
    "yllcenter",
    "cellsize",
    "dx",
    "dy",
    "nodata_value",
];

/// Upper bound on the buffer reserved from the header alone.
const MAX_PREALLOCATED_CELLS: usize = 1 << 24;

/// Parse the text of an ASCII grid.
pub fn parse_ascii_grid(text: &str) -> Result<Raster> {
    let mut header = Header::default();
    let mut lines = text.lines().enumerate().peekable();

    // Header lines start with a known keyword; anything else starts the data,
    // including rows beginning with `nan` or `inf`.
    while let Some(&(idx, line)) = lines.peek() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            lines.next();
            continue;
        }
        let mut parts = trimmed.split_whitespace();
        let key = match parts.next().map(str::to_ascii_lowercase) {
            Some(k) if HEADER_KEYS.contains(&k.as_str()) => k,
            _ => break,
        };
        let value = parts
            .next()
            .ok_or_else(|| header_error(idx + 1, format!("missing value for `{key}`")))?;
        let number: f64 = value
            .parse()
            .map_err(|_| header_error(idx + 1, format!("invalid value `{value}` for `{key}`")))?;
        match key.as_str() {
            "ncols" | "nrows" => {
                if number < 1.0 || number.fract() != 0.0 {
                    return Err(header_error(
                        idx + 1,
                        format!("`{key}` must be a positive integer, got {value}"),
                    ));
                }
                if key == "ncols" {
                    header.ncols = Some(number as usize);
                } else {
                    header.nrows = Some(number as usize);
                }
            }
            "xllcorner" | "xllcenter" => header.xll = Some(number),
            "yllcorner" | "yllcenter" => header.yll = Some(number),
            "cellsize" => header.cellsize = Some(number),
            "dx" => header.dx = Some(number),
            "dy" => header.dy = Some(number),
            _ => header.nodata = Some(number),
        }
        lines.next();
    }

    let ncols = header
        .ncols
        .ok_or_else(|| StreamError::raster("missing `ncols` header"))?;
    let nrows = header
        .nrows
        .ok_or_else(|| StreamError::raster("missing `nrows` header"))?;
    let cell_size = match (header.cellsize, header.dx, header.dy) {
        (Some(size), _, _) => CellSize::square(size),
        (None, Some(dx), Some(dy)) => CellSize::new(dx, dy),
        _ => Err(StreamError::raster("missing `cellsize` (or `dx`/`dy`) header")),
    }?;

    let n_cells = ncols.checked_mul(nrows).ok_or_else(|| {
        StreamError::raster(format!("{nrows} x {ncols} cells do not fit in memory"))
    })?;

    let mut data = Vec::with_capacity(n_cells.min(MAX_PREALLOCATED_CELLS));
    for (idx, line) in lines {
        for token in line.split_whitespace() {
            let v: f64 = token
                .parse()
                .map_err(|_| header_error(idx + 1, format!("invalid cell value `{token}`")))?;
            data.push(v);
        }
    }
    if data.len() != n_cells {
        return Err(StreamError::raster(format!(
            "expected {n_cells} cell values ({nrows} x {ncols}), found {}",
            data.len()
        )));
    }

    Ok(Raster {
        grid: Grid::new(nrows, ncols, data)?,
        meta: RasterMeta {
            cell_size,
            xll: header.xll.unwrap_or(0.0),
            yll: header.yll.unwrap_or(0.0),
            nodata: header.nodata,
        },
    })
}

/// Read an ASCII grid from disk.
pub fn read_ascii_grid(path: impl AsRef<Path>) -> Result<Raster> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    parse_ascii_grid(&text).map_err(|e| e.with_path(path))
}

/// Render a grid as ASCII grid text.
pub fn format_ascii_grid(grid: &Grid, meta: &RasterMeta) -> String {
    let mut out = String::with_capacity(grid.len() * 8 + 128);
    // Writing into a String cannot fail.
    let _ = writeln!(out, "ncols {}", grid.cols());
    let _ = writeln!(out, "nrows {}", grid.rows());
    let _ = writeln!(out, "xllcorner {}", meta.xll);
    let _ = writeln!(out, "yllcorner {}", meta.yll);
    if meta.cell_size.x == meta.cell_size.y {
        let _ = writeln!(out, "cellsize {}", meta.cell_size.x);
    } else {
        let _ = writeln!(out, "dx {}", meta.cell_size.x);
        let _ = writeln!(out, "dy {}", meta.cell_size.y);
    }
    if let Some(nodata) = meta.nodata {
        let _ = writeln!(out, "NODATA_value {nodata}");
    }
    for row in grid.as_slice().chunks(grid.cols()) {
        let line: Vec<String> = row.iter().map(|v| v.to_string()).collect();
        out.push_str(&line.join(" "));
        out.push('\n');
    }
    out
}

/// Write a grid to disk as an ASCII grid.
pub fn write_ascii_grid(path: impl AsRef<Path>, grid: &Grid, meta: &RasterMeta) -> Result<()> {
    fs::write(path, format_ascii_grid(grid, meta))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEM: &str = "ncols 3\nnrows 2\nxllcorner 6.0\nyllcorner 46.0\ncellsize 0.05\n\
                       NODATA_value -9999\n10 9 8\n7 6 -9999\n";

    #[test]
    fn parses_header_and_values() {
        let r = parse_ascii_grid(DEM).unwrap();
        assert_eq!(r.grid.shape(), (2, 3));
        assert_eq!(r.grid[(1, 2)], -9999.0);
        assert_eq!(r.meta.cell_size, CellSize { x: 0.05, y: 0.05 });
        assert_eq!(r.meta.nodata, Some(-9999.0));
        assert_eq!(r.meta.xll, 6.0);
    }

    #[test]
    fn accepts_dx_dy_and_mixed_case() {
        let text = "NCOLS 2\nNROWS 1\nDX 30\nDY 20\n1 2\n";
        let r = parse_ascii_grid(text).unwrap();
        assert_eq!(r.meta.cell_size, CellSize { x: 30.0, y: 20.0 });
        assert_eq!(r.meta.nodata, None);
        assert_eq!(r.meta.cell_size.area(), 600.0);
    }

    #[test]
    fn rejects_wrong_value_count() {
        let text = "ncols 2\nnrows 2\ncellsize 1\n1 2 3\n";
        let err = parse_ascii_grid(text).unwrap_err();
        assert!(err.to_string().contains("expected 4 cell values"));
    }

    #[test]
    fn reports_line_of_bad_value() {
        let text = "ncols 2\nnrows 1\ncellsize 1\n1 x\n";
        let err = parse_ascii_grid(text).unwrap_err();
        assert!(matches!(err, StreamError::Raster { line: Some(4), .. }));
    }

    #[test]
    fn oversized_header_is_an_error() {
        let text = "ncols 5000000000\nnrows 5000000000\ncellsize 1\n1 2\n";
        assert!(matches!(parse_ascii_grid(text), Err(StreamError::Raster { .. })));
        let text = "ncols 100000\nnrows 100000\ncellsize 1\n1 2\n";
        let err = parse_ascii_grid(text).unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn data_rows_may_start_with_nan_or_inf() {
        let text = "ncols 2\nnrows 2\ncellsize 1\nnan 1\ninf -inf\n";
        let r = parse_ascii_grid(text).unwrap();
        assert!(r.grid[(0, 0)].is_nan());
        assert_eq!(r.grid[(1, 0)], f64::INFINITY);
        assert_eq!(r.grid[(1, 1)], f64::NEG_INFINITY);
    }

    #[test]
    fn unknown_header_key_is_rejected() {
        let err = parse_ascii_grid("ncols 1\nnrows 1\ncellsize 1\nbogus 3\n5\n").unwrap_err();
        assert!(matches!(err, StreamError::Raster { line: Some(4), .. }));
    }

    #[test]
    fn rejects_missing_cellsize() {
        assert!(parse_ascii_grid("ncols 1\nnrows 1\n5\n").is_err());
    }

    #[test]
    fn format_then_parse_preserves_grid() {
        let r = parse_ascii_grid(DEM).unwrap();
        let text = format_ascii_grid(&r.grid, &r.meta);
        assert_eq!(parse_ascii_grid(&text).unwrap(), r);
    }

    #[test]
    fn read_attaches_path_to_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.asc");
        std::fs::write(&path, "ncols 1\n").unwrap();
        let err = read_ascii_grid(&path).unwrap_err();
        assert!(err.to_string().contains("broken.asc"));
    }
}

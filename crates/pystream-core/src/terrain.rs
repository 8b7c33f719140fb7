//! Static terrain inputs: elevation, crop factor and water holding capacity.
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::error::{Result, StreamError};
use crate::grid::{Grid, Shape};
use crate::raster::{self, CellSize};

/// Default nodata value assumed for in-memory elevation grids.
pub const DEFAULT_NODATA: f64 = -9999.0;

/// Replacement for non-positive water holding capacity cells [mm].
pub const DEFAULT_WHC_EPSILON: f64 = 0.01;

/// Where a terrain raster comes from.
#[derive(Debug, Clone)]
pub enum RasterSource {
    /// ASCII grid on disk; also provides the cell size.
    Path(PathBuf),
    /// Grid already in memory.
    Grid(Grid),
}

impl From<Grid> for RasterSource {
    fn from(g: Grid) -> Self {
        RasterSource::Grid(g)
    }
}

impl From<PathBuf> for RasterSource {
    fn from(p: PathBuf) -> Self {
        RasterSource::Path(p)
    }
}

impl From<&std::path::Path> for RasterSource {
    fn from(p: &std::path::Path) -> Self {
        RasterSource::Path(p.to_path_buf())
    }
}

/// Inputs needed to assemble a [`Terrain`].
#[derive(Debug, Clone)]
pub struct TerrainInputs {
    pub dem: RasterSource,
    pub cropf: RasterSource,
    pub whc: RasterSource,
    /// Takes precedence over any cell size read from files.
    pub resolution: Option<CellSize>,
    /// Nodata marker of an in-memory DEM.
    pub nodata: f64,
    pub whc_epsilon: f64,
}

impl TerrainInputs {
    pub fn new(
        dem: impl Into<RasterSource>,
        cropf: impl Into<RasterSource>,
        whc: impl Into<RasterSource>,
    ) -> Self {
        Self {
            dem: dem.into(),
            cropf: cropf.into(),
            whc: whc.into(),
            resolution: None,
            nodata: DEFAULT_NODATA,
            whc_epsilon: DEFAULT_WHC_EPSILON,
        }
    }

    pub fn with_resolution(mut self, resolution: CellSize) -> Self {
        self.resolution = Some(resolution);
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = nodata;
        self
    }

    pub fn with_whc_epsilon(mut self, epsilon: f64) -> Self {
        self.whc_epsilon = epsilon;
        self
    }
}

/// Aligned terrain rasters of a basin.
#[derive(Debug, Clone)]
pub struct Terrain {
    dem: Grid,
    dem_nodata: Option<f64>,
    cropf: Grid,
    whc: Grid,
    cell_size: CellSize,
}

struct Loaded {
    grid: Grid,
    cell_size: Option<CellSize>,
    nodata: Option<f64>,
}

fn load(source: RasterSource) -> Result<Loaded> {
    match source {
        RasterSource::Path(path) => {
            let r = raster::read_ascii_grid(&path)?;
            debug!(path = %path.display(), shape = ?r.grid.shape(), "read raster");
            Ok(Loaded {
                grid: r.grid,
                cell_size: Some(r.meta.cell_size),
                nodata: r.meta.nodata,
            })
        }
        RasterSource::Grid(grid) => Ok(Loaded {
            grid,
            cell_size: None,
            nodata: None,
        }),
    }
}

impl Terrain {
    /// Load and validate the terrain rasters.
    ///
    /// The cell size is the explicit `resolution` if given, otherwise the one
    /// of the last raster read from a file (dem, cropf, whc order). All rasters
    /// must share the DEM's shape. WHC cells `<= 0` become `whc_epsilon`.
    pub fn load(inputs: TerrainInputs) -> Result<Self> {
        let dem_is_file = matches!(inputs.dem, RasterSource::Path(_));
        let dem = load(inputs.dem)?;
        let cropf = load(inputs.cropf)?;
        let whc = load(inputs.whc)?;

        let cell_size = match inputs.resolution {
            Some(res) => res,
            None => whc
                .cell_size
                .or(cropf.cell_size)
                .or(dem.cell_size)
                .ok_or(StreamError::MissingResolution)?,
        };

        let dem_nodata = if dem_is_file {
            dem.nodata
        } else {
            Some(inputs.nodata)
        };

        Self::from_grids(dem.grid, dem_nodata, cropf.grid, whc.grid, cell_size, inputs.whc_epsilon)
    }

    /// Assemble terrain from grids already in memory.
    pub fn from_grids(
        dem: Grid,
        dem_nodata: Option<f64>,
        cropf: Grid,
        mut whc: Grid,
        cell_size: CellSize,
        whc_epsilon: f64,
    ) -> Result<Self> {
        if !(whc_epsilon > 0.0) {
            return Err(StreamError::InvalidInput(format!(
                "whc_epsilon must be strictly positive, got {whc_epsilon}"
            )));
        }
        let shape = dem.shape();
        cropf.ensure_shape("crop factor raster", shape)?;
        whc.ensure_shape("water holding capacity raster", shape)?;

        let mut clamped = 0usize;
        for v in whc.as_mut_slice() {
            if *v <= 0.0 {
                *v = whc_epsilon;
                clamped += 1;
            }
        }
        if clamped > 0 {
            warn!(cells = clamped, whc_epsilon, "non-positive water holding capacity replaced");
        }

        Ok(Self {
            dem,
            dem_nodata,
            cropf,
            whc,
            cell_size,
        })
    }

    pub fn shape(&self) -> Shape {
        self.dem.shape()
    }

    pub fn dem(&self) -> &Grid {
        &self.dem
    }

    pub fn dem_nodata(&self) -> Option<f64> {
        self.dem_nodata
    }

    pub fn cropf(&self) -> &Grid {
        &self.cropf
    }

    pub fn whc(&self) -> &Grid {
        &self.whc
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell_size
    }

    /// Area of one cell in squared map units.
    pub fn cell_area(&self) -> f64 {
        self.cell_size.area()
    }

    /// `true` for cells with a usable elevation.
    pub fn is_valid(&self, idx: usize) -> bool {
        let z = self.dem.as_slice()[idx];
        !z.is_nan() && self.dem_nodata != Some(z)
    }

    /// Validity of every cell, in flat index order.
    pub fn valid_mask(&self) -> Vec<bool> {
        (0..self.dem.len()).map(|i| self.is_valid(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{write_ascii_grid, RasterMeta};

    fn grid(v: f64) -> Grid {
        Grid::filled((3, 4), v)
    }

    fn write(dir: &std::path::Path, name: &str, g: &Grid, cell: f64) -> PathBuf {
        let path = dir.join(name);
        let mut meta = RasterMeta::new(CellSize::square(cell).unwrap());
        meta.nodata = Some(-1.0);
        write_ascii_grid(&path, g, &meta).unwrap();
        path
    }

    #[test]
    fn arrays_without_resolution_are_rejected() {
        let inputs = TerrainInputs::new(grid(100.0), grid(1.0), grid(50.0));
        assert!(matches!(Terrain::load(inputs), Err(StreamError::MissingResolution)));
    }

    #[test]
    fn explicit_resolution_is_used() {
        let res = CellSize::new(30.0, 20.0).unwrap();
        let t = Terrain::load(
            TerrainInputs::new(grid(100.0), grid(1.0), grid(50.0)).with_resolution(res),
        )
        .unwrap();
        assert_eq!(t.cell_size(), res);
        assert_eq!(t.cell_area(), 600.0);
        assert_eq!(t.dem_nodata(), Some(DEFAULT_NODATA));
    }

    #[test]
    fn resolution_is_read_from_any_file() {
        let dir = tempfile::tempdir().unwrap();
        for which in 0..3 {
            let path = write(dir.path(), &format!("r{which}.asc"), &grid(5.0), 0.05);
            let mut sources: Vec<RasterSource> =
                vec![grid(100.0).into(), grid(1.0).into(), grid(50.0).into()];
            sources[which] = path.into();
            let whc = sources.pop().unwrap();
            let cropf = sources.pop().unwrap();
            let dem = sources.pop().unwrap();
            let t = Terrain::load(TerrainInputs::new(dem, cropf, whc)).unwrap();
            assert_eq!(t.cell_size(), CellSize::square(0.05).unwrap());
        }
    }

    #[test]
    fn explicit_resolution_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let dem = write(dir.path(), "dem.asc", &grid(100.0), 0.05);
        let res = CellSize::square(1.0).unwrap();
        let t = Terrain::load(TerrainInputs::new(dem, grid(1.0), grid(50.0)).with_resolution(res))
            .unwrap();
        assert_eq!(t.cell_size(), res);
        assert_eq!(t.dem_nodata(), Some(-1.0));
    }

    #[test]
    fn mismatched_shapes_are_rejected() {
        let res = CellSize::square(1.0).unwrap();
        let small = Grid::filled((2, 3), 1.0);
        for which in 0..3 {
            let mut grids = vec![grid(100.0), grid(1.0), grid(50.0)];
            grids[which] = small.clone();
            let whc = grids.pop().unwrap();
            let cropf = grids.pop().unwrap();
            let dem = grids.pop().unwrap();
            let result = Terrain::load(TerrainInputs::new(dem, cropf, whc).with_resolution(res));
            assert!(matches!(result, Err(StreamError::ShapeMismatch { .. })), "case {which}");
        }
    }

    #[test]
    fn non_positive_whc_is_clamped() {
        let whc = Grid::new(1, 3, vec![0.0, -5.0, 80.0]).unwrap();
        let t = Terrain::from_grids(
            Grid::filled((1, 3), 10.0),
            None,
            Grid::filled((1, 3), 1.0),
            whc,
            CellSize::square(1.0).unwrap(),
            0.5,
        )
        .unwrap();
        assert_eq!(t.whc().as_slice(), &[0.5, 0.5, 80.0]);
    }

    #[test]
    fn nodata_and_nan_cells_are_invalid() {
        let dem = Grid::new(1, 3, vec![-9999.0, f64::NAN, 12.0]).unwrap();
        let t = Terrain::from_grids(
            dem,
            Some(-9999.0),
            Grid::filled((1, 3), 1.0),
            Grid::filled((1, 3), 1.0),
            CellSize::square(1.0).unwrap(),
            DEFAULT_WHC_EPSILON,
        )
        .unwrap();
        assert_eq!(t.valid_mask(), vec![false, false, true]);
    }
}

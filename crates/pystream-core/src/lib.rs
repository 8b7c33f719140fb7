/// pystream -- the STREAM gridded rainfall-runoff model in Rust.
///
/// Terrain rasters and monthly climate grids drive a per-cell snow, PET,
/// soil and groundwater scheme whose outflow is routed over a D8 network
/// to the gauge.
pub mod config;
pub mod error;
pub mod forcing;
pub mod grid;
pub mod metrics;
pub mod raster;
pub mod report;
pub mod routing;
pub mod stream;
pub mod terrain;
pub mod traits;

pub use error::{Result, StreamError};
pub use grid::Grid;

/// STREAM -- a spatially explicit monthly rainfall-runoff model.
///
/// Each cell of a raster grid runs a snow routine, Thornthwaite potential
/// evapotranspiration, a Thornthwaite-Mather soil bucket and a linear
/// groundwater reservoir. Cell outflows are routed with D8 flow
/// accumulation to the gauge.
pub mod constants;
pub mod fluxes;
pub mod heat;
pub mod params;
pub mod processes;
pub mod run;
pub mod simulation;
pub mod state;

pub use params::Parameters;
pub use simulation::MonthlySimulation;

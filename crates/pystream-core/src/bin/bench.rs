/// Pure Rust core benchmarks for the STREAM model.
///
/// Uses std::time::Instant for timing, a deterministic LCG PRNG for data generation,
/// and std::hint::black_box to prevent dead-code elimination.
use std::hint::black_box;
use std::time::{Duration, Instant};

use pystream_core::forcing::{ClimateForcing, ClimateSeries};
use pystream_core::grid::Grid;
use pystream_core::raster::CellSize;
use pystream_core::routing::FlowNetwork;
use pystream_core::stream::{MonthlySimulation, Parameters};
use pystream_core::terrain::Terrain;

const REPEATS: usize = 7;

/// Simple LCG PRNG for deterministic data generation.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 33) as f64 / (1u64 << 31) as f64
    }
}

/// A cone sloping down to the centre with a little noise.
fn make_dem(side: usize, rng: &mut Lcg) -> Grid {
    let c = side as f64 / 2.0;
    let data = (0..side * side)
        .map(|i| {
            let (r, col) = ((i / side) as f64, (i % side) as f64);
            (r - c).hypot(col - c) * 10.0 + rng.next_f64()
        })
        .collect();
    Grid::new(side, side, data).unwrap()
}

fn make_forcing(side: usize, months: usize, rng: &mut Lcg) -> ClimateForcing {
    let mut frames = |base: &dyn Fn(usize) -> f64, spread: f64| -> Vec<Grid> {
        (0..months)
            .map(|m| {
                let data = (0..side * side).map(|_| base(m) + rng.next_f64() * spread).collect();
                Grid::new(side, side, data).unwrap()
            })
            .collect()
    };
    let precip = frames(&|_| 20.0, 120.0);
    let temp = frames(&|m| 10.0 - 12.0 * (m as f64 * std::f64::consts::PI / 6.0).cos(), 4.0);
    ClimateForcing::new(
        ClimateSeries { name: "prec".into(), frames: precip },
        ClimateSeries { name: "temp".into(), frames: temp },
    )
    .unwrap()
}

fn make_terrain(side: usize, rng: &mut Lcg) -> Terrain {
    Terrain::from_grids(
        make_dem(side, rng),
        None,
        Grid::filled((side, side), 0.8),
        Grid::filled((side, side), 150.0),
        CellSize::square(1000.0).unwrap(),
        0.01,
    )
    .unwrap()
}

/// Run a closure `REPEATS` times, return the median duration.
fn median_time<F: FnMut()>(mut f: F) -> Duration {
    let mut times: Vec<Duration> = (0..REPEATS)
        .map(|_| {
            let start = Instant::now();
            f();
            start.elapsed()
        })
        .collect();
    times.sort();
    times[REPEATS / 2]
}

fn bench_routing(sides: &[usize]) -> Vec<(&'static str, usize, Duration)> {
    let mut results = Vec::new();

    for &side in sides {
        let mut rng = Lcg(42);
        let dem = make_dem(side, &mut rng);
        let cell = CellSize::square(1000.0).unwrap();
        let weights: Vec<f64> = (0..side * side).map(|_| rng.next_f64()).collect();

        let dur = median_time(|| {
            black_box(FlowNetwork::d8(&dem, None, cell));
        });
        results.push(("d8", side * side, dur));

        let network = FlowNetwork::d8(&dem, None, cell);
        let dur = median_time(|| {
            black_box(network.accumulate(&weights).unwrap());
        });
        results.push(("accumulate", side * side, dur));
    }
    results
}

fn bench_simulation(sides: &[usize], months: usize) -> Vec<(&'static str, usize, Duration)> {
    let mut results = Vec::new();

    for &side in sides {
        let mut rng = Lcg(42);
        let terrain = make_terrain(side, &mut rng);
        let forcing = make_forcing(side, months, &mut rng);
        let mut sim = MonthlySimulation::new(terrain, forcing, Parameters::default()).unwrap();

        // Warmup
        black_box(sim.simulate(None, None).unwrap());

        let dur = median_time(|| {
            black_box(sim.simulate(None, None).unwrap());
        });
        results.push(("stream (120 mo)", side * side, dur));
    }
    results
}

fn main() {
    println!("Pure Rust Core Benchmarks");
    println!("============================================================");
    println!("{:<18} {:>8}   {:>12}", "Kernel", "Cells", "Median (ms)");
    println!("--------------------------------------------");

    let mut all_results: Vec<(&str, usize, Duration)> = Vec::new();

    all_results.extend(bench_routing(&[100, 300, 1000]));
    all_results.extend(bench_simulation(&[50, 150], 120));

    for (kernel, n, dur) in &all_results {
        let ms = dur.as_secs_f64() * 1000.0;
        println!("{:<18} {:>8}      {:>8.2}", kernel, n, ms);
    }

    println!("============================================================");
}

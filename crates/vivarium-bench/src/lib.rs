//! Benchmark profiles for Vivarium.
//!
//! - [`reference_grid`]: 500x500 grid at 20% density, the default
//!   pipeline configuration.
//! - [`small_grid`]: 64x64 grid for quick comparisons.

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use vivarium_engine::PipelineConfig;
use vivarium_grid::LifeGrid;

/// Side length of the reference profile.
pub const REFERENCE_SIZE: usize = 500;

/// Build the reference grid: 500x500 (250K cells), 20% alive.
pub fn reference_grid(seed: u64) -> LifeGrid {
    seeded_grid(REFERENCE_SIZE, 0.2, seed)
}

/// Build a 64x64 grid, 20% alive.
pub fn small_grid(seed: u64) -> LifeGrid {
    seeded_grid(64, 0.2, seed)
}

/// Pipeline configuration matching [`reference_grid`].
pub fn reference_config(seed: u64) -> PipelineConfig {
    PipelineConfig {
        grid_size: REFERENCE_SIZE,
        density_percent: 20,
        seed: Some(seed),
        ..Default::default()
    }
}

fn seeded_grid(size: usize, density: f64, seed: u64) -> LifeGrid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    LifeGrid::new(size, density, &mut rng).expect("benchmark profile grid is valid")
}

//! [`LifeGrid`]: B3/S23 on a torus with per-cell ages.

use std::sync::atomic::{AtomicU64, AtomicU8, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vivarium_core::{cell_count, CellAge, Generation, Grid, GridError, GridFactory, DEAD, MAX_AGE};

use crate::torus::neighbour_indices;

/// A square Game of Life grid whose cells record their age.
///
/// Cells live in `AtomicU8` slots so [`copy_cells`](Grid::copy_cells) can
/// run while another thread is inside [`iterate`](Grid::iterate). A copy
/// taken mid-step may mix old and new ages, but never a torn byte.
///
/// Stepping reads the whole grid into a private scratch buffer first and
/// then writes the next generation back cell by cell. The scratch buffer
/// sits behind a `Mutex`, which also serializes concurrent writers.
pub struct LifeGrid {
    size: usize,
    cells: Box<[AtomicU8]>,
    scratch: Mutex<Vec<CellAge>>,
    generation: AtomicU64,
    population: AtomicUsize,
}

// Compile-time assertion: LifeGrid must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<LifeGrid>();
};

impl LifeGrid {
    /// Create a `size` x `size` grid where each cell is independently
    /// alive (age 1) with probability `density`.
    pub fn new<R: Rng + ?Sized>(size: usize, density: f64, rng: &mut R) -> Result<Self, GridError> {
        let count = cell_count(size)?;
        if !(0.0..=1.0).contains(&density) {
            return Err(GridError::InvalidDensity { density });
        }
        let mut ages = Vec::new();
        ages.try_reserve_exact(count)
            .map_err(|_| GridError::InvalidSize { size })?;
        ages.extend((0..count).map(|_| if rng.random_bool(density) { 1 } else { DEAD }));
        Ok(Self::from_checked(size, ages))
    }

    /// Create a grid from explicit row-major ages.
    ///
    /// Useful for seeding known patterns. Every age must be at most
    /// [`MAX_AGE`].
    pub fn from_ages(size: usize, ages: Vec<CellAge>) -> Result<Self, GridError> {
        let count = cell_count(size)?;
        if ages.len() != count {
            return Err(GridError::BufferMismatch {
                expected: count,
                actual: ages.len(),
            });
        }
        if let Some(index) = ages.iter().position(|&a| a > MAX_AGE) {
            return Err(GridError::AgeOutOfRange {
                index,
                age: ages[index],
            });
        }
        Ok(Self::from_checked(size, ages))
    }

    fn from_checked(size: usize, ages: Vec<CellAge>) -> Self {
        let population = ages.iter().filter(|&&a| a != DEAD).count();
        let scratch = Vec::with_capacity(ages.len());
        let cells = ages.into_iter().map(AtomicU8::new).collect();
        Self {
            size,
            cells,
            scratch: Mutex::new(scratch),
            generation: AtomicU64::new(0),
            population: AtomicUsize::new(population),
        }
    }

    /// Age of the cell at `(row, col)`, or `None` when out of bounds.
    pub fn age(&self, row: usize, col: usize) -> Option<CellAge> {
        if row >= self.size || col >= self.size {
            return None;
        }
        Some(self.cells[row * self.size + col].load(Ordering::Relaxed))
    }

    /// All cell ages in row-major order.
    pub fn ages(&self) -> Vec<CellAge> {
        self.cells.iter().map(|c| c.load(Ordering::Relaxed)).collect()
    }
}

/// Next age of a cell given its current age and live neighbour count.
#[inline]
fn next_age(age: CellAge, live_neighbours: usize) -> CellAge {
    match (age, live_neighbours) {
        (DEAD, 3) => 1,
        (DEAD, _) => DEAD,
        (age, 2 | 3) => age.saturating_add(1).min(MAX_AGE),
        _ => DEAD,
    }
}

impl Grid for LifeGrid {
    fn size(&self) -> usize {
        self.size
    }

    fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    fn population(&self) -> usize {
        self.population.load(Ordering::Acquire)
    }

    fn iterate(&self) -> Result<(), GridError> {
        let mut current = self.scratch.lock().unwrap_or_else(PoisonError::into_inner);
        current.clear();
        current.extend(self.cells.iter().map(|c| c.load(Ordering::Relaxed)));

        let size = self.size;
        let mut population = 0usize;
        for row in 0..size {
            for col in 0..size {
                let idx = row * size + col;
                let live = neighbour_indices(row, col, size)
                    .iter()
                    .filter(|&&n| current[n] != DEAD)
                    .count();
                let age = current[idx];
                let next = next_age(age, live);
                if next != DEAD {
                    population += 1;
                }
                if next != age {
                    self.cells[idx].store(next, Ordering::Relaxed);
                }
            }
        }

        // Release: readers that observe the new generation also observe
        // the cell stores and population above.
        self.population.store(population, Ordering::Relaxed);
        self.generation.fetch_add(1, Ordering::Release);
        Ok(())
    }

    fn copy_cells(&self, dest: &mut [CellAge]) -> Result<(), GridError> {
        if dest.len() != self.cells.len() {
            return Err(GridError::BufferMismatch {
                expected: self.cells.len(),
                actual: dest.len(),
            });
        }
        for (d, c) in dest.iter_mut().zip(self.cells.iter()) {
            *d = c.load(Ordering::Relaxed);
        }
        Ok(())
    }
}

impl std::fmt::Debug for LifeGrid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifeGrid")
            .field("size", &self.size)
            .field("generation", &self.generation())
            .field("population", &self.population())
            .finish()
    }
}

/// [`GridFactory`] producing randomly seeded [`LifeGrid`]s.
///
/// Each grid draws its initial cells from a `ChaCha8Rng` seeded with the
/// requested seed, so equal seeds give equal grids.
#[derive(Clone, Copy, Debug, Default)]
pub struct LifeGridFactory;

impl GridFactory for LifeGridFactory {
    fn create(&self, size: usize, density: f64, seed: u64) -> Result<Arc<dyn Grid>, GridError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Ok(Arc::new(LifeGrid::new(size, density, &mut rng)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn seeded() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    /// Horizontal blinker centred at (2, 2) on a 5x5 grid.
    fn blinker() -> LifeGrid {
        let mut ages = vec![0u8; 25];
        ages[2 * 5 + 1] = 1;
        ages[2 * 5 + 2] = 1;
        ages[2 * 5 + 3] = 1;
        LifeGrid::from_ages(5, ages).unwrap()
    }

    #[test]
    fn rejects_zero_size() {
        let err = LifeGrid::new(0, 0.5, &mut seeded()).unwrap_err();
        assert_eq!(err, GridError::InvalidSize { size: 0 });
    }

    #[test]
    fn rejects_density_out_of_range() {
        for density in [-0.1, 1.01, f64::NAN, f64::INFINITY] {
            match LifeGrid::new(10, density, &mut seeded()) {
                Err(GridError::InvalidDensity { .. }) => {}
                other => panic!("expected InvalidDensity for {density}, got {other:?}"),
            }
        }
    }

    #[test]
    fn empty_grid_stays_empty() {
        let grid = LifeGrid::new(10, 0.0, &mut seeded()).unwrap();
        assert_eq!(grid.population(), 0);
        grid.iterate().unwrap();
        assert_eq!(grid.population(), 0);
        assert!(grid.ages().iter().all(|&a| a == DEAD));
    }

    #[test]
    fn full_grid_counts_generations_from_baseline() {
        let grid = LifeGrid::new(10, 1.0, &mut seeded()).unwrap();
        assert_eq!(grid.population(), 100);
        let g0 = grid.generation();
        for _ in 0..3 {
            grid.iterate().unwrap();
        }
        assert_eq!(grid.generation(), Generation(g0.0 + 3));
        // Every cell has 8 live neighbours on the first step and dies.
        assert_eq!(grid.population(), 0);
    }

    #[test]
    fn blinker_oscillates_and_centre_ages() {
        let grid = blinker();
        grid.iterate().unwrap();
        // Vertical phase: (1,2), (2,2), (3,2).
        assert_eq!(grid.age(1, 2), Some(1));
        assert_eq!(grid.age(2, 2), Some(2));
        assert_eq!(grid.age(3, 2), Some(1));
        assert_eq!(grid.age(2, 1), Some(0));
        assert_eq!(grid.population(), 3);

        grid.iterate().unwrap();
        assert_eq!(grid.age(2, 1), Some(1));
        assert_eq!(grid.age(2, 2), Some(3));
        assert_eq!(grid.age(2, 3), Some(1));
    }

    #[test]
    fn block_ages_saturate_at_max() {
        let mut ages = vec![0u8; 36];
        for (r, c) in [(2, 2), (2, 3), (3, 2), (3, 3)] {
            ages[r * 6 + c] = MAX_AGE - 1;
        }
        let grid = LifeGrid::from_ages(6, ages).unwrap();
        grid.iterate().unwrap();
        assert_eq!(grid.age(2, 2), Some(MAX_AGE));
        grid.iterate().unwrap();
        assert_eq!(grid.age(2, 2), Some(MAX_AGE));
        assert_eq!(grid.population(), 4);
    }

    #[test]
    fn pattern_wraps_across_edges() {
        // Blinker straddling the right edge of a 5x5 torus.
        let mut ages = vec![0u8; 25];
        ages[2 * 5 + 4] = 1;
        ages[2 * 5] = 1;
        ages[2 * 5 + 1] = 1;
        let grid = LifeGrid::from_ages(5, ages).unwrap();
        grid.iterate().unwrap();
        assert_eq!(grid.age(1, 0), Some(1));
        assert_eq!(grid.age(2, 0), Some(2));
        assert_eq!(grid.age(3, 0), Some(1));
        assert_eq!(grid.population(), 3);
    }

    #[test]
    fn from_ages_validates_input() {
        assert_eq!(
            LifeGrid::from_ages(3, vec![0; 8]).unwrap_err(),
            GridError::BufferMismatch {
                expected: 9,
                actual: 8
            }
        );
        let mut ages = vec![0; 9];
        ages[4] = MAX_AGE + 1;
        assert_eq!(
            LifeGrid::from_ages(3, ages).unwrap_err(),
            GridError::AgeOutOfRange {
                index: 4,
                age: MAX_AGE + 1
            }
        );
    }

    #[test]
    fn copy_cells_checks_buffer_size() {
        let grid = blinker();
        let mut dest = vec![0u8; 24];
        assert!(matches!(
            grid.copy_cells(&mut dest),
            Err(GridError::BufferMismatch { expected: 25, actual: 24 })
        ));
        let mut dest = vec![9u8; 25];
        grid.copy_cells(&mut dest).unwrap();
        assert_eq!(dest, grid.ages());
    }

    #[test]
    fn factory_is_deterministic_per_seed() {
        let a = LifeGridFactory.create(32, 0.2, 7).unwrap();
        let b = LifeGridFactory.create(32, 0.2, 7).unwrap();
        let mut ca = vec![0u8; 32 * 32];
        let mut cb = vec![0u8; 32 * 32];
        a.copy_cells(&mut ca).unwrap();
        b.copy_cells(&mut cb).unwrap();
        assert_eq!(ca, cb);
        assert_eq!(a.population(), b.population());
    }

    #[test]
    fn concurrent_copies_never_see_foreign_values() {
        // A blinker only ever touches its 3x3 box; cells outside it must
        // read as dead in every copy, however the copy interleaves.
        let grid = Arc::new(blinker());
        let writer = {
            let grid = Arc::clone(&grid);
            std::thread::spawn(move || {
                for _ in 0..2_000 {
                    grid.iterate().unwrap();
                }
            })
        };
        let mut dest = vec![0u8; 25];
        while !writer.is_finished() {
            grid.copy_cells(&mut dest).unwrap();
            for row in 0..5 {
                for col in 0..5 {
                    let inside = (1..=3).contains(&row) && (1..=3).contains(&col);
                    let age = dest[row * 5 + col];
                    if !inside {
                        assert_eq!(age, DEAD, "({row},{col}) outside the blinker box");
                    }
                    assert!(age <= MAX_AGE);
                }
            }
        }
        writer.join().unwrap();
        assert_eq!(grid.generation(), Generation(2_000));
    }

    proptest! {
        #[test]
        fn generation_increments_by_exactly_one(steps in 0usize..20, seed in any::<u64>()) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let grid = LifeGrid::new(8, 0.3, &mut rng).unwrap();
            let mut prev = grid.generation();
            for _ in 0..steps {
                grid.iterate().unwrap();
                let now = grid.generation();
                prop_assert_eq!(now, prev.next());
                prev = now;
            }
        }

        #[test]
        fn population_matches_live_cells(seed in any::<u64>(), density in 0.0f64..=1.0) {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let grid = LifeGrid::new(12, density, &mut rng).unwrap();
            grid.iterate().unwrap();
            let live = grid.ages().iter().filter(|&&a| a != DEAD).count();
            prop_assert_eq!(grid.population(), live);
        }
    }
}

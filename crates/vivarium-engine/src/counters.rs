//! Generation and population counters published by the simulator.
//!
//! Single writer (the simulator thread), many readers (the sampler and
//! any UI observer). The population is stored before the generation with
//! release ordering, so a reader that acquires a generation value also
//! sees a population at least as new as that generation.

use std::sync::atomic::{AtomicU64, Ordering};

use vivarium_core::Generation;

/// Cross-thread `(generation, population)` pair.
///
/// Padded to 128 bytes so the simulator's stores do not share a cache
/// line with neighbouring data.
#[repr(align(128))]
#[derive(Debug, Default)]
pub struct PublishedCounters {
    generation: AtomicU64,
    population: AtomicU64,
}

// Compile-time assertion: PublishedCounters must be Send + Sync.
const _: fn() = || {
    fn assert<T: Send + Sync>() {}
    assert::<PublishedCounters>();
};

impl PublishedCounters {
    /// Counters starting at a grid's baseline.
    pub fn new(generation: Generation, population: usize) -> Self {
        Self {
            generation: AtomicU64::new(generation.0),
            population: AtomicU64::new(population as u64),
        }
    }

    /// Publish the state after a completed step. Single writer only.
    pub fn publish(&self, generation: Generation, population: usize) {
        debug_assert!(
            generation.0 >= self.generation.load(Ordering::Relaxed),
            "published generation went backwards"
        );
        self.population.store(population as u64, Ordering::Relaxed);
        self.generation.store(generation.0, Ordering::Release);
    }

    /// Latest published generation.
    pub fn generation(&self) -> Generation {
        Generation(self.generation.load(Ordering::Acquire))
    }

    /// Latest published population.
    pub fn population(&self) -> usize {
        self.population.load(Ordering::Acquire) as usize
    }

    /// Generation then population, in acquire order.
    pub fn snapshot(&self) -> (Generation, usize) {
        let generation = self.generation();
        (generation, self.population())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn starts_at_baseline() {
        let c = PublishedCounters::new(Generation(5), 12);
        assert_eq!(c.snapshot(), (Generation(5), 12));
    }

    #[test]
    fn publish_updates_both() {
        let c = PublishedCounters::default();
        c.publish(Generation(1), 3);
        c.publish(Generation(2), 4);
        assert_eq!(c.generation(), Generation(2));
        assert_eq!(c.population(), 4);
    }

    #[test]
    fn counters_are_cache_line_aligned() {
        assert!(std::mem::align_of::<PublishedCounters>() >= 128);
    }

    #[test]
    fn readers_never_see_generation_regress() {
        let c = Arc::new(PublishedCounters::default());
        let writer = {
            let c = Arc::clone(&c);
            std::thread::spawn(move || {
                for g in 1..=50_000u64 {
                    // Population encodes the generation it belongs to.
                    c.publish(Generation(g), g as usize);
                }
            })
        };
        let mut last = Generation::ZERO;
        while !writer.is_finished() {
            let (g, pop) = c.snapshot();
            assert!(g >= last);
            assert!(pop as u64 >= g.0, "population older than generation");
            last = g;
        }
        writer.join().unwrap();
        assert_eq!(c.generation(), Generation(50_000));
    }
}

//! Headless pipeline demo: runs the simulator and sampler without a
//! display and logs what a UI would show.
//!
//! Demonstrates:
//!   1. Building a Controller from a PipelineConfig
//!   2. Listening for published frames and running-state changes
//!   3. start, host pause/resume, color changes, reset and stop
//!
//! Run with:
//!   RUST_LOG=debug cargo run --example headless

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;
use vivarium_engine::{Controller, PipelineConfig};

// ─── Parameters ─────────────────────────────────────────────────

const GRID_SIZE: usize = 200;
const RUN_FOR: Duration = Duration::from_millis(500);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = PipelineConfig {
        grid_size: GRID_SIZE,
        seed: Some(2024),
        ..Default::default()
    };
    let mut controller = Controller::new(config)?;

    let frames = Arc::new(AtomicU64::new(0));
    {
        let frames = Arc::clone(&frames);
        controller.on_generation_published(move |generation, population| {
            // Log every 20th frame to keep output readable.
            if frames.fetch_add(1, Ordering::Relaxed) % 20 == 0 {
                info!(%generation, population, "frame");
            }
        });
    }
    controller.on_running_changed(|running| info!(running, "running changed"));

    // ─── Run ────────────────────────────────────────────────────
    controller.start()?;
    thread::sleep(RUN_FOR);

    // ─── Host pause / resume ────────────────────────────────────
    controller.on_pause()?;
    let paused_at = controller.generation();
    thread::sleep(Duration::from_millis(100));
    assert_eq!(controller.generation(), paused_at);
    info!(state = %controller.state(), %paused_at, "paused by host");
    controller.on_resume()?;

    // ─── Recolor while running ──────────────────────────────────
    controller.set_hue(120.0);
    controller.set_old_brightness(0.2);
    thread::sleep(RUN_FOR);

    // ─── Reset to a sparser grid ────────────────────────────────
    controller.set_density(5)?;
    controller.reset()?;
    info!(
        state = %controller.state(),
        generation = %controller.generation(),
        population = controller.population(),
        "reset"
    );
    controller.start()?;
    thread::sleep(RUN_FOR);
    controller.stop()?;

    let m = controller.metrics();
    info!(
        iterations = m.iterations,
        frames = m.frames_rendered,
        skipped = m.samples_skipped,
        rebuilds = m.color_rebuilds,
        last_sample_us = m.last_sample_us,
        "done"
    );
    Ok(())
}

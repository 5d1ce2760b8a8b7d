//! Concurrent stress of the relaxed-consistency snapshot copy.
//!
//! The simulator writes cells while the sampler copies them with no lock
//! around the cell array. A copy may mix pre- and post-step cells, but
//! every cell is read whole, so every presented pixel must be either the
//! background or an entry of the color table. Presented generations must
//! strictly increase and presenters must only ever see complete frames.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use vivarium_core::Generation;
use vivarium_engine::{Controller, PipelineConfig};
use vivarium_render::{ColorParams, ColorTable, BACKGROUND};

const SIZE: usize = 96;

#[test]
fn presented_frames_are_whole_and_monotonic() {
    let mut c = Controller::new(PipelineConfig {
        grid_size: SIZE,
        density_percent: 35,
        sample_period: Duration::from_millis(1),
        seed: Some(5),
        ..Default::default()
    })
    .unwrap();

    let published = Arc::new(Mutex::new(Vec::new()));
    {
        let published = Arc::clone(&published);
        c.on_generation_published(move |g, _| published.lock().unwrap().push(g));
    }

    let mut table = ColorTable::new();
    table.rebuild(ColorParams::default());
    let palette: HashSet<_> = table
        .entries()
        .iter()
        .copied()
        .chain(std::iter::once(BACKGROUND))
        .collect();

    let done = Arc::new(AtomicBool::new(false));
    let presenter = {
        let slot = c.frame_slot();
        let done = Arc::clone(&done);
        thread::spawn(move || {
            let mut last = Generation::ZERO;
            let mut checked = 0u64;
            while !done.load(Ordering::Acquire) {
                if let Some(frame) = slot.latest() {
                    assert_eq!(frame.size(), SIZE);
                    assert_eq!(frame.pixels().len(), SIZE * SIZE);
                    assert!(frame.generation() >= last, "presented frame went backwards");
                    assert!(
                        frame.pixels().iter().all(|p| palette.contains(p)),
                        "torn pixel in generation {}",
                        frame.generation()
                    );
                    last = frame.generation();
                    checked += 1;
                }
                thread::yield_now();
            }
            checked
        })
    };

    c.start().unwrap();
    thread::sleep(Duration::from_millis(300));
    c.stop().unwrap();
    done.store(true, Ordering::Release);
    let checked = presenter.join().unwrap();
    assert!(checked > 0);

    let published = published.lock().unwrap();
    assert!(published.len() > 1, "sampler never fired");
    for pair in published.windows(2) {
        assert!(pair[0] < pair[1], "generation {} rendered after {}", pair[1], pair[0]);
    }
    let m = c.metrics();
    assert!(m.iterations >= published.last().unwrap().0);
    assert_eq!(m.color_rebuilds, 1);
}

#[test]
fn color_changes_under_load_rebuild_before_next_frame() {
    let mut c = Controller::new(PipelineConfig {
        grid_size: 32,
        sample_period: Duration::from_millis(1),
        seed: Some(11),
        ..Default::default()
    })
    .unwrap();
    c.start().unwrap();
    for hue in [0.0, 60.0, 120.0, 180.0] {
        let before = c.metrics().color_rebuilds;
        c.set_hue(hue);
        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while c.metrics().color_rebuilds == before {
            assert!(std::time::Instant::now() < deadline);
            thread::sleep(Duration::from_millis(1));
        }
    }
    c.stop().unwrap();
    assert_eq!(c.color_params().hue, 180.0);
}

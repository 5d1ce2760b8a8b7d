//! Vivarium: a Game of Life that simulates on one thread and renders on
//! another.
//!
//! This is the facade crate that re-exports the public API of the
//! Vivarium sub-crates.
//!
//! # Quick start
//!
//! ```rust
//! use std::time::Duration;
//! use vivarium::prelude::*;
//!
//! let config = PipelineConfig {
//!     grid_size: 32,
//!     seed: Some(1),
//!     ..Default::default()
//! };
//! let mut controller = Controller::new(config).unwrap();
//!
//! // The freshly generated grid is drawn before anything runs.
//! let frame = controller.latest_frame().unwrap();
//! assert_eq!(frame.size(), 32);
//!
//! controller.start().unwrap();
//! std::thread::sleep(Duration::from_millis(30));
//! controller.stop().unwrap();
//! assert!(!controller.running());
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `vivarium-core` | `Generation`, cell ages, `Grid` and `GridFactory` traits |
//! | [`grid`] | `vivarium-grid` | `LifeGrid` on a torus |
//! | [`render`] | `vivarium-render` | Colors, `ColorTable`, double-buffered frames |
//! | [`engine`] | `vivarium-engine` | Simulator, sampler and `Controller` |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types and traits (`vivarium-core`).
pub use vivarium_core as types;

/// The Life grid (`vivarium-grid`).
pub use vivarium_grid as grid;

/// Colors, color tables and frames (`vivarium-render`).
pub use vivarium_render as render;

/// The simulate/render pipeline (`vivarium-engine`).
///
/// [`engine::Controller`] is the entry point.
pub use vivarium_engine as engine;

/// Common imports for typical Vivarium usage.
pub mod prelude {
    // Core
    pub use vivarium_core::{CellAge, Generation, Grid, GridError, GridFactory, MAX_AGE};

    // Grid
    pub use vivarium_grid::{LifeGrid, LifeGridFactory};

    // Render
    pub use vivarium_render::{Color, ColorParams, Frame, FrameSlot, RenderError};

    // Engine
    pub use vivarium_engine::{
        ConfigError, ControlError, Controller, PipelineConfig, PipelineEvent, PipelineMetrics,
        RunState,
    };
}

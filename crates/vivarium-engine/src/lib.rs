//! Concurrent simulate/render pipeline.
//!
//! A free-running simulator thread advances the grid as fast as it can
//! while a fixed-delay sampler thread copies the latest state into a
//! double-buffered frame. The [`Controller`] owns both lifetimes and maps
//! start/stop/reset and host pause/resume onto them.
//!
//! # Architecture
//!
//! ```text
//! Host / UI thread            Simulator thread          Sampler thread
//!     |                           |                         |
//!     |--start()----------------->| while run_flag:         |
//!     |   spawn both workers      |   grid.iterate()        |
//!     |                           |   counters.publish()    |
//!     |                           |                         | recv_timeout(period)
//!     |                           |                         | g = counters.generation()
//!     |                           |                         | skip unless g == 0 || g > last
//!     |                           |                         | grid.copy_cells(snapshot)
//!     |                           |                         | recolor -> FrameBuffer
//!     |<--FramePublished(g)---------------------------------| present() into FrameSlot
//!     |--latest_frame()-------------------------------------|
//!     |                           |                         |
//!     |--stop()/on_pause()------->| run_flag = false        | cancel channel dropped
//!     |   join both (bounded)     | exit                    | exit, hand Sampler back
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod controller;
pub mod counters;
pub mod events;
pub mod metrics;
pub mod sampler;
pub mod schedule;
pub mod settings;
pub mod shared;
pub mod simulator;
pub mod state;

pub use config::{ConfigError, PipelineConfig};
pub use controller::{ControlError, Controller};
pub use counters::PublishedCounters;
pub use events::{Listener, Listeners, PipelineEvent};
pub use metrics::{MetricsCounters, PipelineMetrics};
pub use sampler::{SampleOutcome, Sampler};
pub use settings::ColorSettings;
pub use shared::Shared;
pub use simulator::{Simulator, SimulatorExit};
pub use state::RunState;

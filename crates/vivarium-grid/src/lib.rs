//! Age-tracking Game of Life grid.
//!
//! [`LifeGrid`] is the concrete [`Grid`](vivarium_core::Grid) used by the
//! pipeline: a square torus running the B3/S23 rule, where every live
//! cell remembers how many consecutive generations it has been alive.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod life;
pub mod torus;

pub use life::{LifeGrid, LifeGridFactory};

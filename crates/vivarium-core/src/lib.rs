//! Core types and traits for the Vivarium simulation pipeline.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the abstractions shared by the grid, render, and engine crates:
//! the [`Generation`] counter, cell ages, the [`Grid`] collaborator
//! trait, and the grid error type.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod cell;
pub mod error;
pub mod grid;
pub mod id;

pub use cell::{CellAge, DEAD, MAX_AGE};
pub use error::GridError;
pub use grid::{cell_count, Grid, GridFactory};
pub use id::Generation;

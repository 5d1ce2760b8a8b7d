//! Age-to-color mapping and double-buffered frames.
//!
//! The sampler recolors each cell snapshot through a [`ColorTable`] into a
//! [`FrameBuffer`], then presents the finished frame into a shared
//! [`FrameSlot`] where the render boundary picks it up. Presenters only
//! ever see complete frames.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod buffer;
pub mod color;
pub mod error;
pub mod frame;
pub mod table;

pub use buffer::try_buffer;
pub use color::{hsv_to_color, Color, ColorParams, BACKGROUND};
pub use error::RenderError;
pub use frame::{Frame, FrameBuffer, FrameSlot};
pub use table::ColorTable;

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Marker sizing and map figure rendering.
//!
//! [`render`] turns the shared [`Dataset`](exposure_map_sample_models::Dataset)
//! and a [`FilterSelection`](exposure_map_render_models::FilterSelection)
//! into a [`FigureSpec`](exposure_map_render_models::FigureSpec). It is pure
//! and synchronous; the server calls it once per filter change.

pub mod marker_size;
pub mod palette;
pub mod pipeline;

pub use marker_size::{MarkerSizeError, marker_sizes};
pub use pipeline::{default_selection, empty_figure, render};

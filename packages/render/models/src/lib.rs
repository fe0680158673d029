#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Filter selection and map figure types.
//!
//! [`FigureSpec`] serializes to the `{ data, layout }` shape accepted by
//! `Plotly.react`, so the dashboard can hand the API response straight to
//! the charting library.

use exposure_map_sample_models::{Coordinates, Placement, Pollutant, Round};
use serde::{Deserialize, Serialize};

/// Plotly trace type for tile-map scatter layers.
pub const SCATTER_MAP_TRACE: &str = "scattermap";

/// The active dashboard query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    /// Selected rounds in display order, without duplicates.
    pub rounds: Vec<Round>,
    /// Selected indoor/outdoor placement.
    pub placement: Placement,
    /// Pollutant that drives marker size.
    pub pollutant: Pollutant,
}

impl FilterSelection {
    /// Builds a selection, dropping repeated rounds while keeping the first
    /// occurrence's position.
    #[must_use]
    pub fn new(
        rounds: impl IntoIterator<Item = Round>,
        placement: Placement,
        pollutant: Pollutant,
    ) -> Self {
        let mut unique = Vec::new();
        for round in rounds {
            if !unique.contains(&round) {
                unique.push(round);
            }
        }
        Self {
            rounds: unique,
            placement,
            pollutant,
        }
    }

    #[must_use]
    pub fn includes(&self, round: Round) -> bool {
        self.rounds.contains(&round)
    }
}

/// A renderable map figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureSpec {
    /// One marker layer per selected round.
    pub data: Vec<MarkerLayer>,
    /// Shared map view and legend.
    pub layout: Layout,
}

/// Markers for one round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkerLayer {
    /// Plotly trace type, always [`SCATTER_MAP_TRACE`].
    #[serde(rename = "type")]
    pub trace_type: String,
    /// Legend entry (e.g. `"Round 0"`).
    pub name: String,
    /// Round this layer shows. Carried to the browser as Plotly `meta`.
    pub meta: Round,
    pub mode: String,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub marker: Marker,
    /// `[home id, raw pollutant value]` per point.
    pub customdata: Vec<(String, f64)>,
    pub hovertemplate: String,
}

impl MarkerLayer {
    /// Number of plotted points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lat.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lat.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    /// Per-point marker size in pixels, within the normalizer's bounds.
    pub size: Vec<f64>,
    /// Hex color shared by every point of the layer.
    pub color: String,
}

/// Figure-wide layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    pub hovermode: String,
    pub autosize: bool,
    pub width: u32,
    pub height: u32,
    pub map: MapView,
    pub showlegend: bool,
    pub legend: Legend,
}

/// Camera for the tile map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapView {
    pub bearing: f64,
    pub center: MapCenter,
    pub pitch: f64,
    pub zoom: f64,
}

/// Plotly names map-center fields `lat`/`lon`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct MapCenter {
    pub lat: f64,
    pub lon: f64,
}

impl From<Coordinates> for MapCenter {
    fn from(c: Coordinates) -> Self {
        Self {
            lat: c.latitude,
            lon: c.longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Legend {
    /// `"h"` for a horizontal legend.
    pub orientation: String,
    pub xanchor: String,
    pub yanchor: String,
    /// Vertical position in paper coordinates; negative places it below the
    /// map.
    pub y: f64,
    pub itemsizing: String,
    pub traceorder: String,
    pub font: Font,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Font {
    pub family: String,
    pub size: u32,
    pub color: String,
}

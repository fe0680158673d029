#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! API request and response types for the exposure map server.
//!
//! These types are serialized to JSON for the REST API. They are separate
//! from the sample and figure types to allow independent evolution of the
//! API contract.

use std::collections::BTreeMap;

use exposure_map_render_models::FilterSelection;
use exposure_map_sample_models::{Placement, Pollutant, Round, Sample};
use serde::{Deserialize, Serialize};

/// Query parameters for the figure endpoint.
///
/// Absent parameters fall back to the dashboard defaults. An empty `rounds`
/// string selects no rounds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FigureQueryParams {
    /// Comma-separated round numbers (e.g. `"0,2"`).
    pub rounds: Option<String>,
    /// `Indoor`, `Outdoor`, or another observed placement value.
    pub placement: Option<String>,
    /// Pollutant key (e.g. `"pm25"`).
    pub pollutant: Option<String>,
}

/// Why a figure query could not become a [`FilterSelection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    /// Pollutant key was not recognized.
    Pollutant(String),
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pollutant(value) => write!(f, "unknown pollutant {value:?}"),
        }
    }
}

impl std::error::Error for SelectionError {}

impl FigureQueryParams {
    /// Resolves the query against `defaults`. Unparseable round tokens are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SelectionError`] if the pollutant is not recognized.
    pub fn to_selection(
        &self,
        defaults: &FilterSelection,
    ) -> Result<FilterSelection, SelectionError> {
        let rounds: Vec<Round> = self.rounds.as_deref().map_or_else(
            || defaults.rounds.clone(),
            |s| s.split(',').filter_map(|r| r.trim().parse().ok()).collect(),
        );

        let placement = self
            .placement
            .as_deref()
            .map_or_else(|| defaults.placement.clone(), Placement::from);

        let pollutant = match self.pollutant.as_deref() {
            Some(p) => p
                .trim()
                .parse()
                .map_err(|_| SelectionError::Pollutant(p.to_string()))?,
            None => defaults.pollutant,
        };

        Ok(FilterSelection::new(rounds, placement, pollutant))
    }
}

/// A round checkbox.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRoundOption {
    /// Round number sent back in `rounds`.
    pub value: Round,
    /// Display label (`"Round 0"`).
    pub label: String,
    /// Layer color for this round.
    pub color: String,
}

/// A pollutant dropdown entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiPollutantOption {
    /// Key sent back in `pollutant`.
    pub key: Pollutant,
    /// Source column name shown to the user.
    pub label: String,
    /// Whether the column exists in the loaded export.
    pub available: bool,
}

/// Initial widget values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDefaults {
    pub rounds: Vec<Round>,
    pub placement: Placement,
    pub pollutant: Pollutant,
}

impl From<&FilterSelection> for ApiDefaults {
    fn from(selection: &FilterSelection) -> Self {
        Self {
            rounds: selection.rounds.clone(),
            placement: selection.placement.clone(),
            pollutant: selection.pollutant,
        }
    }
}

/// Everything the dashboard needs to build its filter widgets.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOptions {
    pub rounds: Vec<ApiRoundOption>,
    pub placements: Vec<Placement>,
    pub pollutants: Vec<ApiPollutantOption>,
    pub defaults: ApiDefaults,
}

/// A loaded sample as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSample {
    pub home_id: String,
    pub round: Round,
    pub placement: Placement,
    pub address: String,
    /// `YYYY-MM-DD`.
    pub set_up_date: Option<String>,
    /// `YYYY-MM-DD`.
    pub pick_up_date: Option<String>,
    /// `HH:MM`.
    pub start_time: Option<String>,
    /// `HH:MM`.
    pub end_time: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Raw values for every pollutant, keyed by pollutant key.
    pub measurements: BTreeMap<Pollutant, f64>,
}

impl From<&Sample> for ApiSample {
    fn from(s: &Sample) -> Self {
        Self {
            home_id: s.home_id.clone(),
            round: s.round,
            placement: s.placement.clone(),
            address: s.address.clone(),
            set_up_date: s.set_up_date.map(|d| d.format("%Y-%m-%d").to_string()),
            pick_up_date: s.pick_up_date.map(|d| d.format("%Y-%m-%d").to_string()),
            start_time: s.start_time.map(|t| t.format("%H:%M").to_string()),
            end_time: s.end_time.map(|t| t.format("%H:%M").to_string()),
            latitude: s.coordinates.map(|c| c.latitude),
            longitude: s.coordinates.map(|c| c.longitude),
            measurements: Pollutant::all()
                .iter()
                .map(|p| (*p, s.measurements.get(*p)))
                .collect(),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    /// Whether the service is healthy.
    pub healthy: bool,
    /// Service version.
    pub version: String,
    /// Samples loaded at startup.
    pub samples: usize,
    /// Samples with resolved coordinates.
    pub geocoded: usize,
}

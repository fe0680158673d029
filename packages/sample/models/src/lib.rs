#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Sample, pollutant, and dataset snapshot types.
//!
//! This crate defines the typed view of one row of the environmental
//! monitoring export ([`Sample`]) and the immutable [`Dataset`] built once at
//! startup and shared read-only by every render request.

mod dataset;

pub use dataset::Dataset;

use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// A measurement round (data-collection campaign), 0-based.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Round(pub u32);

impl Round {
    /// Returns the numeric round identifier.
    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }

    /// Legend label for this round (e.g. `"Round 2"`).
    #[must_use]
    pub fn label(self) -> String {
        format!("Round {}", self.0)
    }
}

impl std::fmt::Display for Round {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Round {
    type Err = InvalidRoundError;

    /// Accepts plain integers and integral floats (`"2"`, `"2.0"`), since
    /// spreadsheet exports frequently write whole numbers with a decimal
    /// point.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(value) = trimmed.parse::<u32>() {
            return Ok(Self(value));
        }
        match trimmed.parse::<f64>() {
            Ok(value)
                if value.is_finite()
                    && value >= 0.0
                    && value.fract() == 0.0
                    && value <= f64::from(u32::MAX) =>
            {
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let value = value as u32;
                Ok(Self(value))
            }
            _ => Err(InvalidRoundError {
                value: trimmed.to_string(),
            }),
        }
    }
}

/// Error returned when a round identifier is not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRoundError {
    /// The rejected input.
    pub value: String,
}

impl std::fmt::Display for InvalidRoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid round {:?}: expected a non-negative integer",
            self.value
        )
    }
}

impl std::error::Error for InvalidRoundError {}

/// Value of the indoor/outdoor column.
///
/// The usual spellings of indoor and outdoor collapse onto the two named
/// variants. Anything else (e.g. `"Field blank"`) is kept verbatim in
/// [`Placement::Other`] so the row stays loadable and filterable under its
/// own category.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Placement {
    /// Sampler placed inside the home.
    Indoor,
    /// Sampler placed outside the home.
    Outdoor,
    /// Any other observed value, trimmed.
    Other(String),
}

impl Placement {
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Indoor => "Indoor",
            Self::Outdoor => "Outdoor",
            Self::Other(value) => value,
        }
    }
}

impl From<&str> for Placement {
    fn from(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "indoor" | "indoors" | "inside" | "in" | "i" => Self::Indoor,
            "outdoor" | "outdoors" | "outside" | "out" | "o" => Self::Outdoor,
            _ => Self::Other(trimmed.to_string()),
        }
    }
}

impl From<String> for Placement {
    fn from(s: String) -> Self {
        Self::from(s.as_str())
    }
}

impl From<Placement> for String {
    fn from(placement: Placement) -> Self {
        match placement {
            Placement::Other(value) => value,
            named => named.as_str().to_string(),
        }
    }
}

impl std::str::FromStr for Placement {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl AsRef<str> for Placement {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for Placement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A measured pollutant column.
///
/// The string form (`Display`, `FromStr`, serde) is the stable API key; the
/// literal source column header is available through [`Self::column_name`].
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
pub enum Pollutant {
    /// Collected PM2.5 filter mass.
    #[serde(rename = "pm25_mass")]
    #[strum(serialize = "pm25_mass")]
    Pm25Mass,
    /// PM2.5 concentration.
    #[serde(rename = "pm25")]
    #[strum(serialize = "pm25")]
    Pm25,
    /// Black carbon concentration.
    #[serde(rename = "bc")]
    #[strum(serialize = "bc")]
    BlackCarbon,
    /// Holmium content of the collected particulate.
    #[serde(rename = "ho")]
    #[strum(serialize = "ho")]
    Holmium,
    /// Ytterbium content of the collected particulate.
    #[serde(rename = "yb")]
    #[strum(serialize = "yb")]
    Ytterbium,
    /// Lutetium content of the collected particulate.
    #[serde(rename = "lu")]
    #[strum(serialize = "lu")]
    Lutetium,
    /// 1,1-dichloroethane mixing ratio.
    #[serde(rename = "dichloroethane")]
    #[strum(serialize = "dichloroethane")]
    Dichloroethane,
    /// n-hexane mixing ratio.
    #[serde(rename = "n_hexane")]
    #[strum(serialize = "n_hexane")]
    NHexane,
    /// Chloroform mixing ratio.
    #[serde(rename = "chloroform")]
    #[strum(serialize = "chloroform")]
    Chloroform,
}

impl Pollutant {
    /// Returns all variants in dashboard order. The first entry is the
    /// default selection.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[
            Self::Pm25Mass,
            Self::Pm25,
            Self::BlackCarbon,
            Self::Holmium,
            Self::Ytterbium,
            Self::Lutetium,
            Self::Dichloroethane,
            Self::NHexane,
            Self::Chloroform,
        ]
    }

    /// The literal column header in the source export, unit suffix included.
    #[must_use]
    pub const fn column_name(self) -> &'static str {
        match self {
            Self::Pm25Mass => "PM2.5 mass (mg)",
            Self::Pm25 => "PM2.5 (µg/m3)",
            Self::BlackCarbon => "BC (µg/m3)",
            Self::Holmium => "Ho (µg/g)",
            Self::Ytterbium => "Yb (µg/g)",
            Self::Lutetium => "Lu (µg/g)",
            Self::Dichloroethane => "Ethane, 1,1-dichloro-  (ppb)",
            Self::NHexane => "n-Hexane  (ppb)",
            Self::Chloroform => "Chloroform  (ppb)",
        }
    }

    /// Finds the pollutant whose column header matches `header`.
    ///
    /// Matching ignores whitespace runs and repairs the `Âµ` sequence that
    /// appears when UTF-8 text was decoded as Latin-1.
    #[must_use]
    pub fn from_column_header(header: &str) -> Option<Self> {
        let wanted = normalize_header(header);
        Self::all()
            .iter()
            .copied()
            .find(|p| normalize_header(p.column_name()) == wanted)
    }
}

/// Canonical form of a column header used for matching.
#[must_use]
pub fn normalize_header(header: &str) -> String {
    header
        .replace("Âµ", "µ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// A WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinates {
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
}

impl Coordinates {
    #[must_use]
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Measured values keyed by pollutant. Absent keys read as `0.0`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Measurements(BTreeMap<Pollutant, f64>);

impl Measurements {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a value. Non-finite values are stored as `0.0`.
    pub fn set(&mut self, pollutant: Pollutant, value: f64) {
        let value = if value.is_finite() { value } else { 0.0 };
        self.0.insert(pollutant, value);
    }

    /// Raw stored value, which may be negative.
    #[must_use]
    pub fn get(&self, pollutant: Pollutant) -> f64 {
        self.0.get(&pollutant).copied().unwrap_or(0.0)
    }

    /// Value clamped to `>= 0`, with non-finite values mapped to `0.0`.
    #[must_use]
    pub fn clamped(&self, pollutant: Pollutant) -> f64 {
        let value = self.get(pollutant);
        if value.is_finite() { value.max(0.0) } else { 0.0 }
    }
}

impl FromIterator<(Pollutant, f64)> for Measurements {
    fn from_iter<T: IntoIterator<Item = (Pollutant, f64)>>(iter: T) -> Self {
        let mut measurements = Self::new();
        for (pollutant, value) in iter {
            measurements.set(pollutant, value);
        }
        measurements
    }
}

/// One row of the monitoring export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Home identifier as written in the export.
    pub home_id: String,
    /// Measurement round.
    pub round: Round,
    /// Indoor or outdoor sampler.
    pub placement: Placement,
    /// Free-text street address used for geocoding.
    pub address: String,
    /// Sampler set-up date.
    pub set_up_date: Option<NaiveDate>,
    /// Sampler pick-up date.
    pub pick_up_date: Option<NaiveDate>,
    /// Sampling start time.
    pub start_time: Option<NaiveTime>,
    /// Sampling end time.
    pub end_time: Option<NaiveTime>,
    /// Pollutant measurements.
    pub measurements: Measurements,
    /// Geocoded location, if the address resolved.
    pub coordinates: Option<Coordinates>,
}

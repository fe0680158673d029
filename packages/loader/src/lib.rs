#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Loads the environmental monitoring export into an immutable
//! [`Dataset`].
//!
//! Loading happens once at startup in two passes:
//!
//! 1. [`read_samples`] parses the delimited export into typed [`Sample`]s,
//!    coercing missing measurements to zero.
//! 2. [`enrich::geocode_samples`] resolves every row's address through a
//!    [`Geocoder`], one request per row, in file order.

pub mod enrich;
pub mod parsing;
pub mod progress;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use exposure_map_geocoder::Geocoder;
use exposure_map_sample_models::{
    Dataset, Measurements, Placement, Pollutant, Round, Sample, normalize_header,
};
use thiserror::Error;

use crate::progress::ProgressCallback;

pub const HOME_ID_COLUMN: &str = "Home ID";
pub const ROUND_COLUMN: &str = "Round";
pub const PLACEMENT_COLUMN: &str = "Indoor or outdoor";
pub const ADDRESS_COLUMN: &str = "Address";
pub const SET_UP_DATE_COLUMN: &str = "Set up date";
pub const PICK_UP_DATE_COLUMN: &str = "Pick up date";
pub const START_TIME_COLUMN: &str = "Start time";
pub const END_TIME_COLUMN: &str = "End time";

/// Errors from loading the export.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The input file could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    Io {
        /// File that failed to open.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The CSV reader rejected the input.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A required column is absent from the header row.
    #[error("Missing required column {column:?}")]
    MissingColumn {
        /// Literal column name.
        column: &'static str,
    },

    /// A cell could not be parsed.
    #[error("Line {line}, column {column:?}: invalid value {value:?} ({reason})")]
    InvalidField {
        /// 1-based line number in the source file.
        line: u64,
        /// Column the cell belongs to.
        column: &'static str,
        /// The rejected cell text.
        value: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Parsed rows plus the pollutant columns that were found in the header.
#[derive(Debug, Clone)]
pub struct LoadedTable {
    /// One sample per data row, without coordinates.
    pub samples: Vec<Sample>,
    /// Pollutant columns present in the header.
    pub available: Vec<Pollutant>,
}

struct ColumnIndex {
    home_id: usize,
    round: usize,
    placement: usize,
    address: usize,
    set_up_date: usize,
    pick_up_date: usize,
    start_time: usize,
    end_time: usize,
    pollutants: Vec<(Pollutant, usize)>,
}

impl ColumnIndex {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, LoadError> {
        let normalized: Vec<String> = headers
            .iter()
            .map(|h| normalize_header(h).to_lowercase())
            .collect();

        let find = |column: &'static str| {
            let wanted = column.to_lowercase();
            normalized
                .iter()
                .position(|h| *h == wanted)
                .ok_or(LoadError::MissingColumn { column })
        };

        let home_id = find(HOME_ID_COLUMN)?;
        let round = find(ROUND_COLUMN)?;
        let placement = find(PLACEMENT_COLUMN)?;
        let address = find(ADDRESS_COLUMN)?;
        let set_up_date = find(SET_UP_DATE_COLUMN)?;
        let pick_up_date = find(PICK_UP_DATE_COLUMN)?;
        let start_time = find(START_TIME_COLUMN)?;
        let end_time = find(END_TIME_COLUMN)?;

        let mut pollutants = Vec::new();
        for (idx, header) in headers.iter().enumerate() {
            if let Some(pollutant) = Pollutant::from_column_header(header)
                && !pollutants.iter().any(|(p, _)| *p == pollutant)
            {
                pollutants.push((pollutant, idx));
            }
        }

        for pollutant in Pollutant::all() {
            if !pollutants.iter().any(|(p, _)| p == pollutant) {
                log::warn!(
                    "Pollutant column {:?} not found; it will render as empty",
                    pollutant.column_name()
                );
            }
        }

        Ok(Self {
            home_id,
            round,
            placement,
            address,
            set_up_date,
            pick_up_date,
            start_time,
            end_time,
            pollutants,
        })
    }
}

/// Parses the export text into samples.
///
/// # Errors
///
/// Returns [`LoadError`] if the header lacks a required column or a round,
/// date, or time cell is malformed. Unexpected placement values are kept
/// as [`Placement::Other`].
pub fn read_samples(text: &str, delimiter: u8) -> Result<LoadedTable, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = ColumnIndex::from_headers(&headers)?;

    let mut samples = Vec::new();

    for result in reader.records() {
        let record = result?;

        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }

        let line = record.position().map_or(0, csv::Position::line);
        samples.push(parse_record(&record, &columns, line)?);
    }

    log::info!(
        "Parsed {} samples ({} of {} pollutant columns present)",
        samples.len(),
        columns.pollutants.len(),
        Pollutant::all().len()
    );

    Ok(LoadedTable {
        samples,
        available: columns.pollutants.iter().map(|(p, _)| *p).collect(),
    })
}

fn parse_record(
    record: &csv::StringRecord,
    columns: &ColumnIndex,
    line: u64,
) -> Result<Sample, LoadError> {
    let cell = |idx: usize| record.get(idx).unwrap_or("").trim();

    let invalid = |column: &'static str, value: &str, reason: String| LoadError::InvalidField {
        line,
        column,
        value: value.to_string(),
        reason,
    };

    let round_raw = cell(columns.round);
    let round: Round = round_raw
        .parse()
        .map_err(|e: exposure_map_sample_models::InvalidRoundError| {
            invalid(ROUND_COLUMN, round_raw, e.to_string())
        })?;

    let placement = Placement::from(cell(columns.placement));
    if let Placement::Other(value) = &placement {
        log::debug!("Line {line}: keeping placement {value:?} as its own category");
    }

    let date = |idx: usize, column: &'static str| {
        let raw = cell(idx);
        parsing::parse_mmddyyyy(raw).map_err(|e| invalid(column, raw, e.to_string()))
    };
    let time = |idx: usize, column: &'static str| {
        let raw = cell(idx);
        parsing::parse_hhmm(raw).map_err(|e| invalid(column, raw, e.to_string()))
    };

    let measurements: Measurements = columns
        .pollutants
        .iter()
        .map(|(pollutant, idx)| (*pollutant, parsing::parse_measurement(cell(*idx))))
        .collect();

    Ok(Sample {
        home_id: cell(columns.home_id).to_string(),
        round,
        placement,
        address: cell(columns.address).to_string(),
        set_up_date: date(columns.set_up_date, SET_UP_DATE_COLUMN)?,
        pick_up_date: date(columns.pick_up_date, PICK_UP_DATE_COLUMN)?,
        start_time: time(columns.start_time, START_TIME_COLUMN)?,
        end_time: time(columns.end_time, END_TIME_COLUMN)?,
        measurements,
        coordinates: None,
    })
}

/// Reads and parses the export at `path`.
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be read or parsed.
pub fn read_samples_from_path(path: &Path, delimiter: u8) -> Result<LoadedTable, LoadError> {
    log::info!("Loading samples from {}", path.display());
    let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_samples(&parsing::decode_text(&bytes), delimiter)
}

/// Loads the export at `path`, geocodes every row, and freezes the result
/// into a [`Dataset`].
///
/// # Errors
///
/// Returns [`LoadError`] if the file cannot be read or parsed. Geocoding
/// failures are not errors; those samples keep no coordinates.
pub async fn load_dataset(
    path: &Path,
    delimiter: u8,
    geocoder: &dyn Geocoder,
    progress: &Arc<dyn ProgressCallback>,
) -> Result<Dataset, LoadError> {
    let LoadedTable {
        mut samples,
        available,
    } = read_samples_from_path(path, delimiter)?;

    enrich::geocode_samples(geocoder, &mut samples, progress).await;

    let dataset = Dataset::new(samples, available);
    log::info!(
        "Dataset ready: {} samples, {} geocoded, rounds {:?}",
        dataset.samples().len(),
        dataset.geocoded_count(),
        dataset.rounds().iter().map(|r| r.value()).collect::<Vec<_>>()
    );
    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    const HEADER: &str = "Home ID,Round,Indoor or outdoor,Address,Set up date,Pick up date,Start time,End time,PM2.5 mass (mg),PM2.5 (Âµg/m3),n-Hexane  (ppb)";

    fn csv(rows: &[&str]) -> String {
        let mut text = HEADER.to_string();
        for row in rows {
            text.push('\n');
            text.push_str(row);
        }
        text
    }

    #[test]
    fn parses_typed_rows() {
        let table = read_samples(
            &csv(&["H01,0,Indoor,1 Main St,1152024,01172024,09:30,17:45,0.12,8.5,1.1"]),
            b',',
        )
        .unwrap();
        assert_eq!(table.samples.len(), 1);
        let s = &table.samples[0];
        assert_eq!(s.home_id, "H01");
        assert_eq!(s.round, Round(0));
        assert_eq!(s.placement, Placement::Indoor);
        assert_eq!(s.address, "1 Main St");
        assert_eq!(s.set_up_date, NaiveDate::from_ymd_opt(2024, 1, 15));
        assert_eq!(s.pick_up_date, NaiveDate::from_ymd_opt(2024, 1, 17));
        assert_eq!(s.start_time, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(s.end_time, NaiveTime::from_hms_opt(17, 45, 0));
        assert!((s.measurements.get(Pollutant::Pm25) - 8.5).abs() < f64::EPSILON);
        assert!((s.measurements.get(Pollutant::NHexane) - 1.1).abs() < f64::EPSILON);
        assert!(s.coordinates.is_none());
    }

    #[test]
    fn reports_available_pollutants() {
        let table = read_samples(&csv(&[]), b',').unwrap();
        assert_eq!(
            table.available,
            vec![Pollutant::Pm25Mass, Pollutant::Pm25, Pollutant::NHexane]
        );
    }

    #[test]
    fn missing_measurements_become_zero() {
        let table = read_samples(
            &csv(&["H02,1,Outdoor,2 Main St,,,,,,NaN,-0.4"]),
            b',',
        )
        .unwrap();
        let s = &table.samples[0];
        assert!(s.measurements.get(Pollutant::Pm25Mass).abs() < f64::EPSILON);
        assert!(s.measurements.get(Pollutant::Pm25).abs() < f64::EPSILON);
        assert!((s.measurements.get(Pollutant::NHexane) - -0.4).abs() < f64::EPSILON);
        assert!(s.measurements.get(Pollutant::Chloroform).abs() < f64::EPSILON);
        assert!(s.set_up_date.is_none());
    }

    #[test]
    fn skips_blank_rows() {
        let table = read_samples(
            &csv(&[
                "H01,0,Indoor,1 Main St,,,,,1,2,3",
                ",,,,,,,,,,",
                "H02,0,Indoor,2 Main St,,,,,1,2,3",
            ]),
            b',',
        )
        .unwrap();
        assert_eq!(table.samples.len(), 2);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let err = read_samples("Home ID,Round,Address\nH01,0,x", b',').unwrap_err();
        assert!(matches!(
            err,
            LoadError::MissingColumn {
                column: PLACEMENT_COLUMN
            }
        ));
    }

    #[test]
    fn malformed_round_names_line_and_column() {
        let err = read_samples(
            &csv(&[
                "H01,0,Indoor,1 Main St,,,,,1,2,3",
                "H02,second,Indoor,2 Main St,,,,,1,2,3",
            ]),
            b',',
        )
        .unwrap_err();
        match err {
            LoadError::InvalidField {
                line,
                column,
                value,
                ..
            } => {
                assert_eq!(line, 3);
                assert_eq!(column, ROUND_COLUMN);
                assert_eq!(value, "second");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unexpected_placement_is_kept_as_its_own_category() {
        let table = read_samples(
            &csv(&[
                "H01,0,Indoor,1 Main St,,,,,1,2,3",
                "H02,0,Field blank,2 Main St,,,,,1,2,3",
            ]),
            b',',
        )
        .unwrap();
        assert_eq!(table.samples.len(), 2);
        assert_eq!(table.samples[0].placement, Placement::Indoor);
        assert_eq!(
            table.samples[1].placement,
            Placement::Other("Field blank".to_string())
        );
    }

    #[test]
    fn missing_file_error_names_the_path() {
        let path = Path::new("/nonexistent/exposure/rawDump_1.csv");
        let err = read_samples_from_path(path, b',').unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(err.to_string().contains("/nonexistent/exposure/rawDump_1.csv"));
    }

    #[test]
    fn honours_custom_delimiter() {
        let text = "Home ID;Round;Indoor or outdoor;Address;Set up date;Pick up date;Start time;End time;BC (µg/m3)\nH01;2;Outdoor;1 Main St, Pittsburgh;;;;;0.7";
        let table = read_samples(text, b';').unwrap();
        let s = &table.samples[0];
        assert_eq!(s.address, "1 Main St, Pittsburgh");
        assert!((s.measurements.get(Pollutant::BlackCarbon) - 0.7).abs() < f64::EPSILON);
    }

    #[test]
    fn reads_latin1_file() {
        let dir = std::env::temp_dir().join(format!("exposure_map_loader_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("latin1.csv");
        let mut bytes = b"Home ID,Round,Indoor or outdoor,Address,Set up date,Pick up date,Start time,End time,PM2.5 (\xb5g/m3)\n".to_vec();
        bytes.extend_from_slice(b"H01,0,Indoor,1 Main St,,,,,4.5\n");
        std::fs::write(&path, bytes).unwrap();

        let table = read_samples_from_path(&path, b',').unwrap();
        assert_eq!(table.available, vec![Pollutant::Pm25]);
        assert!((table.samples[0].measurements.get(Pollutant::Pm25) - 4.5).abs() < f64::EPSILON);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = read_samples_from_path(Path::new("/nonexistent/rawDump_1.csv"), b',')
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}

//! Cell-level parsing for the monitoring export.

use std::borrow::Cow;

use chrono::{NaiveDate, NaiveTime};

/// Decodes raw file bytes. Valid UTF-8 is used as-is (minus a leading BOM);
/// anything else is read as ISO-8859-1, where every byte maps to the code
/// point of the same value.
#[must_use]
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    match std::str::from_utf8(bytes) {
        Ok(text) => Cow::Borrowed(text.strip_prefix('\u{feff}').unwrap_or(text)),
        Err(_) => {
            log::debug!("Input is not valid UTF-8, decoding as ISO-8859-1");
            Cow::Owned(bytes.iter().map(|&b| char::from(b)).collect())
        }
    }
}

/// Parses an `MMDDYYYY` date, left-padding to eight digits first so that
/// `1152024` reads as January 15, 2024. Empty cells yield `Ok(None)`.
///
/// # Errors
///
/// Returns an error if the cell is non-empty but not a valid date.
pub fn parse_mmddyyyy(s: &str) -> Result<Option<NaiveDate>, chrono::ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    // Spreadsheets sometimes write the number as a float.
    let digits = trimmed.strip_suffix(".0").unwrap_or(trimmed);
    let padded = format!("{digits:0>8}");
    NaiveDate::parse_from_str(&padded, "%m%d%Y").map(Some)
}

/// Parses an `HH:MM` (or `HH:MM:SS`) time. Empty cells yield `Ok(None)`.
///
/// # Errors
///
/// Returns an error if the cell is non-empty but not a valid time.
pub fn parse_hhmm(s: &str) -> Result<Option<NaiveTime>, chrono::ParseError> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M:%S"))
        .map(Some)
}

/// Parses a measurement cell. Empty, non-numeric, and non-finite cells
/// become `0.0`; negative values are kept as written.
#[must_use]
pub fn parse_measurement(s: &str) -> f64 {
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_utf8_bom() {
        assert_eq!(decode_text(b"\xef\xbb\xbfHome ID"), "Home ID");
    }

    #[test]
    fn falls_back_to_latin1() {
        let text = decode_text(b"PM2.5 (\xb5g/m3)");
        assert_eq!(text, "PM2.5 (µg/m3)");
    }

    #[test]
    fn pads_short_dates() {
        assert_eq!(
            parse_mmddyyyy("1152024").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
        assert_eq!(
            parse_mmddyyyy("11032023").unwrap(),
            NaiveDate::from_ymd_opt(2023, 11, 3)
        );
        assert_eq!(
            parse_mmddyyyy("1152024.0").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
        );
    }

    #[test]
    fn empty_date_is_none() {
        assert_eq!(parse_mmddyyyy("  ").unwrap(), None);
    }

    #[test]
    fn rejects_invalid_date() {
        assert!(parse_mmddyyyy("13452024").is_err());
        assert!(parse_mmddyyyy("not-a-date").is_err());
    }

    #[test]
    fn parses_times() {
        assert_eq!(parse_hhmm("09:30").unwrap(), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(
            parse_hhmm("17:05:10").unwrap(),
            NaiveTime::from_hms_opt(17, 5, 10)
        );
        assert_eq!(parse_hhmm("").unwrap(), None);
        assert!(parse_hhmm("25:00").is_err());
    }

    #[test]
    fn coerces_missing_measurements_to_zero() {
        assert!(parse_measurement("").abs() < f64::EPSILON);
        assert!(parse_measurement("n/a").abs() < f64::EPSILON);
        assert!(parse_measurement("NaN").abs() < f64::EPSILON);
        assert!((parse_measurement(" 12.5 ") - 12.5).abs() < f64::EPSILON);
        assert!((parse_measurement("-0.3") - -0.3).abs() < f64::EPSILON);
    }
}

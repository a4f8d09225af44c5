/// Range-validated newtype wrappers for the numeric domains the
/// specifications constrain.
///
/// Each newtype validates at construction via `TryFrom` and re-runs the
/// same validation in its `Deserialize` impl, so out-of-range values cannot
/// enter the type system from untrusted documents. Once constructed the
/// inner value is immutable.
///
/// The XML binding layer never propagates a range violation as a parse
/// failure; it records a validation issue and leaves the field absent.
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors produced when constructing a validated newtype from an invalid value.
#[derive(Debug, Clone, PartialEq)]
pub enum NewtypeError {
    /// A numeric value fell outside the permitted closed interval.
    OutOfRange {
        /// Name of the type that rejected the input.
        type_name: &'static str,
        /// Lower bound of the permitted interval.
        min: f64,
        /// Upper bound of the permitted interval.
        max: f64,
        /// The value that was rejected.
        got: f64,
    },
    /// A string did not match the expected lexical form.
    InvalidFormat {
        /// Name of the type that rejected the input.
        type_name: &'static str,
        /// A human-readable description of the expected form.
        expected: &'static str,
        /// The input that was rejected.
        got: String,
    },
}

impl fmt::Display for NewtypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfRange {
                type_name,
                min,
                max,
                got,
            } => write!(f, "invalid {type_name}: {got} outside [{min}, {max}]"),
            Self::InvalidFormat {
                type_name,
                expected,
                got,
            } => write!(f, "invalid {type_name}: expected {expected}, got {got:?}"),
        }
    }
}

impl std::error::Error for NewtypeError {}

// ---------------------------------------------------------------------------
// Measure
// ---------------------------------------------------------------------------

/// A normalized measure in the closed interval `[-1.0, 1.0]`.
///
/// Used for `minNormalizedMeasure`, rule condition `measureThreshold`s, and
/// anywhere else IMSSS speaks of normalized scores. Non-finite values are
/// rejected.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct Measure(f64);

impl Measure {
    /// Constructs a [`Measure`], rejecting values outside `[-1.0, 1.0]`.
    pub fn new(value: f64) -> Result<Self, NewtypeError> {
        if value.is_finite() && (-1.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(NewtypeError::OutOfRange {
                type_name: "Measure",
                min: -1.0,
                max: 1.0,
                got: value,
            })
        }
    }

    /// Returns the inner value.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Measure {
    type Error = NewtypeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for Measure {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// ObjectiveWeight
// ---------------------------------------------------------------------------

/// A weight or percentage in the closed interval `[0.0, 1.0]`.
///
/// Used for `objectiveMeasureWeight`, rollup `minimumPercent`, cmi5
/// `masteryScore`, and `minProgressMeasure`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
#[serde(transparent)]
pub struct ObjectiveWeight(f64);

impl ObjectiveWeight {
    /// Constructs an [`ObjectiveWeight`], rejecting values outside `[0.0, 1.0]`.
    pub fn new(value: f64) -> Result<Self, NewtypeError> {
        if value.is_finite() && (0.0..=1.0).contains(&value) {
            Ok(Self(value))
        } else {
            Err(NewtypeError::OutOfRange {
                type_name: "ObjectiveWeight",
                min: 0.0,
                max: 1.0,
                got: value,
            })
        }
    }

    /// Returns the inner value.
    pub fn value(self) -> f64 {
        self.0
    }

    /// The default `objectiveMeasureWeight` mandated by IMSSS: `1.0`.
    pub fn full() -> Self {
        Self(1.0)
    }
}

impl TryFrom<f64> for ObjectiveWeight {
    type Error = NewtypeError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for ObjectiveWeight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ObjectiveWeight {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Self::new(value).map_err(de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Iso8601Duration
// ---------------------------------------------------------------------------

/// A non-negative duration, parsed from either the ISO-8601 form
/// (`P1DT2H30M5.5S`) used by SCORM 2004 and cmi5, or the clock form
/// (`HH:MM:SS[.cs]`) used by AICC descriptor files and SCORM 1.2 adlcp
/// attributes.
///
/// Serializes canonically as ISO-8601. Calendar components (`Y`, month)
/// are accepted with the fixed conversions the original guidelines use
/// (a year is 365 days, a month 30).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Iso8601Duration(Duration);

/// Upper bound on accepted durations (about 30 000 years). Values past
/// this are data errors, and rejecting them keeps the f64 → `Duration`
/// conversion total.
const MAX_DURATION_SECONDS: f64 = 1e12;

impl Iso8601Duration {
    /// Wraps a [`Duration`] directly.
    pub fn from_duration(duration: Duration) -> Self {
        Self(duration)
    }

    /// Returns the wrapped [`Duration`].
    pub fn as_duration(self) -> Duration {
        self.0
    }

    /// Saturating sum of two durations.
    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parses either accepted lexical form, dispatching on the leading `P`.
    pub fn parse(text: &str) -> Result<Self, NewtypeError> {
        let trimmed = text.trim();
        if trimmed.starts_with('P') {
            Self::parse_iso8601(trimmed)
        } else {
            Self::parse_clock(trimmed)
        }
    }

    /// Parses the ISO-8601 `PnYnMnDTnHnMnS` form.
    pub fn parse_iso8601(text: &str) -> Result<Self, NewtypeError> {
        let invalid = || NewtypeError::InvalidFormat {
            type_name: "Iso8601Duration",
            expected: "PnYnMnDTnHnMnS",
            got: text.to_owned(),
        };

        let rest = text.strip_prefix('P').ok_or_else(invalid)?;
        if rest.is_empty() {
            return Err(invalid());
        }

        let mut seconds: f64 = 0.0;
        let mut in_time = false;
        let mut saw_component = false;
        let mut number = String::new();

        for ch in rest.chars() {
            match ch {
                'T' => {
                    if in_time || !number.is_empty() {
                        return Err(invalid());
                    }
                    in_time = true;
                }
                '0'..='9' | '.' => number.push(ch),
                'Y' | 'D' | 'H' | 'S' | 'M' => {
                    let value: f64 = number.parse().map_err(|_| invalid())?;
                    number.clear();
                    saw_component = true;
                    let factor = match (ch, in_time) {
                        ('Y', false) => 365.0 * 86_400.0,
                        ('M', false) => 30.0 * 86_400.0,
                        ('D', false) => 86_400.0,
                        ('H', true) => 3_600.0,
                        ('M', true) => 60.0,
                        ('S', true) => 1.0,
                        _ => return Err(invalid()),
                    };
                    seconds += value * factor;
                }
                _ => return Err(invalid()),
            }
        }

        if !number.is_empty() || !saw_component {
            return Err(invalid());
        }
        if !(0.0..=MAX_DURATION_SECONDS).contains(&seconds) {
            return Err(invalid());
        }
        Ok(Self(Duration::from_secs_f64(seconds)))
    }

    /// Parses the AICC clock form `HHHH:MM:SS[.cs]`.
    ///
    /// The hour field may exceed two digits; minutes and seconds must be
    /// below 60.
    pub fn parse_clock(text: &str) -> Result<Self, NewtypeError> {
        let invalid = || NewtypeError::InvalidFormat {
            type_name: "Iso8601Duration",
            expected: "HH:MM:SS[.cs]",
            got: text.to_owned(),
        };

        let mut parts = text.split(':');
        let (hours, minutes, seconds) = match (parts.next(), parts.next(), parts.next(), parts.next())
        {
            (Some(h), Some(m), Some(s), None) => (h, m, s),
            _ => return Err(invalid()),
        };

        let hours: u64 = hours.trim().parse().map_err(|_| invalid())?;
        let minutes: u64 = minutes.trim().parse().map_err(|_| invalid())?;
        let seconds: f64 = seconds.trim().parse().map_err(|_| invalid())?;
        if minutes >= 60 || !(0.0..60.0).contains(&seconds) {
            return Err(invalid());
        }

        let whole = hours
            .checked_mul(3_600)
            .and_then(|h| h.checked_add(minutes * 60))
            .ok_or_else(invalid)?;
        let total = whole as f64 + seconds;
        if !(0.0..=MAX_DURATION_SECONDS).contains(&total) {
            return Err(invalid());
        }
        Ok(Self(Duration::from_secs_f64(total)))
    }
}

impl fmt::Display for Iso8601Duration {
    /// Renders the canonical ISO-8601 form, e.g. `PT1H30M5.5S` or `PT0S`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.0.as_secs_f64();
        if total == 0.0 {
            return f.write_str("PT0S");
        }

        let whole = total as u64;
        let frac = total - whole as f64;
        let days = whole / 86_400;
        let hours = (whole % 86_400) / 3_600;
        let minutes = (whole % 3_600) / 60;
        let secs = whole % 60;

        f.write_str("P")?;
        if days > 0 {
            write!(f, "{days}D")?;
        }
        if hours > 0 || minutes > 0 || secs > 0 || frac > 0.0 {
            f.write_str("T")?;
            if hours > 0 {
                write!(f, "{hours}H")?;
            }
            if minutes > 0 {
                write!(f, "{minutes}M")?;
            }
            if frac > 0.0 {
                // Centisecond precision is what AICC clock values carry.
                let s = secs as f64 + frac;
                let rounded = (s * 100.0).round() / 100.0;
                write!(f, "{rounded}S")?;
            } else if secs > 0 {
                write!(f, "{secs}S")?;
            }
        }
        Ok(())
    }
}

impl Serialize for Iso8601Duration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Iso8601Duration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use super::*;

    #[test]
    fn measure_accepts_bounds() {
        assert!(Measure::new(-1.0).is_ok());
        assert!(Measure::new(0.0).is_ok());
        assert!(Measure::new(1.0).is_ok());
    }

    #[test]
    fn measure_rejects_out_of_range() {
        assert!(Measure::new(1.0001).is_err());
        assert!(Measure::new(-1.5).is_err());
        assert!(Measure::new(f64::NAN).is_err());
        assert!(Measure::new(f64::INFINITY).is_err());
    }

    #[test]
    fn measure_deserialize_revalidates() {
        let ok: Measure = serde_json::from_str("0.75").expect("in range");
        assert_eq!(ok.value(), 0.75);
        assert!(serde_json::from_str::<Measure>("5.0").is_err());
    }

    #[test]
    fn weight_rejects_negative() {
        assert!(ObjectiveWeight::new(0.0).is_ok());
        assert!(ObjectiveWeight::new(1.0).is_ok());
        assert!(ObjectiveWeight::new(-0.01).is_err());
        assert!(ObjectiveWeight::new(1.01).is_err());
    }

    #[test]
    fn duration_iso_forms() {
        let d = Iso8601Duration::parse("PT1H30M").expect("parses");
        assert_eq!(d.as_duration(), Duration::from_secs(5_400));

        let d = Iso8601Duration::parse("P1DT2H").expect("parses");
        assert_eq!(d.as_duration(), Duration::from_secs(93_600));

        let d = Iso8601Duration::parse("PT5.5S").expect("parses");
        assert_eq!(d.as_duration(), Duration::from_millis(5_500));

        assert!(Iso8601Duration::parse("P").is_err());
        assert!(Iso8601Duration::parse("PT").is_err());
        assert!(Iso8601Duration::parse("1H").is_err());
    }

    #[test]
    fn duration_clock_forms() {
        let d = Iso8601Duration::parse("01:30:00").expect("parses");
        assert_eq!(d.as_duration(), Duration::from_secs(5_400));

        let d = Iso8601Duration::parse("100:00:30.5").expect("parses");
        assert_eq!(d.as_duration(), Duration::from_secs_f64(360_030.5));

        assert!(Iso8601Duration::parse("1:99:00").is_err());
        assert!(Iso8601Duration::parse("1:00").is_err());
    }

    #[test]
    fn duration_display_canonical() {
        let d = Iso8601Duration::parse("01:30:00").expect("parses");
        assert_eq!(d.to_string(), "PT1H30M");

        let d = Iso8601Duration::parse("P2DT4H0M30S").expect("parses");
        assert_eq!(d.to_string(), "P2DT4H30S");

        assert_eq!(Iso8601Duration::default().to_string(), "PT0S");

        let d = Iso8601Duration::parse("PT5.5S").expect("parses");
        assert_eq!(d.to_string(), "PT5.5S");
    }

    #[test]
    fn duration_display_reparses() {
        for input in ["PT90M", "P1DT1H1M1S", "00:00:59", "36:00:00"] {
            let d = Iso8601Duration::parse(input).expect("parses");
            let round = Iso8601Duration::parse(&d.to_string()).expect("reparses");
            assert_eq!(d, round);
        }
    }
}

use crate::error::{KitError, KitResult};
use regex::Regex;
use std::sync::LazyLock;

static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:(\d+):)?(\d+):)?(\d+(?:\.\d+)?)$").expect("timestamp pattern compiles")
});

/// Parse `SS[.fff]`, `MM:SS[.fff]` or `HH:MM:SS[.fff]` into seconds.
///
/// A bare seconds value may exceed 59 (`"90"` is a minute and a half); once a
/// colon is present both minutes and seconds must stay below 60.
pub fn parse(text: &str) -> KitResult<f64> {
    let trimmed = text.trim();
    let caps = TIMESTAMP_RE.captures(trimmed).ok_or_else(|| {
        KitError::InvalidTimestamp(format!(
            "`{trimmed}` is not SS[.fff], MM:SS[.fff] or HH:MM:SS[.fff]"
        ))
    })?;

    let field = |idx: usize| -> KitResult<f64> {
        match caps.get(idx) {
            Some(m) => m
                .as_str()
                .parse::<f64>()
                .map_err(|_| KitError::InvalidTimestamp(format!("`{trimmed}` has a bad field"))),
            None => Ok(0.0),
        }
    };

    let hours = field(1)?;
    let minutes = field(2)?;
    let seconds = field(3)?;

    if caps.get(2).is_some() {
        if minutes >= 60.0 {
            return Err(KitError::InvalidTimestamp(format!(
                "`{trimmed}`: minutes must be below 60"
            )));
        }
        if seconds >= 60.0 {
            return Err(KitError::InvalidTimestamp(format!(
                "`{trimmed}`: seconds must be below 60"
            )));
        }
    }

    let total = hours * 3600.0 + minutes * 60.0 + seconds;
    if !total.is_finite() || total < 0.0 {
        return Err(KitError::InvalidTimestamp(format!(
            "`{trimmed}` does not describe a non-negative time"
        )));
    }
    Ok(total)
}

/// Canonical `HH:MM:SS.mmm` rendering, rounded to the millisecond.
pub fn format_hms(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hh = total_ms / 3_600_000;
    let mm = (total_ms / 60_000) % 60;
    let ss = (total_ms / 1000) % 60;
    let ms = total_ms % 1000;
    format!("{hh:02}:{mm:02}:{ss:02}.{ms:03}")
}

/// What to do when a requested end lies past the end of the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EndPolicy {
    #[default]
    Clamp,
    Strict,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeRange {
    pub start_seconds: f64,
    pub end_seconds: f64,
}

impl TimeRange {
    pub fn new(start_seconds: f64, end_seconds: f64) -> KitResult<Self> {
        if start_seconds < 0.0 {
            return Err(KitError::InvalidTimestamp(format!(
                "start ({start_seconds:.3}s) must not be negative"
            )));
        }
        if end_seconds <= start_seconds {
            return Err(KitError::InvalidTimestamp(format!(
                "end ({end_seconds:.3}s) must be greater than start ({start_seconds:.3}s)"
            )));
        }
        Ok(Self {
            start_seconds,
            end_seconds,
        })
    }

    pub fn parse(start: &str, end: &str) -> KitResult<Self> {
        Self::new(parse(start)?, parse(end)?)
    }

    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }

    /// Fit the range into a source of `source_seconds`. A non-positive source
    /// duration means "unknown" and leaves the range untouched.
    pub fn fit_to(self, source_seconds: f64, policy: EndPolicy) -> KitResult<Self> {
        if source_seconds <= 0.0 {
            return Ok(self);
        }
        if self.start_seconds >= source_seconds {
            return Err(KitError::InvalidTimestamp(format!(
                "start ({:.3}s) exceeds input duration ({source_seconds:.3}s)",
                self.start_seconds
            )));
        }
        if self.end_seconds > source_seconds {
            return match policy {
                EndPolicy::Clamp => {
                    tracing::warn!(
                        requested = self.end_seconds,
                        source = source_seconds,
                        "end past input duration, clamping"
                    );
                    Self::new(self.start_seconds, source_seconds)
                }
                EndPolicy::Strict => Err(KitError::InvalidTimestamp(format!(
                    "end ({:.3}s) exceeds input duration ({source_seconds:.3}s)",
                    self.end_seconds
                ))),
            };
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepted_forms() {
        assert_eq!(parse("10").unwrap(), 10.0);
        assert_eq!(parse("12.5").unwrap(), 12.5);
        assert_eq!(parse("90").unwrap(), 90.0);
        assert_eq!(parse("01:05").unwrap(), 65.0);
        assert_eq!(parse("00:00:10.5").unwrap(), 10.5);
        assert_eq!(parse("1:02:03").unwrap(), 3723.0);
        assert_eq!(parse("  00:01:00  ").unwrap(), 60.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["99:99", "", "abc", "-5", "1:2:3:4", "00:60", "01:60:00", "10.", ":10"] {
            assert!(
                matches!(parse(bad), Err(KitError::InvalidTimestamp(_))),
                "expected `{bad}` to be rejected"
            );
        }
    }

    #[test]
    fn test_format_hms() {
        assert_eq!(format_hms(0.0), "00:00:00.000");
        assert_eq!(format_hms(65.25), "00:01:05.250");
        assert_eq!(format_hms(3723.0), "01:02:03.000");
        assert_eq!(format_hms(59.9996), "00:01:00.000");
        assert_eq!(format_hms(-4.0), "00:00:00.000");
    }

    #[test]
    fn test_round_trip_through_formatter() {
        for text in ["00:00:00.000", "00:00:10.500", "01:59:59.999", "12:00:30.125"] {
            let secs = parse(text).unwrap();
            assert_eq!(format_hms(secs), text);
        }
    }

    #[test]
    fn test_time_range_from_strings() {
        let range = TimeRange::parse("00:00:05", "00:00:15").unwrap();
        assert_eq!(range.start_seconds, 5.0);
        assert_eq!(range.end_seconds, 15.0);
        assert_eq!(range.duration(), 10.0);
    }

    #[test]
    fn test_time_range_requires_end_after_start() {
        assert!(TimeRange::new(10.0, 10.0).is_err());
        assert!(TimeRange::new(10.0, 5.0).is_err());
        assert!(TimeRange::new(-1.0, 5.0).is_err());
    }

    #[test]
    fn test_fit_to_clamps_or_rejects() {
        let range = TimeRange::new(50.0, 75.0).unwrap();
        let clamped = range.fit_to(60.0, EndPolicy::Clamp).unwrap();
        assert_eq!(clamped.end_seconds, 60.0);
        assert!(range.fit_to(60.0, EndPolicy::Strict).is_err());

        let past = TimeRange::new(61.0, 70.0).unwrap();
        assert!(past.fit_to(60.0, EndPolicy::Clamp).is_err());

        let unknown = range.fit_to(0.0, EndPolicy::Strict).unwrap();
        assert_eq!(unknown, range);
    }
}

//! Shared utility functions for SVM crates.

/// Date utility functions
pub mod dates {
    use anyhow::anyhow;
    use chrono::{DateTime, Datelike, Months, NaiveDate, NaiveDateTime};

    /// Format a NaiveDate as "YYYY-MM-DD"
    pub fn format_date(date: &NaiveDate) -> String {
        date.format("%Y-%m-%d").to_string()
    }

    /// Format a NaiveDate as "YYYY-MM", the header style of monthly anomaly tables
    pub fn format_month(date: &NaiveDate) -> String {
        date.format("%Y-%m").to_string()
    }

    /// Parse a date string in "YYYY-MM-DD" format
    pub fn parse_date(s: &str) -> anyhow::Result<NaiveDate> {
        Ok(NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")?)
    }

    /// Parse a timestamp into a naive UTC datetime.
    ///
    /// Accepts RFC 3339 (`2023-10-05T12:00:00Z`), ISO 8601 without offset
    /// (with `T` or a space), and bare `YYYY-MM-DD` dates (midnight).
    pub fn parse_datetime(s: &str) -> anyhow::Result<NaiveDateTime> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Ok(dt.naive_utc());
        }
        if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%:z") {
            return Ok(dt.naive_utc());
        }
        for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, format) {
                return Ok(dt);
            }
        }
        let date = parse_date(s).map_err(|_| anyhow!("unrecognized timestamp: {s}"))?;
        date.and_hms_opt(0, 0, 0)
            .ok_or_else(|| anyhow!("unrecognized timestamp: {s}"))
    }

    /// Parse a table header into a date.
    ///
    /// Monthly headers (`YYYY-MM`) resolve to the first of the month; any
    /// timestamp accepted by [`parse_datetime`] resolves to its calendar date.
    pub fn parse_header_date(s: &str) -> anyhow::Result<NaiveDate> {
        let s = s.trim();
        if s.len() == 7 {
            return Ok(NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d")?);
        }
        Ok(parse_datetime(s)?.date())
    }

    /// First day of the month containing `date`.
    pub fn first_of_month(date: &NaiveDate) -> NaiveDate {
        date.with_day(1).unwrap_or(*date)
    }

    /// Add a number of calendar months to a first-of-month date.
    pub fn add_months(date: &NaiveDate, months: u32) -> NaiveDate {
        date.checked_add_months(Months::new(months))
            .unwrap_or(NaiveDate::MAX)
    }

    /// Signed number of calendar months from `start` to `end`, ignoring days.
    pub fn months_between(start: &NaiveDate, end: &NaiveDate) -> i32 {
        (end.year() - start.year()) * 12 + end.month() as i32 - start.month() as i32
    }

}

/// Statistics over series that may contain missing values.
///
/// Missing values are `None` (or NaN, which is treated the same way) and are
/// skipped rather than counted as zero.
pub mod stats {
    /// Drop missing and NaN entries.
    pub fn present(values: &[Option<f64>]) -> Vec<f64> {
        values
            .iter()
            .filter_map(|v| v.filter(|x| !x.is_nan()))
            .collect()
    }

    /// Arithmetic mean, `None` for an empty slice.
    pub fn mean(values: &[f64]) -> Option<f64> {
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Mean of the present values.
    pub fn mean_present(values: &[Option<f64>]) -> Option<f64> {
        mean(&present(values))
    }

    /// Sample standard deviation (n - 1 denominator), `None` below two values.
    pub fn sample_std(values: &[f64]) -> Option<f64> {
        if values.len() < 2 {
            return None;
        }
        let m = mean(values)?;
        let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
        Some((ss / (values.len() - 1) as f64).sqrt())
    }

    /// Sum of the present values; `None` when nothing is present.
    pub fn sum_present<I>(values: I) -> Option<f64>
    where
        I: IntoIterator<Item = Option<f64>>,
    {
        values
            .into_iter()
            .flatten()
            .filter(|v| !v.is_nan())
            .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
    }

    /// Max minus min of the present values.
    pub fn range_present(values: &[Option<f64>]) -> Option<f64> {
        let p = present(values);
        if p.is_empty() {
            return None;
        }
        let max = p.iter().cloned().fold(f64::MIN, f64::max);
        let min = p.iter().cloned().fold(f64::MAX, f64::min);
        Some(max - min)
    }

    /// Subtract the mean of the present values from every present value.
    pub fn recenter(values: &mut [Option<f64>]) {
        if let Some(m) = mean_present(values) {
            for v in values.iter_mut().flatten() {
                *v -= m;
            }
        }
    }

    /// Pearson correlation coefficient.
    ///
    /// `None` when the lengths differ, fewer than two pairs exist, or either
    /// series has zero variance.
    pub fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
        if x.len() != y.len() || x.len() < 2 {
            return None;
        }
        let mx = mean(x)?;
        let my = mean(y)?;
        let mut sxy = 0.0;
        let mut sxx = 0.0;
        let mut syy = 0.0;
        for (a, b) in x.iter().zip(y) {
            sxy += (a - mx) * (b - my);
            sxx += (a - mx).powi(2);
            syy += (b - my).powi(2);
        }
        if sxx == 0.0 || syy == 0.0 {
            return None;
        }
        let r = sxy / (sxx * syy).sqrt();
        if r.is_nan() {
            None
        } else {
            Some(r)
        }
    }

}

/// Region codes embedded in file names.
///
/// MERIT-Basins derived files carry `pfaf_NN`, SWORD reach files carry `hbNN`.
pub mod pfaf {
    /// Marker preceding the region code in MERIT-Basins style file names.
    pub const PFAF_MARKER: &str = "pfaf_";
    /// Marker preceding the region code in SWORD reach file names.
    pub const SWORD_MARKER: &str = "hb";

    /// Two-digit region code following `marker`, e.g. `"11"` for
    /// `V_anom_pfaf_11_2023.csv`.
    pub fn code_after(name: &str, marker: &str) -> Option<String> {
        name.match_indices(marker).find_map(|(i, _)| {
            let rest = &name[i + marker.len()..];
            let code: String = rest.chars().take(2).collect();
            let next_is_digit = rest.chars().nth(2).is_some_and(|c| c.is_ascii_digit());
            if code.len() == 2 && code.chars().all(|c| c.is_ascii_digit()) && !next_is_digit {
                Some(code)
            } else {
                None
            }
        })
    }

    /// Pfaf code of a MERIT-Basins style file name.
    pub fn pfaf_code(name: &str) -> Option<String> {
        code_after(name, PFAF_MARKER)
    }

    /// True if `name` carries `marker` immediately followed by `region`.
    pub fn names_region(name: &str, marker: &str, region: i64) -> bool {
        code_after(name, marker)
            .and_then(|c| c.parse::<i64>().ok())
            .is_some_and(|c| c == region)
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_pfaf_code() {
            assert_eq!(pfaf_code("V_anom_pfaf_11_2023-10-01.csv").as_deref(), Some("11"));
            assert_eq!(pfaf_code("/data/sword_to_mb_pfaf_74_translate.csv").as_deref(), Some("74"));
            assert_eq!(pfaf_code("no_region.csv"), None);
            assert_eq!(pfaf_code("pfaf_123.csv"), None);
        }

        #[test]
        fn test_names_region() {
            assert!(names_region("na_sword_reaches_hb74_v16.csv", SWORD_MARKER, 74));
            assert!(!names_region("na_sword_reaches_hb74_v16.csv", SWORD_MARKER, 7));
            assert!(names_region("riv_pfaf_11_MERIT.csv", PFAF_MARKER, 11));
        }
    }
}

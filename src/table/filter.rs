use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};

use super::TableRow;

/// Status value that disables the status filter.
pub const VIEW_ALL: &str = "View All";

/// Range between the starts of two days, bounds included. A row later in the
/// day of `to` falls outside. Only active when both bounds are set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    pub fn is_active(&self) -> bool {
        self.from.is_some() && self.to.is_some()
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        match (self.from, self.to) {
            (Some(from), Some(to)) => {
                from.and_time(NaiveTime::MIN) <= instant && instant <= to.and_time(NaiveTime::MIN)
            }
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub free_text: String,
    pub status: String,
    pub date_range: DateRange,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            free_text: String::new(),
            status: VIEW_ALL.to_string(),
            date_range: DateRange::default(),
        }
    }
}

impl FilterState {
    pub fn is_status_active(&self) -> bool {
        let status = self.status.trim();
        !status.is_empty() && !status.eq_ignore_ascii_case(VIEW_ALL)
    }

    pub fn matches<T: TableRow>(&self, row: &T) -> bool {
        matches_free_text(row, &self.free_text)
            && matches_status(row, &self.status)
            && matches_date_range(row, &self.date_range)
    }
}

pub fn matches_free_text<T: TableRow>(row: &T, needle: &str) -> bool {
    let needle = needle.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    row.search_fields()
        .iter()
        .any(|field| field.to_lowercase().contains(&needle))
}

pub fn matches_status<T: TableRow>(row: &T, status: &str) -> bool {
    let status = status.trim();
    if status.is_empty() || status.eq_ignore_ascii_case(VIEW_ALL) {
        return true;
    }
    row.status()
        .map(|value| value.to_lowercase() == status.to_lowercase())
        .unwrap_or(false)
}

pub fn matches_date_range<T: TableRow>(row: &T, range: &DateRange) -> bool {
    if !range.is_active() {
        return true;
    }
    match row.filter_date().and_then(parse_row_timestamp) {
        Some(instant) => range.contains(instant),
        None => {
            tracing::debug!(
                row_id = %row.row_id(),
                raw = ?row.filter_date(),
                "row date unreadable, excluded from date range"
            );
            false
        }
    }
}

/// Indices of the rows that pass every active predicate, in dataset order.
pub fn apply<T: TableRow>(rows: &[T], filter: &FilterState) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter(|(_, row)| filter.matches(*row))
        .map(|(index, _)| index)
        .collect()
}

/// Reads an API timestamp as a UTC instant. Bare dates are midnight.
pub fn parse_row_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.naive_utc());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .map(|date| date.and_time(NaiveTime::MIN))
}

/// Reduces an API timestamp to its calendar date, as written.
pub fn parse_row_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.date_naive());
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(parsed.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

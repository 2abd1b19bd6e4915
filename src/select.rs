//! Picks the "current" price of an item out of its series.
//!
//! Timestamps are walked newest first. When all of them share one ISO-8601 format this is the
//! same as a descending lexical order; timestamps that do not parse as a date are walked last.

use std::cmp::Ordering;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use crate::api::PriceSeries;

/// Today's newest usable minimum buyout, or failing that the newest usable one of any day, or 0
pub fn select_price(series: &PriceSeries, today: NaiveDate) -> u64 {
    if series.is_empty() {
        return 0;
    }

    let prefix = today.format("%Y-%m-%d").to_string();

    let mut timestamps: Vec<(&str, Option<NaiveDateTime>)> = series
        .keys()
        .map(|ts| (ts.as_str(), parse_timestamp(ts)))
        .collect();
    timestamps.sort_unstable_by(newest_first);

    let newest_usable = |dated_today: bool| {
        timestamps
            .iter()
            .filter(|(ts, _)| !dated_today || ts.starts_with(&prefix))
            .find_map(|(ts, _)| series.get(*ts).and_then(|o| o.min_buy()))
    };

    newest_usable(true).or_else(|| newest_usable(false)).unwrap_or(0)
}

fn newest_first(
    (a_raw, a_parsed): &(&str, Option<NaiveDateTime>),
    (b_raw, b_parsed): &(&str, Option<NaiveDateTime>),
) -> Ordering {
    b_parsed.cmp(a_parsed).then_with(|| b_raw.cmp(a_raw))
}

fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f") {
        return Some(dt);
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

//! Post date parsing
//!
//! Dates carry a fixed UTC offset. Values written without one are resolved
//! against the site's configured zone, or rejected when none is set.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use lazy_static::lazy_static;
use regex::Regex;

/// Canonical format used when writing a date back into front-matter
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %z";

/// Canonical format for offsets with a seconds part (local mean time)
const SECONDS_OFFSET_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f %::z";

lazy_static! {
    static ref TRAILING_OFFSET: Regex =
        Regex::new(r"^(?P<local>.+?)\s*(?P<offset>Z|[+-]\d{2}:?\d{2}(?::\d{2})?)$").unwrap();
    static ref OFFSET: Regex =
        Regex::new(r"^(?P<sign>[+-])(?P<h>\d{2}):?(?P<m>\d{2})(?::(?P<s>\d{2}))?$").unwrap();
}

const LOCAL_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Zone applied to dates written without an explicit offset
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultZone {
    Fixed(FixedOffset),
    Named(Tz),
}

impl DefaultZone {
    /// Parse `-05:00`, `+0930`, `Z`, or an IANA zone name
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if let Some(offset) = parse_offset(s) {
            return Some(DefaultZone::Fixed(offset));
        }
        s.parse::<Tz>().ok().map(DefaultZone::Named)
    }

    fn localize(&self, naive: &NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        match self {
            DefaultZone::Fixed(offset) => offset.from_local_datetime(naive).single(),
            DefaultZone::Named(tz) => tz
                .from_local_datetime(naive)
                .earliest()
                .map(|dt| dt.fixed_offset()),
        }
    }
}

/// Parse a front-matter date value
///
/// Returns `None` when the value does not match the grammar, names an
/// impossible calendar date, or lacks an offset with no default zone.
pub fn parse_post_date(s: &str, default_zone: Option<&DefaultZone>) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();

    if let Some(caps) = TRAILING_OFFSET.captures(s) {
        let offset = parse_offset(&caps["offset"])?;
        let naive = parse_local(caps["local"].trim())?;
        return offset.from_local_datetime(&naive).single();
    }

    let naive = parse_local(s)?;
    default_zone?.localize(&naive)
}

/// Format a date the way it is written back into front-matter
pub fn format_post_date(date: &DateTime<FixedOffset>) -> String {
    let format = if date.offset().local_minus_utc() % 60 == 0 {
        CANONICAL_FORMAT
    } else {
        SECONDS_OFFSET_FORMAT
    };
    date.format(format).to_string()
}

fn parse_local(s: &str) -> Option<NaiveDateTime> {
    for fmt in LOCAL_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_offset(s: &str) -> Option<FixedOffset> {
    if s == "Z" {
        return FixedOffset::east_opt(0);
    }
    let caps = OFFSET.captures(s)?;
    let hours: i32 = caps["h"].parse().ok()?;
    let minutes: i32 = caps["m"].parse().ok()?;
    let seconds: i32 = match caps.name("s") {
        Some(s) => s.as_str().parse().ok()?,
        None => 0,
    };
    if hours > 23 || minutes > 59 || seconds > 59 {
        return None;
    }
    let seconds = hours * 3600 + minutes * 60 + seconds;
    match &caps["sign"] {
        "-" => FixedOffset::west_opt(seconds),
        _ => FixedOffset::east_opt(seconds),
    }
}

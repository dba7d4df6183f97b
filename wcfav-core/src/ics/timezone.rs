//! VTIMEZONE generation from the tz database.
//!
//! Calendar apps need a VTIMEZONE for every TZID a document references.
//! Instead of shipping canned definitions, the observances are derived from
//! chrono-tz by scanning for UTC offset changes.

use chrono::{DateTime, Duration, NaiveDate, Offset, TimeZone, Utc};
use chrono_tz::{OffsetComponents, Tz};

/// UTC offset in seconds plus whether it is daylight time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Observed {
    utc_offset: i32,
    dst: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Observance {
    /// Instant the observance takes effect
    at: DateTime<Utc>,
    from: Observed,
    to: Observed,
}

fn observed_at(tz: Tz, at: DateTime<Utc>) -> Observed {
    let offset = tz.offset_from_utc_datetime(&at.naive_utc());
    Observed {
        utc_offset: offset.fix().local_minus_utc(),
        dst: !offset.dst_offset().is_zero(),
    }
}

fn year_start(year: i32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// Offset changes between the start of `first_year - 1` and the end of
/// `last_year + 1`, preceded by the observance in effect at the start.
fn observances(tz: Tz, first_year: i32, last_year: i32) -> Vec<Observance> {
    let start = year_start(first_year - 1);
    let end = year_start(last_year + 2);

    let initial = observed_at(tz, start);
    let mut result = vec![Observance {
        at: start,
        from: initial,
        to: initial,
    }];

    let step = Duration::hours(1);
    let mut cursor = start;
    let mut current = initial;
    while cursor < end {
        let next = cursor + step;
        let observed = observed_at(tz, next);
        if observed != current {
            // Narrow the change down to the second
            let (mut lo, mut hi) = (cursor, next);
            while hi - lo > Duration::seconds(1) {
                let mid = lo + (hi - lo) / 2;
                if observed_at(tz, mid) == current {
                    lo = mid;
                } else {
                    hi = mid;
                }
            }
            result.push(Observance {
                at: hi,
                from: current,
                to: observed,
            });
            current = observed;
        }
        cursor = next;
    }

    result
}

fn format_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let abs = seconds.unsigned_abs();
    let (h, m, s) = (abs / 3600, abs % 3600 / 60, abs % 60);
    if s == 0 {
        format!("{sign}{h:02}{m:02}")
    } else {
        format!("{sign}{h:02}{m:02}{s:02}")
    }
}

/// Unfolded content lines of a VTIMEZONE covering `first_year..=last_year`.
pub fn vtimezone(tz: Tz, first_year: i32, last_year: i32) -> Vec<String> {
    let mut lines = vec!["BEGIN:VTIMEZONE".to_string(), format!("TZID:{}", tz.name())];

    for obs in observances(tz, first_year, last_year) {
        let kind = if obs.to.dst { "DAYLIGHT" } else { "STANDARD" };
        // DTSTART is local time as it was just before the change
        let local = obs.at.naive_utc() + Duration::seconds(obs.from.utc_offset.into());

        lines.push(format!("BEGIN:{kind}"));
        lines.push(format!("DTSTART:{}", local.format("%Y%m%dT%H%M%S")));
        lines.push(format!("TZOFFSETFROM:{}", format_offset(obs.from.utc_offset)));
        lines.push(format!("TZOFFSETTO:{}", format_offset(obs.to.utc_offset)));
        lines.push(format!("END:{kind}"));
    }

    lines.push("END:VTIMEZONE".to_string());
    lines
}

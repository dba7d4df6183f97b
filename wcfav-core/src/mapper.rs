//! Session record → calendar event mapping.
//!
//! The event zone is passed in explicitly. Naive timestamps get that zone
//! attached; the host machine's zone is never consulted.

use std::collections::HashMap;
use std::sync::LazyLock;

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, TimeZone};
use chrono_tz::Tz;
use regex::Regex;
use tracing::debug;

use crate::error::MappingError;
use crate::event::CalendarEvent;
use crate::session::SessionRecord;
use crate::text::clean_html_text;

static SPEAKER_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)speakers?:\s*([^<\n]+)").expect("valid regex"));

/// Names for speaker and track ids that were not embedded in the sessions
/// response and had to be looked up separately.
#[derive(Debug, Clone, Default)]
pub struct References {
    pub speakers: HashMap<u64, String>,
    pub tracks: HashMap<u64, String>,
}

/// Map every record, keeping response order. Failures are returned, not raised.
pub fn map_sessions(
    records: &[SessionRecord],
    refs: &References,
    tz: Tz,
    default_duration: Duration,
) -> (Vec<CalendarEvent>, Vec<MappingError>) {
    let mut events = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();

    for record in records {
        match map_session(record, refs, tz, default_duration) {
            Ok(event) => events.push(event),
            Err(e) => {
                debug!(session = record.id, reason = %e.reason, "skipping session");
                skipped.push(e);
            }
        }
    }

    (events, skipped)
}

pub fn map_session(
    record: &SessionRecord,
    refs: &References,
    tz: Tz,
    default_duration: Duration,
) -> Result<CalendarEvent, MappingError> {
    let session_id = record.id_string();

    let title = record
        .title
        .as_ref()
        .map(|t| clean_html_text(&t.rendered))
        .filter(|t| !t.is_empty())
        .ok_or_else(|| MappingError::new(&session_id, "missing title"))?;

    let start = resolve_start(record, tz).map_err(|reason| MappingError::new(&session_id, reason))?;
    let end = resolve_end(record, start, tz, default_duration)
        .map_err(|reason| MappingError::new(&session_id, reason))?;
    let speakers = resolve_speakers(record, refs);
    let location = resolve_location(record, refs);
    let url = record.link.clone().filter(|l| !l.trim().is_empty());
    let description = compose_description(&speakers, url.as_deref());

    Ok(CalendarEvent {
        session_id,
        title,
        start,
        end,
        location,
        speakers,
        description,
        url,
    })
}

/// Session meta time first, then the post `date`.
fn resolve_start(record: &SessionRecord, tz: Tz) -> Result<DateTime<Tz>, String> {
    if let Some(ts) = record.meta.session_time.filter(|t| *t > 0) {
        return wall_clock_timestamp(ts, tz);
    }

    match record.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => parse_timestamp(raw, tz),
        None => Err("missing start time".to_string()),
    }
}

fn resolve_end(
    record: &SessionRecord,
    start: DateTime<Tz>,
    tz: Tz,
    default_duration: Duration,
) -> Result<DateTime<Tz>, String> {
    if let Some(ts) = record.meta.session_end_time.filter(|t| *t > 0) {
        match wall_clock_timestamp(ts, tz) {
            Ok(end) if end >= start => return Ok(end),
            Ok(end) => debug!(session = record.id, %end, "ignoring end before start"),
            Err(reason) => debug!(session = record.id, %reason, "ignoring unusable end time"),
        }
    }

    if let Some(secs) = record.meta.session_duration.filter(|s| *s > 0) {
        match Duration::try_seconds(secs).and_then(|d| start.checked_add_signed(d)) {
            Some(end) => return Ok(end),
            None => debug!(session = record.id, secs, "ignoring out-of-range duration"),
        }
    }

    start
        .checked_add_signed(default_duration)
        .ok_or_else(|| "end time out of range".to_string())
}

/// Parse an API timestamp. Offsets are honored and converted into `tz`;
/// naive values are read as wall-clock time in `tz`.
pub fn parse_timestamp(raw: &str, tz: Tz) -> Result<DateTime<Tz>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&tz));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return attach_zone(naive, tz);
        }
    }

    Err(format!("unrecognized timestamp '{raw}'"))
}

/// WordCamp stores session times as the local wall clock encoded as UTC.
fn wall_clock_timestamp(ts: i64, tz: Tz) -> Result<DateTime<Tz>, String> {
    let naive = DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| format!("timestamp {ts} out of range"))?
        .naive_utc();
    attach_zone(naive, tz)
}

/// Ambiguous local times (DST fall-back) resolve to the earlier instant.
pub fn attach_zone(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Tz>, String> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => Ok(dt),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest),
        LocalResult::None => Err(format!("{naive} does not exist in {}", tz.name())),
    }
}

fn resolve_speakers(record: &SessionRecord, refs: &References) -> Vec<String> {
    let embedded: Vec<String> = record
        .embedded
        .iter()
        .flat_map(|e| &e.speakers)
        .filter_map(|post| post.title.as_ref())
        .map(|title| clean_html_text(&title.rendered))
        .filter(|name| !name.is_empty())
        .collect();
    if !embedded.is_empty() {
        return embedded;
    }

    let referenced: Vec<String> = record
        .meta
        .speaker_ids
        .iter()
        .filter_map(|id| refs.speakers.get(id).cloned())
        .collect();
    if !referenced.is_empty() {
        return referenced;
    }

    if let Some(text) = record.meta.speakers_text.as_deref() {
        let names = split_names(text);
        if !names.is_empty() {
            return names;
        }
    }

    record
        .content
        .as_ref()
        .map(|content| {
            SPEAKER_LINE
                .captures_iter(&content.rendered)
                .flat_map(|caps| split_names(&caps[1]))
                .collect()
        })
        .unwrap_or_default()
}

fn resolve_location(record: &SessionRecord, refs: &References) -> String {
    let embedded: Vec<String> = record
        .embedded
        .iter()
        .flat_map(|e| e.tracks())
        .filter_map(|term| term.name.as_deref())
        .map(clean_html_text)
        .filter(|name| !name.is_empty())
        .collect();
    if !embedded.is_empty() {
        return embedded.join(", ");
    }

    let referenced: Vec<String> = record
        .session_track
        .iter()
        .filter_map(|id| refs.tracks.get(id).cloned())
        .collect();
    if !referenced.is_empty() {
        return referenced.join(", ");
    }

    [&record.meta.location, &record.meta.track]
        .into_iter()
        .flatten()
        .map(|raw| clean_html_text(raw))
        .find(|loc| !loc.is_empty())
        .unwrap_or_default()
}

fn split_names(text: &str) -> Vec<String> {
    text.split(',')
        .map(clean_html_text)
        .filter(|name| !name.is_empty())
        .collect()
}

fn compose_description(speakers: &[String], url: Option<&str>) -> String {
    let mut lines = Vec::new();
    if !speakers.is_empty() {
        lines.push(format!("Speaker(s): {}", speakers.join(", ")));
    }
    if let Some(url) = url {
        lines.push(url.to_string());
    }
    lines.join("\n")
}

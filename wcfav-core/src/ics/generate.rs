//! ICS document generation.

use chrono::{DateTime, Datelike, Utc};
use chrono_tz::Tz;
use icalendar::{Calendar, Component, EventLike, Property};

use super::timezone::vtimezone;
use crate::constants::PRODID;
use crate::event::CalendarEvent;

const MAX_LINE_OCTETS: usize = 75;

/// Calendar-level properties.
#[derive(Debug, Clone)]
pub struct CalendarMeta<'a> {
    /// X-WR-CALNAME
    pub name: &'a str,
    /// Site host, used as the UID domain
    pub host: &'a str,
    /// DTSTAMP for every event
    pub generated_at: DateTime<Utc>,
}

/// UID stays the same across runs so re-imports update instead of duplicating.
pub fn event_uid(event: &CalendarEvent, host: &str) -> String {
    format!("{}@{}", event.session_id, host)
}

/// Render the events as one VCALENDAR with CRLF line endings.
pub fn generate_ics(events: &[CalendarEvent], meta: &CalendarMeta) -> String {
    let mut cal = Calendar::new();
    cal.append_property(Property::new("METHOD", "PUBLISH"));
    // NAME and X-WR-CALNAME are written unescaped
    cal.name(&single_line(meta.name));

    let zones = zones_used(events);
    if let Some((tz, _, _)) = zones.first() {
        cal.append_property(Property::new("X-WR-TIMEZONE", tz.name()));
    }

    for event in events {
        let mut ics_event = icalendar::Event::new();
        ics_event.uid(&event_uid(event, meta.host));
        ics_event.timestamp(meta.generated_at);
        add_zoned_datetime(&mut ics_event, "DTSTART", &event.start);
        add_zoned_datetime(&mut ics_event, "DTEND", &event.end);
        ics_event.summary(&normalize_newlines(&event.title));
        ics_event.location(&normalize_newlines(&event.location));
        if !event.description.is_empty() {
            ics_event.description(&normalize_newlines(&event.description));
        }
        if let Some(ref url) = event.url {
            ics_event.url(url);
        }
        cal.push(ics_event.done());
    }

    let timezones: Vec<String> = zones
        .iter()
        .flat_map(|(tz, first_year, last_year)| vtimezone(*tz, *first_year, *last_year))
        .collect();

    finish_document(&cal.done().to_string(), &timezones)
}

/// Swap in our PRODID and place the VTIMEZONE blocks after the calendar
/// properties. They are spliced in as text because icalendar stamps every
/// component it renders with DTSTAMP and UID, which VTIMEZONE must not carry.
fn finish_document(ics: &str, timezones: &[String]) -> String {
    let mut result = String::with_capacity(ics.len() + timezones.len() * 40);
    let mut pending = Some(timezones);

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            result.push_str(&format!("PRODID:{PRODID}\r\n"));
            continue;
        }

        if line == "BEGIN:VEVENT" || line == "END:VCALENDAR" {
            for tz_line in pending.take().unwrap_or_default() {
                push_physical_line(&mut result, tz_line);
            }
        }

        push_physical_line(&mut result, line);
    }

    result
}

/// icalendar can leave the last continuation of a folded line one octet
/// over the limit, so overlong physical lines are split again here.
fn push_physical_line(result: &mut String, line: &str) {
    let mut rest = line;
    while rest.len() > MAX_LINE_OCTETS {
        let mut cut = MAX_LINE_OCTETS;
        while !rest.is_char_boundary(cut) {
            cut -= 1;
        }
        result.push_str(&rest[..cut]);
        result.push_str("\r\n ");
        rest = &rest[cut..];
    }
    result.push_str(rest);
    result.push_str("\r\n");
}

/// `NAME;TZID=Area/City:YYYYMMDDTHHMMSS` in the event's local time.
fn add_zoned_datetime(ics_event: &mut icalendar::Event, name: &str, dt: &DateTime<Tz>) {
    let mut prop = Property::new(name, dt.naive_local().format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", dt.timezone().name());
    ics_event.append_property(prop);
}

/// TEXT escaping covers LF only.
fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

fn single_line(text: &str) -> String {
    text.replace(['\r', '\n'], " ")
}

/// Each zone referenced by the events with the year span it must cover,
/// in order of first use.
fn zones_used(events: &[CalendarEvent]) -> Vec<(Tz, i32, i32)> {
    let mut zones: Vec<(Tz, i32, i32)> = Vec::new();
    for event in events {
        for dt in [&event.start, &event.end] {
            let tz = dt.timezone();
            let year = dt.naive_local().year();
            match zones.iter_mut().find(|(z, _, _)| *z == tz) {
                Some((_, first, last)) => {
                    *first = (*first).min(year);
                    *last = (*last).max(year);
                }
                None => zones.push((tz, year, year)),
            }
        }
    }
    zones
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDateTime, TimeZone};
    use chrono_tz::America::Los_Angeles;
    use icalendar::{CalendarDateTime, DatePerhapsTime};

    fn pacific(s: &str) -> DateTime<Tz> {
        let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").unwrap();
        Los_Angeles.from_local_datetime(&naive).unwrap()
    }

    fn make_event(id: &str, title: &str, location: &str) -> CalendarEvent {
        CalendarEvent {
            session_id: id.to_string(),
            title: title.to_string(),
            start: pacific("2025-08-28T14:45:00"),
            end: pacific("2025-08-28T15:30:00"),
            location: location.to_string(),
            speakers: vec!["Ada Lovelace".to_string()],
            description: "Speaker(s): Ada Lovelace".to_string(),
            url: Some("https://us.wordcamp.org/2025/session/engines/".to_string()),
        }
    }

    fn meta() -> CalendarMeta<'static> {
        CalendarMeta {
            name: "WordCamp Favorites",
            host: "us.wordcamp.org",
            generated_at: Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn one_vevent_per_event_with_required_properties() {
        let events = vec![
            make_event("1834", "Engines", "Room A"),
            make_event("1952", "Looms", ""),
        ];
        let ics = generate_ics(&events, &meta());

        assert!(ics.starts_with("BEGIN:VCALENDAR\r\nVERSION:2.0\r\n"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 2);
        assert_eq!(ics.matches("BEGIN:VTIMEZONE").count(), 1);
        assert!(ics.contains("UID:1834@us.wordcamp.org\r\n"));
        assert!(ics.contains("DTSTAMP:20250801T120000Z\r\n"));
        assert!(ics.contains("DTSTART;TZID=America/Los_Angeles:20250828T144500\r\n"));
        assert!(ics.contains("DTEND;TZID=America/Los_Angeles:20250828T153000\r\n"));
        assert!(ics.contains("LOCATION:Room A\r\n"));
        assert!(ics.contains("LOCATION:\r\n"));
        assert!(ics.contains("X-WR-TIMEZONE:America/Los_Angeles\r\n"));
    }

    #[test]
    fn uids_are_stable_across_runs() {
        let events = vec![make_event("1834", "Engines", "Room A")];
        let first = generate_ics(&events, &meta());
        let second = generate_ics(&events, &meta());
        assert_eq!(first, second);
    }

    #[test]
    fn text_values_are_escaped() {
        let mut event = make_event("7", "Rock, Paper; Scissors \\ Lizard", "Hall A, Level 2");
        event.description = "Speaker(s): A, B\nhttps://example.org/?a=1;b=2".to_string();
        let ics = generate_ics(&[event], &meta());

        assert!(ics.contains("SUMMARY:Rock\\, Paper\\; Scissors \\\\ Lizard\r\n"));
        assert!(ics.contains("LOCATION:Hall A\\, Level 2\r\n"));
        assert!(ics.contains("DESCRIPTION:Speaker(s): A\\, B\\nhttps://example.org/?a=1\\;b=2\r\n"));
    }

    #[test]
    fn no_physical_line_exceeds_75_octets() {
        let title = "An Extremely Long Session Title About Gutenberg Blocks, Full Site Editing, and Everything Else ".repeat(3);
        let ics = generate_ics(&[make_event("1", &title, "Room")], &meta());

        for line in ics.split("\r\n") {
            assert!(line.len() <= 75, "line of {} octets: {line}", line.len());
        }
    }

    #[test]
    fn overlong_continuation_lines_are_split_again() {
        let tail = "x".repeat(75);
        let folded = format!("BEGIN:VCALENDAR\r\nX-NOTE:{}\r\n {tail}\r\nEND:VCALENDAR\r\n", "a".repeat(67));
        let ics = finish_document(&folded, &[]);

        for line in ics.split("\r\n") {
            assert!(line.len() <= 75, "line of {} octets: {line}", line.len());
        }
        assert_eq!(
            ics.replace("\r\n ", ""),
            format!("BEGIN:VCALENDAR\r\nX-NOTE:{}{tail}\r\nEND:VCALENDAR\r\n", "a".repeat(67))
        );
    }

    #[test]
    fn round_trips_through_standard_reader() {
        let events = vec![
            make_event("1834", "Engines of Tomorrow", "Room A"),
            CalendarEvent {
                start: pacific("2025-08-29T09:00:00"),
                end: pacific("2025-08-29T09:50:00"),
                ..make_event("1952", "Looms", "Main Hall")
            },
        ];
        let ics = generate_ics(&events, &meta());

        let calendar = ics.parse::<Calendar>().expect("generated ICS parses");
        let vevents: Vec<_> = calendar.events().collect();
        assert_eq!(vevents.len(), events.len());

        for (vevent, event) in vevents.iter().zip(&events) {
            assert_eq!(vevent.get_summary(), Some(event.title.as_str()));
            assert_eq!(vevent.get_location(), Some(event.location.as_str()));
            assert_eq!(vevent.get_url(), event.url.as_deref());

            for (name, parsed, expected) in [
                ("DTSTART", vevent.get_start(), &event.start),
                ("DTEND", vevent.get_end(), &event.end),
            ] {
                match parsed {
                    Some(DatePerhapsTime::DateTime(CalendarDateTime::WithTimezone { date_time, tzid })) => {
                        assert_eq!(tzid, "America/Los_Angeles");
                        assert_eq!(date_time, expected.naive_local());
                        let tz: Tz = tzid.parse().unwrap();
                        let instant = tz.from_local_datetime(&date_time).unwrap();
                        assert_eq!(instant, *expected);
                    }
                    other => panic!("{name} should carry a TZID, got {other:?}"),
                }
            }
        }
    }

    #[test]
    fn reserved_characters_and_folded_titles_read_back_exactly() {
        let title = format!("Rock, Paper; Scissors \\ Lizard: {}", "日本語のセッション".repeat(8));
        let location = "Hall A, Level 2; East Wing \\ Annex";
        let mut event = make_event("42", &title, location);
        event.description = "Speaker(s): Ada, Grace; Hedy\nhttps://example.org/?a=1;b=2".to_string();

        let ics = generate_ics(&[event.clone()], &meta());
        assert!(ics.lines().any(|l| l.starts_with(' ')), "long title should be folded");

        let calendar = ics.parse::<Calendar>().expect("generated ICS parses");
        let vevent = calendar.events().next().expect("one VEVENT");
        assert_eq!(vevent.get_summary(), Some(title.as_str()));
        assert_eq!(vevent.get_location(), Some(location));
        assert_eq!(vevent.get_description(), Some(event.description.as_str()));
    }

    #[test]
    fn carriage_returns_become_plain_newlines() {
        let mut event = make_event("9", "Title", "Room");
        event.description = "first\r\nsecond\rthird".to_string();
        let ics = generate_ics(&[event], &meta());

        assert!(ics.contains("DESCRIPTION:first\\nsecond\\nthird\r\n"));
        let calendar = ics.parse::<Calendar>().unwrap();
        let vevent = calendar.events().next().unwrap();
        assert_eq!(vevent.get_description(), Some("first\nsecond\nthird"));
    }

    #[test]
    fn header_carries_our_prodid_once() {
        let ics = generate_ics(&[make_event("1", "Engines", "Room")], &meta());

        assert_eq!(ics.matches("PRODID:").count(), 1);
        assert!(ics.contains(&format!("PRODID:{PRODID}\r\n")));
        assert!(ics.contains("METHOD:PUBLISH\r\n"));
        assert!(ics.contains("X-WR-CALNAME:WordCamp Favorites\r\n"));

        let tz_at = ics.find("BEGIN:VTIMEZONE").unwrap();
        let event_at = ics.find("BEGIN:VEVENT").unwrap();
        assert!(tz_at < event_at);
        let vtimezone = &ics[tz_at..event_at];
        assert!(!vtimezone.contains("DTSTAMP"));
        assert!(!vtimezone.contains("UID"));
    }

    #[test]
    fn empty_calendar_is_still_valid() {
        let ics = generate_ics(&[], &meta());
        assert_eq!(ics.matches("BEGIN:VEVENT").count(), 0);
        assert!(!ics.contains("VTIMEZONE"));
        assert!(ics.ends_with("END:VCALENDAR\r\n"));
        assert!(ics.parse::<Calendar>().is_ok());
    }

    #[test]
    fn events_spanning_years_get_wide_enough_timezone() {
        let mut event = make_event("1", "New Year", "Room");
        event.start = pacific("2025-12-31T23:30:00");
        event.end = pacific("2026-01-01T00:30:00");
        assert_eq!(zones_used(&[event]), vec![(Los_Angeles, 2025, 2026)]);
    }
}

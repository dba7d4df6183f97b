//! Normalized calendar events.

use chrono::DateTime;
use chrono_tz::Tz;

/// One favorite session, ready to be written to a calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct CalendarEvent {
    /// WordCamp session id, also the basis of the event UID
    pub session_id: String,
    pub title: String,
    pub start: DateTime<Tz>,
    /// Never before `start`
    pub end: DateTime<Tz>,
    /// Empty when the session has no room
    pub location: String,
    pub speakers: Vec<String>,
    pub description: String,
    /// Session page on the WordCamp site
    pub url: Option<String>,
}

impl CalendarEvent {
    pub fn speaker_list(&self) -> String {
        self.speakers.join(", ")
    }

    pub fn timezone(&self) -> Tz {
        self.start.timezone()
    }
}

impl std::fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.title)
    }
}

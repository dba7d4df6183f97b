//! iCalendar (RFC 5545) generation and output.

mod generate;
mod timezone;
mod write;

pub use generate::{CalendarMeta, generate_ics};
pub use timezone::vtimezone;
pub use write::write_calendar;

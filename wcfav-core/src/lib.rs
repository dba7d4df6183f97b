//! Turn the favorite sessions of a WordCamp schedule into an ICS calendar.
//!
//! The stages, in run order:
//! - `favorites` parses the schedule URL into session ids and an API base
//! - `fetch` pulls the sessions through a `remote::WordCampApi` in batches
//! - `mapper` turns session records into zone-aware `CalendarEvent`s
//! - `ics` serializes the events and writes the file atomically
//! - `report` prints the run summary
//!
//! `pipeline::run` wires them together.

pub mod constants;
pub mod error;
pub mod event;
pub mod favorites;
pub mod fetch;
pub mod ics;
pub mod mapper;
pub mod pipeline;
pub mod remote;
pub mod report;
pub mod session;
pub mod settings;
pub mod text;

#[cfg(test)]
mod test_support;

pub use error::{WcfavError, WcfavResult};
pub use event::CalendarEvent;

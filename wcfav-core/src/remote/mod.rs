//! Access to a WordCamp site's WordPress REST API.
//!
//! [`WordCampApi`] is the seam between the fetch logic and the network:
//! [`WordCampClient`] talks HTTP, tests substitute an in-memory fake.

mod api;
mod client;

pub use api::WordCampApi;
pub use client::WordCampClient;

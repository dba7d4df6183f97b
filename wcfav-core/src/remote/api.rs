use serde_json::Value;

use crate::error::FetchFailure;
use crate::session::{Post, SiteIndex, Term};

/// The read-only slice of the WordPress REST API the pipeline needs.
///
/// Callers are responsible for batching; implementations issue exactly one
/// request per call.
#[allow(async_fn_in_trait)]
pub trait WordCampApi {
    /// `GET /wp-json/wp/v2/sessions?include=<ids>&_embed=1`
    ///
    /// Returns the raw array items so that one malformed session does not
    /// fail the whole batch.
    async fn sessions(&self, ids: &[String]) -> Result<Vec<Value>, FetchFailure>;

    /// `GET /wp-json/wp/v2/speakers?include=<ids>`
    async fn speakers(&self, ids: &[u64]) -> Result<Vec<Post>, FetchFailure>;

    /// `GET /wp-json/wp/v2/session_track?include=<ids>`
    async fn tracks(&self, ids: &[u64]) -> Result<Vec<Term>, FetchFailure>;

    /// `GET /wp-json/`
    async fn site_index(&self) -> Result<SiteIndex, FetchFailure>;
}

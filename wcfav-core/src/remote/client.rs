//! HTTP implementation of [`WordCampApi`].

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::timeout;
use tracing::{debug, trace};
use url::Url;

use super::api::WordCampApi;
use crate::constants::USER_AGENT;
use crate::error::FetchFailure;
use crate::session::{Post, SiteIndex, Term};

pub struct WordCampClient {
    http: reqwest::Client,
    /// Site root without a trailing slash
    base: String,
    timeout: Duration,
}

impl WordCampClient {
    pub fn new(api_base: &Url, request_timeout: Duration) -> Result<Self, FetchFailure> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        Ok(WordCampClient {
            http,
            base: api_base.as_str().trim_end_matches('/').to_string(),
            timeout: request_timeout,
        })
    }

    fn endpoint(&self, route: &str) -> String {
        format!("{}/wp-json/{}", self.base, route)
    }

    /// Send a GET and decode the body, bounded by the request timeout.
    async fn get_json<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchFailure> {
        timeout(self.timeout, self.get_json_raw(route, query))
            .await
            .map_err(|_| FetchFailure::Timeout(self.timeout))?
    }

    async fn get_json_raw<T: DeserializeOwned>(
        &self,
        route: &str,
        query: &[(&str, String)],
    ) -> Result<T, FetchFailure> {
        let url = self.endpoint(route);
        trace!(%url, ?query, "sending request");

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchFailure::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchFailure::Network(e.to_string()))?;
        debug!(%url, bytes = body.len(), "got successful response");

        serde_json::from_str(&body).map_err(|e| FetchFailure::Payload(e.to_string()))
    }
}

fn include_query<T: ToString>(ids: &[T]) -> Vec<(&'static str, String)> {
    let include = ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
    vec![("include", include), ("per_page", ids.len().max(1).to_string())]
}

impl WordCampApi for WordCampClient {
    async fn sessions(&self, ids: &[String]) -> Result<Vec<Value>, FetchFailure> {
        let mut query = include_query(ids);
        query.push(("_embed", "1".to_string()));
        self.get_json("wp/v2/sessions", &query).await
    }

    async fn speakers(&self, ids: &[u64]) -> Result<Vec<Post>, FetchFailure> {
        self.get_json("wp/v2/speakers", &include_query(ids)).await
    }

    async fn tracks(&self, ids: &[u64]) -> Result<Vec<Term>, FetchFailure> {
        self.get_json("wp/v2/session_track", &include_query(ids)).await
    }

    async fn site_index(&self) -> Result<SiteIndex, FetchFailure> {
        self.get_json("", &[]).await
    }
}

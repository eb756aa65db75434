//! HTTP implementations of the collaborator traits.

use std::time::Duration;

use activemeetings_core::RoomContext;
use activemeetings_protocol::{JoinDecision, JoinRequest, JoinResponse, SnapshotResponse};
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use serde::de::DeserializeOwned;
use tracing::{debug, info};
use url::Url;

use crate::BoxFuture;
use crate::error::{ProviderError, ProviderResult};
use crate::join::JoinService;
use crate::snapshot::SnapshotSource;

const JSON: &str = "application/json";

fn build_client(timeout: Option<Duration>) -> ProviderResult<reqwest::Client> {
    let mut builder = reqwest::Client::builder();
    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }
    builder.build().map_err(|e| {
        ProviderError::configuration(format!("failed to create HTTP client: {}", e)).with_source(e)
    })
}

fn send_error(err: reqwest::Error) -> ProviderError {
    let message = if err.is_timeout() {
        "request timeout".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        format!("request failed: {}", err)
    };
    ProviderError::network(message).with_source(err)
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
    endpoint: &Url,
) -> ProviderResult<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(
            ProviderError::status(status.as_u16(), format!("HTTP {}: {}", status, body))
                .with_endpoint(endpoint.as_str()),
        );
    }

    let body = response.text().await.map_err(|e| {
        ProviderError::network(format!("failed to read response: {}", e)).with_source(e)
    })?;

    serde_json::from_str(&body).map_err(|e| {
        ProviderError::invalid_response(format!("failed to parse response: {}", e))
            .with_endpoint(endpoint.as_str())
            .with_source(e)
    })
}

/// Fetches the snapshot with a `GET` on the page's snapshot URL.
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    client: reqwest::Client,
}

impl HttpSnapshotSource {
    /// Creates a source whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> ProviderResult<Self> {
        Ok(Self {
            client: build_client(Some(timeout))?,
        })
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn name(&self) -> &str {
        "http"
    }

    fn fetch(&self, url: Url) -> BoxFuture<'_, ProviderResult<SnapshotResponse>> {
        Box::pin(async move {
            debug!(url = %url, "Fetching meeting snapshot");
            let response = self
                .client
                .get(url.clone())
                .header(ACCEPT, JSON)
                .send()
                .await
                .map_err(send_error)?;

            let snapshot: SnapshotResponse = read_json(response, &url).await?;
            info!(meetings = snapshot.meetings.len(), "Fetched meeting snapshot");
            Ok(snapshot)
        })
    }
}

/// Posts join requests to the page's join endpoint.
///
/// Requests have no timeout; a stalled server leaves the join pending.
#[derive(Debug, Clone)]
pub struct HttpJoinService {
    client: reqwest::Client,
    context: RoomContext,
}

impl HttpJoinService {
    /// Creates a join service for the page described by `context`.
    pub fn new(context: RoomContext) -> ProviderResult<Self> {
        Ok(Self {
            client: build_client(None)?,
            context,
        })
    }
}

impl JoinService for HttpJoinService {
    fn request_join<'a>(
        &'a self,
        meeting: &'a str,
        display_name: &'a str,
    ) -> BoxFuture<'a, ProviderResult<JoinDecision>> {
        Box::pin(async move {
            let endpoint = self.context.join_url();
            let body = serde_json::to_vec(&JoinRequest {
                meeting: meeting.to_string(),
                join_name: display_name.to_string(),
            })
            .map_err(|e| ProviderError::internal(format!("failed to encode join request: {}", e)))?;

            debug!(url = %endpoint, meeting = %meeting, "Requesting join");
            let response = self
                .client
                .post(endpoint.clone())
                .header(CONTENT_TYPE, JSON)
                .header(ACCEPT, JSON)
                .body(body)
                .send()
                .await
                .map_err(send_error)?;

            let reply: JoinResponse = read_json(response, &endpoint).await?;
            let status_url = self.context.meeting_url(meeting);
            Ok(reply.decision(status_url.as_str())?)
        })
    }
}

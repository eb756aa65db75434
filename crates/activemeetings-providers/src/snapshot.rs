//! Snapshot source trait.

use std::sync::Mutex;

use activemeetings_protocol::SnapshotResponse;
use url::Url;

use crate::BoxFuture;
use crate::error::{ProviderError, ProviderResult};

/// Fetches the list of meetings running right now.
///
/// Called at most once per session, after the presence subscription is
/// established. Implementations report failures as [`ProviderError`]; the
/// caller logs them and does not retry.
pub trait SnapshotSource: Send + Sync {
    /// Returns a short name for logs (e.g. "http").
    fn name(&self) -> &str;

    /// Fetches the snapshot from `url`.
    fn fetch(&self, url: Url) -> BoxFuture<'_, ProviderResult<SnapshotResponse>>;
}

/// Source that answers from memory, for tests and demos.
#[derive(Debug)]
pub struct StaticSnapshotSource {
    answer: Result<SnapshotResponse, String>,
    fetched: Mutex<Vec<Url>>,
}

impl StaticSnapshotSource {
    /// Always answers with `snapshot`.
    pub fn new(snapshot: SnapshotResponse) -> Self {
        Self {
            answer: Ok(snapshot),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Always fails with a network error carrying `message`.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            answer: Err(message.into()),
            fetched: Mutex::new(Vec::new()),
        }
    }

    /// Returns the URLs fetched so far.
    pub fn fetched(&self) -> Vec<Url> {
        self.fetched
            .lock()
            .map(|fetched| fetched.clone())
            .unwrap_or_default()
    }
}

impl SnapshotSource for StaticSnapshotSource {
    fn name(&self) -> &str {
        "static"
    }

    fn fetch(&self, url: Url) -> BoxFuture<'_, ProviderResult<SnapshotResponse>> {
        Box::pin(async move {
            if let Ok(mut fetched) = self.fetched.lock() {
                fetched.push(url);
            }
            self.answer.clone().map_err(ProviderError::network)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorCode;
    use activemeetings_protocol::MeetingDescriptor;

    fn url() -> Url {
        Url::parse("https://meet.example.com/rooms/abc/request").unwrap()
    }

    #[tokio::test]
    async fn static_source_answers_and_records() {
        let snapshot = SnapshotResponse {
            meetings: vec![MeetingDescriptor::new("Room A", "u1", 5, 2)],
        };
        let source = StaticSnapshotSource::new(snapshot.clone());

        assert_eq!(source.fetch(url()).await.unwrap(), snapshot);
        assert_eq!(source.fetch(url()).await.unwrap(), snapshot);
        assert_eq!(source.fetched(), vec![url(), url()]);
        assert_eq!(source.name(), "static");
    }

    #[tokio::test]
    async fn failing_source() {
        let source = StaticSnapshotSource::failing("connection refused");
        let err = source.fetch(url()).await.unwrap_err();
        assert_eq!(err.code(), ProviderErrorCode::NetworkError);
        assert_eq!(err.message(), "connection refused");
    }
}

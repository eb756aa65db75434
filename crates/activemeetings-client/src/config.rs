//! Client configuration.
//!
//! All settings live in a single `config.toml` file at
//! `~/.config/activemeetings/config.toml` by default:
//!
//! ```toml
//! [session]
//! user = "u1"
//! page_url = "https://meet.example.com/rooms/abc"
//! count_policy = "clamp"
//!
//! [store]
//! path = "/home/me/.local/share/activemeetings/store.json"
//!
//! [http]
//! timeout_secs = 10
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use activemeetings_core::{CountPolicy, RoomContext};
use activemeetings_sync::SessionConfig;
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

/// Configuration for the activemeetings client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Debug mode.
    pub debug: bool,

    /// Session settings.
    pub session: SessionSettings,

    /// Membership store settings.
    pub store: StoreSettings,

    /// HTTP settings.
    pub http: HttpSettings,
}

/// Which room to watch and how to treat the event stream.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Signed-in user id, which is also the id of their room.
    pub user: Option<String>,

    /// Landing page URL.
    pub page_url: Option<String>,

    /// What to do when a `leave` would drive a count below zero.
    pub count_policy: CountPolicy,

    /// Capacity of the session command channel.
    pub command_buffer: usize,

    /// Events held while the snapshot loads; later ones are dropped.
    pub max_buffered: usize,

    /// Open join URLs in the default browser.
    pub open_browser: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            user: None,
            page_url: None,
            count_policy: CountPolicy::Clamp,
            command_buffer: SessionConfig::default().command_buffer,
            max_buffered: SessionConfig::default().max_buffered,
            open_browser: false,
        }
    }
}

/// Membership store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// Path to the JSON store. Defaults to the data directory.
    pub path: Option<PathBuf>,
}

/// HTTP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Timeout of the snapshot request in seconds. Join requests have none.
    pub timeout_secs: u64,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self { timeout_secs: 10 }
    }
}

impl ClientConfig {
    /// Loads configuration from the default path.
    pub fn load() -> Result<Self, String> {
        let path = Self::default_path();
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, String> {
        let content =
            std::fs::read_to_string(path).map_err(|e| format!("failed to read config: {}", e))?;
        toml::from_str(&content).map_err(|e| format!("failed to parse config: {}", e))
    }

    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        Self::default_config_dir().join("config.toml")
    }

    /// Returns the default configuration directory.
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("activemeetings")
    }

    /// Returns the default data directory path.
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("activemeetings")
    }

    /// Returns the membership store path.
    pub fn store_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join("store.json"))
    }

    /// Returns the snapshot request timeout.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_secs.max(1))
    }

    /// Returns the session configuration.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_command_buffer(self.session.command_buffer)
            .with_count_policy(self.session.count_policy)
            .with_max_buffered(self.session.max_buffered)
    }

    /// Returns the user, preferring `user` over the configured one.
    pub fn user(&self, user: Option<&str>) -> ClientResult<String> {
        user.or(self.session.user.as_deref())
            .filter(|user| !user.trim().is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                ClientError::Config(format!(
                    "no user set. Pass --user or add to {}:\n  [session]\n  user = \"YOUR_ID\"",
                    Self::default_path().display()
                ))
            })
    }

    /// Builds the room context, preferring the given overrides.
    pub fn room_context(
        &self,
        user: Option<&str>,
        page_url: Option<&str>,
    ) -> ClientResult<RoomContext> {
        let user = self.user(user)?;
        let page_url = page_url
            .or(self.session.page_url.as_deref())
            .ok_or_else(|| {
                ClientError::Config("no page URL set. Pass --page-url or set session.page_url".into())
            })?;

        RoomContext::parse(user, page_url)
            .map_err(|e| ClientError::Config(format!("invalid page URL {:?}: {}", page_url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_toml_full() {
        let toml_content = r#"
[session]
user = "u1"
page_url = "https://meet.example.com/rooms/abc"
count_policy = "reject"
command_buffer = 8
max_buffered = 16

[store]
path = "/tmp/am-store.json"

[http]
timeout_secs = 3
"#;
        let config: ClientConfig = toml::from_str(toml_content).unwrap();
        assert_eq!(config.session.count_policy, CountPolicy::Reject);
        assert_eq!(config.store_path(), PathBuf::from("/tmp/am-store.json"));
        assert_eq!(config.http_timeout(), Duration::from_secs(3));

        let session = config.session_config();
        assert_eq!(session.command_buffer, 8);
        assert_eq!(session.max_buffered, 16);
        assert_eq!(session.count_policy, CountPolicy::Reject);

        let context = config.room_context(None, None).unwrap();
        assert_eq!(context.user(), "u1");
        assert!(context.is_room_page());
    }

    #[test]
    fn config_toml_empty_uses_defaults() {
        let config: ClientConfig = toml::from_str("").unwrap();
        assert_eq!(config.session.count_policy, CountPolicy::Clamp);
        assert_eq!(config.session.command_buffer, 64);
        assert_eq!(config.session.max_buffered, 1024);
        assert_eq!(config.http.timeout_secs, 10);
        assert!(config.store_path().ends_with("activemeetings/store.json"));
    }

    #[test]
    fn overrides_win() {
        let mut config = ClientConfig::default();
        config.session.user = Some("u1".into());
        config.session.page_url = Some("https://meet.example.com/rooms/abc".into());

        let context = config
            .room_context(Some("u2"), Some("https://other.example.com/rooms/x"))
            .unwrap();
        assert_eq!(context.user(), "u2");
        assert_eq!(context.page_url().host_str(), Some("other.example.com"));
    }

    #[test]
    fn missing_user_or_page_errors() {
        let config = ClientConfig::default();
        assert!(matches!(config.user(None), Err(ClientError::Config(_))));
        assert!(matches!(config.user(Some("  ")), Err(ClientError::Config(_))));

        let result = config.room_context(Some("u1"), None);
        assert!(matches!(result, Err(ClientError::Config(_))));

        let result = config.room_context(Some("u1"), Some("not a url"));
        assert!(matches!(result, Err(ClientError::Config(_))));
    }

    #[test]
    fn round_trip_through_toml() {
        let mut config = ClientConfig::default();
        config.session.user = Some("u1".into());
        let text = toml::to_string_pretty(&config).unwrap();
        assert!(text.contains("[session]"));
        assert!(text.contains("count_policy = \"clamp\""));

        let parsed: ClientConfig = toml::from_str(&text).unwrap();
        assert_eq!(parsed.session.user.as_deref(), Some("u1"));
    }
}

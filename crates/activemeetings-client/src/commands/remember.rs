//! Seeding the membership store.

use tracing::info;

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::store::FileStore;

/// Records `meeting` as previously joined and/or stores the display name.
pub fn remember(
    config: &ClientConfig,
    meeting: Option<&str>,
    name: Option<&str>,
    user: Option<&str>,
) -> ClientResult<()> {
    if meeting.is_none() && name.is_none() {
        return Err(ClientError::Config(
            "nothing to remember: pass a meeting name and/or --name".into(),
        ));
    }

    let store = FileStore::new(config.store_path());

    if let Some(name) = name {
        store.set_display_name(name)?;
        info!(name = %name, "Stored display name");
        println!("Display name set to {:?}.", name);
    }

    if let Some(meeting) = meeting.filter(|m| !m.is_empty()) {
        let user = config.user(user)?;
        if store.remember_meeting(&user, meeting)? {
            println!("Remembered {:?} for {}.", meeting, user);
        } else {
            println!("{:?} was already remembered for {}.", meeting, user);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use activemeetings_core::MembershipStore;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> ClientConfig {
        let mut config = ClientConfig::default();
        config.store.path = Some(dir.path().join("store.json"));
        config.session.user = Some("u1".into());
        config
    }

    #[test]
    fn remember_meeting_and_name() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);

        remember(&config, Some("Room A"), Some("Ada"), None).unwrap();

        let store = FileStore::new(config.store_path());
        assert!(store.previously_joined("u1").contains("Room A"));
        assert_eq!(store.display_name().as_deref(), Some("Ada"));
    }

    #[test]
    fn remember_requires_something() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        assert!(matches!(
            remember(&config, None, None, None),
            Err(ClientError::Config(_))
        ));
    }
}

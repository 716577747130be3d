use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::storage::base_storage::BaseStorage;
use crate::storage::file_storage::FileStorage;
use crate::{LinkError, Result};

const LABEL: &str = "preferences";
const KEY_PREFIX: &str = "v1.";

/// Keys of the persisted configuration and the received payload cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreKey {
    Tenant,
    Organization,
    Environment,
    Email,
    Password,
    AppScheme,
    AppName,
    AppIdentifier,
    /// Last payload received from the clock-in app
    ClockIns,
}

impl StoreKey {
    pub const ALL: [StoreKey; 9] = [
        StoreKey::Tenant,
        StoreKey::Organization,
        StoreKey::Environment,
        StoreKey::Email,
        StoreKey::Password,
        StoreKey::AppScheme,
        StoreKey::AppName,
        StoreKey::AppIdentifier,
        StoreKey::ClockIns,
    ];

    /// Field name without the version namespace
    pub fn field(&self) -> &'static str {
        match self {
            StoreKey::Tenant => "tenant",
            StoreKey::Organization => "organization",
            StoreKey::Environment => "environment",
            StoreKey::Email => "email",
            StoreKey::Password => "password",
            StoreKey::AppScheme => "appScheme",
            StoreKey::AppName => "appName",
            StoreKey::AppIdentifier => "appIdentifier",
            StoreKey::ClockIns => "clockins",
        }
    }

    /// Namespaced key as written to disk, e.g. `v1.tenant`
    pub fn as_key(&self) -> String {
        format!("{}{}", KEY_PREFIX, self.field())
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field())
    }
}

impl FromStr for StoreKey {
    type Err = LinkError;

    fn from_str(s: &str) -> Result<Self> {
        let field = s.strip_prefix(KEY_PREFIX).unwrap_or(s);
        StoreKey::ALL
            .into_iter()
            .find(|key| key.field() == field)
            .ok_or_else(|| {
                LinkError::Storage(
                    LABEL.to_owned(),
                    format!("Unknown key {}", s),
                )
            })
    }
}

/// Identity this application advertises when it starts a handshake.
///
/// Used as the fallback for the `appIdentifier`, `appName` and `appScheme`
/// keys. Values can be baked in at build time through the
/// `DEEPLINK_APP_IDENTIFIER`, `DEEPLINK_APP_NAME` and `DEEPLINK_APP_SCHEME`
/// environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppIdentity {
    pub identifier: String,
    pub name: String,
    pub scheme: String,
}

impl AppIdentity {
    pub fn from_build() -> Self {
        Self {
            identifier: option_env!("DEEPLINK_APP_IDENTIFIER")
                .unwrap_or("ai.carol.deeplinking")
                .to_owned(),
            name: option_env!("DEEPLINK_APP_NAME")
                .unwrap_or("Deep Linking")
                .to_owned(),
            scheme: option_env!("DEEPLINK_APP_SCHEME")
                .unwrap_or("deeplinking")
                .to_owned(),
        }
    }

    /// Build-time default for one of the identity keys, `None` otherwise
    pub fn default_for(&self, key: StoreKey) -> Option<&str> {
        match key {
            StoreKey::AppIdentifier => Some(&self.identifier),
            StoreKey::AppName => Some(&self.name),
            StoreKey::AppScheme => Some(&self.scheme),
            _ => None,
        }
    }
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self::from_build()
    }
}

/// Configuration fields and payload cache, persisted on every write.
///
/// Writes are flushed one key at a time; a sequence of `set` calls is not
/// atomic as a group.
pub struct Preferences {
    storage: FileStorage<String, String>,
    identity: AppIdentity,
}

impl Preferences {
    pub fn open(path: &Path, identity: AppIdentity) -> Result<Self> {
        let storage = FileStorage::load(LABEL.to_owned(), path)?;
        log::debug!(
            "{} loaded from {} with {} entries",
            LABEL,
            path.display(),
            storage.as_ref().len()
        );
        Ok(Self { storage, identity })
    }

    /// Stored value for `key`, or `default` when nothing is stored
    pub fn get(&self, key: StoreKey, default: Option<&str>) -> Option<String> {
        self.storage
            .get(&key.as_key())
            .map(String::to_owned)
            .or_else(|| default.map(str::to_owned))
    }

    /// Stored value falling back to the build identity for identity keys
    pub fn fetch(&self, key: StoreKey) -> Option<String> {
        self.get(key, self.identity.default_for(key))
    }

    /// Overwrite `key`; `None` removes it
    pub fn set(&mut self, key: StoreKey, value: Option<&str>) -> Result<()> {
        match value {
            Some(value) => {
                let previous = self.storage.get(&key.as_key()).cloned();
                self.storage.set(key.as_key(), value.to_owned());
                self.flush(key, previous)
            }
            None => self.clear(key),
        }
    }

    pub fn clear(&mut self, key: StoreKey) -> Result<()> {
        let previous = match self.storage.get(&key.as_key()).cloned() {
            Some(previous) => previous,
            None => return Ok(()),
        };
        self.storage.remove(&key.as_key())?;
        self.flush(key, Some(previous))
    }

    /// Persist the entries. On failure `key` is set back to `previous`.
    fn flush(&mut self, key: StoreKey, previous: Option<String>) -> Result<()> {
        let err = match self.storage.write_fs() {
            Ok(()) => return Ok(()),
            Err(err) => err,
        };

        log::warn!("{} not written, keeping previous value", key);
        match previous {
            Some(previous) => self.storage.set(key.as_key(), previous),
            None => {
                // Only reached after an insert, so the key is present
                self.storage.remove(&key.as_key()).ok();
            }
        }
        Err(err)
    }

    pub fn clock_ins(&self) -> Option<String> {
        self.get(StoreKey::ClockIns, None)
    }

    pub fn set_clock_ins(&mut self, payload: Option<&str>) -> Result<()> {
        self.set(StoreKey::ClockIns, payload)
    }

    /// Drop the whole preferences file
    pub fn erase(self) -> Result<()> {
        if !self.storage.path().exists() {
            return Ok(());
        }
        self.storage.erase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempdir::TempDir;

    fn identity() -> AppIdentity {
        AppIdentity {
            identifier: "com.acme.app".to_owned(),
            name: "My App".to_owned(),
            scheme: "myapp".to_owned(),
        }
    }

    #[test]
    fn values_survive_reopen() {
        let dir = TempDir::new("preferences").unwrap();
        let path = dir.path().join("preferences");

        let mut preferences = Preferences::open(&path, identity()).unwrap();
        preferences.set(StoreKey::Tenant, Some("acme")).unwrap();
        preferences.set(StoreKey::Tenant, Some("globex")).unwrap();
        preferences.set(StoreKey::Email, Some("a@b.com")).unwrap();
        drop(preferences);

        let preferences = Preferences::open(&path, identity()).unwrap();
        assert_eq!(
            preferences.get(StoreKey::Tenant, None).as_deref(),
            Some("globex")
        );
        assert_eq!(
            preferences.get(StoreKey::Email, None).as_deref(),
            Some("a@b.com")
        );

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"v1.tenant\""));
    }

    #[test]
    fn defaults_are_resolved_by_the_caller() {
        let dir = TempDir::new("preferences").unwrap();
        let preferences =
            Preferences::open(&dir.path().join("preferences"), identity())
                .unwrap();

        assert_eq!(preferences.get(StoreKey::Password, None), None);
        assert_eq!(
            preferences
                .get(StoreKey::Password, Some("fallback"))
                .as_deref(),
            Some("fallback")
        );
        assert_eq!(preferences.fetch(StoreKey::Tenant), None);
        assert_eq!(
            preferences.fetch(StoreKey::AppScheme).as_deref(),
            Some("myapp")
        );
        assert_eq!(
            preferences.fetch(StoreKey::AppIdentifier).as_deref(),
            Some("com.acme.app")
        );
    }

    #[test]
    fn stored_identity_overrides_default() {
        let dir = TempDir::new("preferences").unwrap();
        let mut preferences =
            Preferences::open(&dir.path().join("preferences"), identity())
                .unwrap();

        preferences.set(StoreKey::AppName, Some("Other")).unwrap();
        assert_eq!(
            preferences.fetch(StoreKey::AppName).as_deref(),
            Some("Other")
        );
    }

    #[test]
    fn clearing_resets_to_absent() {
        let dir = TempDir::new("preferences").unwrap();
        let path = dir.path().join("preferences");
        let mut preferences = Preferences::open(&path, identity()).unwrap();

        preferences.set_clock_ins(Some("[]")).unwrap();
        assert_eq!(preferences.clock_ins().as_deref(), Some("[]"));

        preferences.clear(StoreKey::ClockIns).unwrap();
        preferences.clear(StoreKey::ClockIns).unwrap();
        assert_eq!(preferences.clock_ins(), None);

        preferences.set_clock_ins(Some("[]")).unwrap();
        preferences.set_clock_ins(None).unwrap();
        let reopened = Preferences::open(&path, identity()).unwrap();
        assert_eq!(reopened.clock_ins(), None);
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let dir = TempDir::new("preferences").unwrap();
        let blocker = dir.path().join("not-a-folder");
        std::fs::write(&blocker, "").unwrap();
        let mut preferences =
            Preferences::open(&blocker.join("preferences"), identity())
                .unwrap();

        assert!(preferences.set_clock_ins(Some("[{}]")).is_err());
        assert_eq!(preferences.clock_ins(), None);
        assert_eq!(
            preferences.fetch(StoreKey::AppName).as_deref(),
            Some("My App")
        );
        assert!(preferences.set(StoreKey::AppName, Some("Other")).is_err());
        assert_eq!(
            preferences.fetch(StoreKey::AppName).as_deref(),
            Some("My App")
        );
    }

    #[test]
    fn failed_clear_keeps_value() {
        let dir = TempDir::new("preferences").unwrap();
        let folder = dir.path().join("store");
        let path = folder.join("preferences");
        let mut preferences = Preferences::open(&path, identity()).unwrap();
        preferences.set(StoreKey::Tenant, Some("acme")).unwrap();

        // Swap the folder for a regular file so the next write fails
        std::fs::remove_dir_all(&folder).unwrap();
        std::fs::write(&folder, "").unwrap();

        assert!(preferences.clear(StoreKey::Tenant).is_err());
        assert_eq!(
            preferences.get(StoreKey::Tenant, None).as_deref(),
            Some("acme")
        );
    }

    #[test]
    fn erase_removes_file() {
        let dir = TempDir::new("preferences").unwrap();
        let path = dir.path().join("preferences");
        let mut preferences = Preferences::open(&path, identity()).unwrap();
        preferences.set(StoreKey::Email, Some("a@b.com")).unwrap();
        assert!(path.exists());

        preferences.erase().unwrap();
        assert!(!path.exists());
    }

    #[rstest]
    #[case("tenant", StoreKey::Tenant)]
    #[case("v1.appScheme", StoreKey::AppScheme)]
    #[case("clockins", StoreKey::ClockIns)]
    fn parses_keys(#[case] raw: &str, #[case] expected: StoreKey) {
        assert_eq!(raw.parse::<StoreKey>().unwrap(), expected);
    }

    #[test]
    fn rejects_unknown_key() {
        assert!("v2.tenant".parse::<StoreKey>().is_err());
        assert!("AppScheme".parse::<StoreKey>().is_err());
    }
}

//! Both legs of the handshake.
//!
//! Outbound, the initiator validates its fields, builds the login link,
//! checks that the clock-in app is installed and launches it. Inbound, the
//! received link is parsed, decoded and cached for display. Failures end in
//! a prompt or in the zero state; nothing is thrown back at the OS.

use url::Url;

use crate::link::{self, redact, InboundRequest, LinkFields};
use crate::payload::{self, ClockIn};
use crate::resolve::{LaunchFlags, Launcher, Resolver};
use crate::storage::preferences::{Preferences, StoreKey};
use crate::{LinkError, Result, STORE_PACKAGE};

const EMPTY_PAYLOAD_TEXT: &str = "-";

/// Where an outbound attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outbound {
    /// Some fields are empty, the user has to complete the configuration
    FillFieldsPrompt { missing: Vec<&'static str> },
    /// Nothing can open the link, the user should install the receiver
    InstallPrompt { link: Url },
    /// The link was handed to the OS; there is no delivery confirmation
    Dispatched { link: Url },
    /// The link could not be built or its installed receiver not started
    LaunchFailed { reason: String },
}

/// Where an inbound link ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// No usable payload; the display goes back to its zero state
    Idle,
    Received(Summary),
}

/// What the UI shows about the cached payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Summary {
    pub count: usize,
    pub payload: Option<String>,
}

impl Summary {
    pub fn zero() -> Self {
        Self::default()
    }

    pub fn is_zero(&self) -> bool {
        self.count == 0 && self.payload.is_none()
    }

    /// Raw payload, or a dash when there is none
    pub fn payload_text(&self) -> &str {
        self.payload.as_deref().unwrap_or(EMPTY_PAYLOAD_TEXT)
    }
}

pub struct Dispatcher<'a, R, L> {
    preferences: &'a mut Preferences,
    resolver: &'a R,
    launcher: &'a L,
}

impl<'a, R, L> Dispatcher<'a, R, L>
where
    R: Resolver,
    L: Launcher,
{
    pub fn new(
        preferences: &'a mut Preferences,
        resolver: &'a R,
        launcher: &'a L,
    ) -> Self {
        Self {
            preferences,
            resolver,
            launcher,
        }
    }

    /// Start the clock-in app with the given fields
    pub fn send(&self, fields: &LinkFields) -> Outbound {
        let link = match link::build_link(fields) {
            Ok(link) => link,
            Err(LinkError::MissingFields(missing)) => {
                log::info!("missing fields: {}", missing.join(", "));
                return Outbound::FillFieldsPrompt { missing };
            }
            Err(err) => {
                log::error!("failed to build login link: {}", err);
                return Outbound::LaunchFailed {
                    reason: err.to_string(),
                };
            }
        };

        if !self.resolver.can_resolve(&link) {
            log::warn!("no receiver installed for {}", redact(&link));
            return Outbound::InstallPrompt { link };
        }

        match self.launcher.launch(&link, LaunchFlags::TASK_RESET) {
            Ok(()) => {
                log::info!("dispatched {}", redact(&link));
                Outbound::Dispatched { link }
            }
            Err(err) => {
                log::error!("failed to launch {}: {}", redact(&link), err);
                Outbound::LaunchFailed {
                    reason: err.to_string(),
                }
            }
        }
    }

    /// Start the clock-in app with the stored configuration
    pub fn send_configured(&self) -> Outbound {
        self.send(&LinkFields::from_preferences(&*self.preferences))
    }

    /// Handle a link delivered by the OS.
    ///
    /// The link is removed from `request` before anything else, so handling
    /// the same request again is a no-op. Links for other hosts leave the
    /// cache untouched. A clock-in link without a usable payload clears it.
    pub fn receive(&mut self, request: &mut InboundRequest) -> Inbound {
        let url = match request.take_link() {
            Some(url) => url,
            None => return Inbound::Idle,
        };
        if !link::is_response(&url) {
            log::debug!("ignoring link for another host: {}", redact(&url));
            return Inbound::Idle;
        }

        let records = match payload::decode(link::parse_link(&url).as_deref())
        {
            Ok(Some(records)) => records,
            Ok(None) => {
                log::warn!("no payload in {}", redact(&url));
                self.forget_cached();
                return Inbound::Idle;
            }
            Err(err) => {
                log::warn!("discarding inbound payload: {}", err);
                self.forget_cached();
                return Inbound::Idle;
            }
        };

        let encoded = match payload::encode(&records) {
            Ok(encoded) => encoded,
            Err(err) => {
                log::error!("failed to re-encode inbound payload: {}", err);
                return Inbound::Idle;
            }
        };

        if let Err(err) = self.preferences.set_clock_ins(Some(&encoded)) {
            log::error!("failed to cache inbound payload: {}", err);
            return Inbound::Idle;
        }

        log::info!("received {} clock-ins", records.len());
        Inbound::Received(Summary {
            count: records.len(),
            payload: Some(encoded),
        })
    }

    /// Cached payload and its record count.
    ///
    /// An unreadable cache is shown as the zero state.
    pub fn summary(&self) -> Summary {
        let cached = self
            .preferences
            .clock_ins()
            .filter(|raw| payload::decode(Some(raw.as_str())).is_ok());
        Summary {
            count: payload::count(cached.as_deref()),
            payload: cached,
        }
    }

    /// Records held in the cache, empty when there are none
    pub fn cached_records(&self) -> Vec<ClockIn> {
        payload::decode(self.preferences.clock_ins().as_deref())
            .ok()
            .flatten()
            .unwrap_or_default()
    }

    /// Forget the cached payload
    pub fn reset(&mut self) -> Result<()> {
        self.preferences.clear(StoreKey::ClockIns)
    }

    fn forget_cached(&mut self) {
        if let Err(err) = self.reset() {
            log::error!("failed to clear cached payload: {}", err);
        }
    }

    /// Hand `records` back to the application registered under `scheme`
    pub fn reply(&self, scheme: &str, records: &[ClockIn]) -> Result<Url> {
        let link = link::build_response_link(scheme, records)?;
        if !self.resolver.can_resolve(&link) {
            return Err(LinkError::ReceiverUnavailable(redact(&link)));
        }

        self.launcher.launch(&link, LaunchFlags::NEW_TASK)?;
        log::info!("replied with {} clock-ins to {}", records.len(), scheme);
        Ok(link)
    }
}

/// Store listing of the clock-in app, offered when it is not installed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorePage {
    package: String,
}

impl StorePage {
    pub fn new(package: &str) -> Self {
        Self {
            package: package.to_owned(),
        }
    }

    pub fn market_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!("market://details?id={}", self.package))?)
    }

    pub fn web_url(&self) -> Result<Url> {
        Ok(Url::parse(&format!(
            "https://play.google.com/store/apps/details?id={}",
            self.package
        ))?)
    }

    /// Open the store app, falling back to the web listing when no store
    /// app can be launched. Returns the link that was opened.
    pub fn open<L: Launcher>(&self, launcher: &L) -> Result<Url> {
        let market = self.market_url()?;
        match launcher.launch(&market, LaunchFlags::default()) {
            Ok(()) => Ok(market),
            Err(err) => {
                log::warn!("store app unavailable ({}), using the web", err);
                let web = self.web_url()?;
                launcher.launch(&web, LaunchFlags::default())?;
                Ok(web)
            }
        }
    }
}

impl Default for StorePage {
    fn default() -> Self {
        Self::new(STORE_PACKAGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Handler;
    use crate::storage::preferences::AppIdentity;
    use rstest::rstest;
    use std::cell::RefCell;
    use tempdir::TempDir;

    /// Schemes that resolve, and every launch attempt in order
    #[derive(Default)]
    struct FakeShell {
        installed: Vec<&'static str>,
        broken: bool,
        launched: RefCell<Vec<(Url, LaunchFlags)>>,
    }

    impl Resolver for FakeShell {
        fn resolve(&self, url: &Url) -> Vec<Handler> {
            self.installed
                .iter()
                .filter(|scheme| **scheme == url.scheme())
                .map(|scheme| Handler {
                    scheme: scheme.to_string(),
                    command: vec!["fake".to_owned()],
                })
                .collect()
        }
    }

    impl Launcher for FakeShell {
        fn launch(&self, url: &Url, flags: LaunchFlags) -> Result<()> {
            self.launched.borrow_mut().push((url.clone(), flags));
            if self.broken {
                Err(LinkError::Launch(url.to_string(), "crashed".to_owned()))
            } else if self.can_resolve(url) {
                Ok(())
            } else {
                Err(LinkError::ReceiverUnavailable(url.to_string()))
            }
        }
    }

    fn preferences(dir: &TempDir) -> Preferences {
        Preferences::open(
            &dir.path().join("preferences"),
            AppIdentity {
                identifier: "com.acme.app".to_owned(),
                name: "My App".to_owned(),
                scheme: "myapp".to_owned(),
            },
        )
        .unwrap()
    }

    #[test]
    fn empty_configuration_prompts_for_fields() {
        let dir = TempDir::new("dispatch").unwrap();
        let mut preferences = preferences(&dir);
        let shell = FakeShell {
            installed: vec!["clockin"],
            ..Default::default()
        };

        let dispatcher = Dispatcher::new(&mut preferences, &shell, &shell);
        assert_eq!(
            dispatcher.send_configured(),
            Outbound::FillFieldsPrompt {
                missing: vec!["tenant", "email", "password"]
            }
        );
        assert!(shell.launched.borrow().is_empty());
    }

    #[test]
    fn configured_fields_are_dispatched() {
        let dir = TempDir::new("dispatch").unwrap();
        let mut preferences = preferences(&dir);
        preferences.set(StoreKey::Organization, Some("acme")).unwrap();
        preferences.set(StoreKey::Environment, Some("prod")).unwrap();
        preferences.set(StoreKey::Email, Some("a@b.com")).unwrap();
        preferences.set(StoreKey::Password, Some("x")).unwrap();
        let shell = FakeShell {
            installed: vec!["clockin"],
            ..Default::default()
        };

        let dispatcher = Dispatcher::new(&mut preferences, &shell, &shell);
        let link = match dispatcher.send_configured() {
            Outbound::Dispatched { link } => link,
            other => panic!("unexpected outcome: {:?}", other),
        };

        let query: Vec<(String, String)> =
            link.query_pairs().into_owned().collect();
        assert_eq!(query[0], ("organization".into(), "acme".into()));
        assert_eq!(query[1], ("environment".into(), "prod".into()));
        assert!(query.contains(&("appScheme".into(), "myapp".into())));
        assert_eq!(
            shell.launched.borrow().as_slice(),
            [(link, LaunchFlags::TASK_RESET)]
        );
    }

    #[test]
    fn launch_failure_is_an_outcome() {
        let dir = TempDir::new("dispatch").unwrap();
        let mut preferences = preferences(&dir);
        preferences.set(StoreKey::Tenant, Some("acme")).unwrap();
        preferences.set(StoreKey::Email, Some("a@b.com")).unwrap();
        preferences.set(StoreKey::Password, Some("x")).unwrap();
        let shell = FakeShell {
            installed: vec!["clockin"],
            broken: true,
            ..Default::default()
        };

        let dispatcher = Dispatcher::new(&mut preferences, &shell, &shell);
        match dispatcher.send_configured() {
            Outbound::LaunchFailed { reason } => {
                assert!(reason.contains("crashed"))
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(shell.launched.borrow().len(), 1);
    }

    #[rstest]
    #[case("myapp://clockin?data=not%20json")]
    #[case("myapp://clockin?other=1")]
    #[case("myapp://clockin")]
    #[case("myapp://clockin?data=%5B1%2C2%5D")]
    fn unusable_payload_clears_cache(#[case] raw: &str) {
        let dir = TempDir::new("dispatch").unwrap();
        let mut preferences = preferences(&dir);
        preferences.set_clock_ins(Some("[{},{},{}]")).unwrap();
        let shell = FakeShell::default();

        let mut dispatcher = Dispatcher::new(&mut preferences, &shell, &shell);
        let url = Url::parse(raw).unwrap();
        assert_eq!(
            dispatcher.receive(&mut InboundRequest::from(url)),
            Inbound::Idle
        );
        assert_eq!(dispatcher.summary(), Summary::zero());
        drop(dispatcher);

        assert_eq!(preferences.clock_ins(), None);
    }

    #[test]
    fn foreign_host_keeps_cache() {
        let dir = TempDir::new("dispatch").unwrap();
        let mut preferences = preferences(&dir);
        preferences.set_clock_ins(Some("[{},{},{}]")).unwrap();
        let shell = FakeShell::default();

        let mut dispatcher = Dispatcher::new(&mut preferences, &shell, &shell);
        let url = Url::parse("myapp://otherapp?other=1").unwrap();
        assert_eq!(
            dispatcher.receive(&mut InboundRequest::from(url)),
            Inbound::Idle
        );
        assert_eq!(dispatcher.summary().count, 3);
    }

    #[test]
    fn unwritable_store_is_not_reported() {
        let dir = TempDir::new("dispatch").unwrap();
        let blocker = dir.path().join("not-a-folder");
        std::fs::write(&blocker, "").unwrap();
        let mut preferences = Preferences::open(
            &blocker.join("preferences"),
            AppIdentity::default(),
        )
        .unwrap();
        let shell = FakeShell::default();

        let mut dispatcher = Dispatcher::new(&mut preferences, &shell, &shell);
        let url = Url::parse("myapp://clockin?data=%5B%7B%7D%5D").unwrap();
        assert_eq!(
            dispatcher.receive(&mut InboundRequest::from(url)),
            Inbound::Idle
        );
        assert!(dispatcher.summary().is_zero());
    }

    #[test]
    fn unreadable_cache_shows_zero_state() {
        let dir = TempDir::new("dispatch").unwrap();
        let mut preferences = preferences(&dir);
        preferences.set_clock_ins(Some("{broken")).unwrap();
        let shell = FakeShell::default();

        let dispatcher = Dispatcher::new(&mut preferences, &shell, &shell);
        let summary = dispatcher.summary();
        assert!(summary.is_zero());
        assert_eq!(summary.payload_text(), "-");
        assert!(dispatcher.cached_records().is_empty());
    }

    #[test]
    fn reply_requires_installed_initiator() {
        let dir = TempDir::new("dispatch").unwrap();
        let mut preferences = preferences(&dir);
        let shell = FakeShell {
            installed: vec!["myapp"],
            ..Default::default()
        };

        let dispatcher = Dispatcher::new(&mut preferences, &shell, &shell);
        let link = dispatcher.reply("myapp", &[ClockIn::default()]).unwrap();
        assert_eq!(link.as_str(), "myapp://clockin?data=%5B%7B%7D%5D");

        assert!(matches!(
            dispatcher.reply("otherapp", &[]),
            Err(LinkError::ReceiverUnavailable(_))
        ));
        assert_eq!(shell.launched.borrow().len(), 1);
    }

    #[test]
    fn store_page_falls_back_to_web() {
        let shell = FakeShell {
            installed: vec!["https"],
            ..Default::default()
        };

        let opened = StorePage::default().open(&shell).unwrap();
        assert_eq!(
            opened.as_str(),
            "https://play.google.com/store/apps/details?id=com.clockinfieldtools"
        );

        let schemes: Vec<String> = shell
            .launched
            .borrow()
            .iter()
            .map(|(url, _)| url.scheme().to_owned())
            .collect();
        assert_eq!(schemes, ["market", "https"]);
    }

    #[test]
    fn store_page_prefers_market() {
        let shell = FakeShell {
            installed: vec!["market", "https"],
            ..Default::default()
        };

        let opened = StorePage::new("com.acme.clock").open(&shell).unwrap();
        assert_eq!(opened.as_str(), "market://details?id=com.acme.clock");
        assert_eq!(shell.launched.borrow().len(), 1);
    }
}

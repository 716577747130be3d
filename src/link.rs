//! Building outbound login links and parsing inbound clock-in links.
//!
//! Outbound:
//! ```text
//! <scheme>://login/oauth2?tenant=<t>&email=<e>&password=<p>&appScheme=<s>&appName=<n>&appIdentifier=<i>
//! ```
//! Inbound:
//! ```text
//! <our-scheme>://clockin?data=<url-encoded JSON array>
//! ```

use url::Url;

use crate::payload::{self, ClockIn};
use crate::storage::preferences::{Preferences, StoreKey};
use crate::{LinkError, Result};

/// Scheme registered by the clock-in app
pub const RECEIVER_SCHEME: &str = "clockin";
pub const LOGIN_AUTHORITY: &str = "login";
pub const OAUTH2_PATH: &str = "oauth2";

/// Host every inbound link must carry to be considered ours
pub const RESPONSE_HOST: &str = "clockin";
pub const DATA_PARAMETER: &str = "data";

/// How the initiator identifies the customer it logs into.
///
/// The two variants are separate generations of the protocol and are never
/// mixed in a single link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Tenancy {
    Tenant(String),
    Organization {
        organization: String,
        environment: String,
    },
}

/// Values the initiator sends to the clock-in app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkFields {
    pub tenancy: Tenancy,
    pub email: String,
    pub password: String,
    pub app_scheme: String,
    pub app_name: String,
    pub app_identifier: String,
}

impl LinkFields {
    /// Read the fields from the stored configuration.
    ///
    /// An organization, once configured, selects the organization variant.
    /// Missing values come back empty and are caught by validation.
    pub fn from_preferences(preferences: &Preferences) -> Self {
        let value = |key| preferences.fetch(key).unwrap_or_default();

        let organization = value(StoreKey::Organization);
        let tenancy = if organization.is_empty() {
            Tenancy::Tenant(value(StoreKey::Tenant))
        } else {
            Tenancy::Organization {
                organization,
                environment: value(StoreKey::Environment),
            }
        };

        Self {
            tenancy,
            email: value(StoreKey::Email),
            password: value(StoreKey::Password),
            app_scheme: value(StoreKey::AppScheme),
            app_name: value(StoreKey::AppName),
            app_identifier: value(StoreKey::AppIdentifier),
        }
    }

    /// Query parameters in wire order
    fn parameters(&self) -> Vec<(&'static str, &str)> {
        let mut parameters = match &self.tenancy {
            Tenancy::Tenant(tenant) => vec![("tenant", tenant.as_str())],
            Tenancy::Organization {
                organization,
                environment,
            } => vec![
                ("organization", organization.as_str()),
                ("environment", environment.as_str()),
            ],
        };
        parameters.extend([
            ("email", self.email.as_str()),
            ("password", self.password.as_str()),
            ("appScheme", self.app_scheme.as_str()),
            ("appName", self.app_name.as_str()),
            ("appIdentifier", self.app_identifier.as_str()),
        ]);
        parameters
    }

    /// Names of the fields left empty, in wire order
    pub fn missing(&self) -> Vec<&'static str> {
        self.parameters()
            .into_iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name)
            .collect()
    }
}

/// A validated login request, ready to be turned into a URI.
#[derive(Debug, Clone)]
pub struct LinkRequest {
    scheme: String,
    parameters: Vec<(&'static str, String)>,
}

impl LinkRequest {
    /// Validate `fields` for the receiver registered under `scheme`
    pub fn new(scheme: &str, fields: &LinkFields) -> Result<Self> {
        let missing = fields.missing();
        if !missing.is_empty() {
            return Err(LinkError::MissingFields(missing));
        }

        Ok(Self {
            scheme: scheme.to_owned(),
            parameters: fields
                .parameters()
                .into_iter()
                .map(|(name, value)| (name, value.to_owned()))
                .collect(),
        })
    }

    pub fn to_url(&self) -> Result<Url> {
        let mut url = Url::parse(&format!(
            "{}://{}/{}",
            self.scheme, LOGIN_AUTHORITY, OAUTH2_PATH
        ))?;
        {
            let mut query = url.query_pairs_mut();
            for (name, value) in &self.parameters {
                query.append_pair(name, value);
            }
        }
        Ok(url)
    }
}

/// Build the login link for the clock-in app.
///
/// Fails with [`LinkError::MissingFields`] when any field is empty.
pub fn build_link(fields: &LinkFields) -> Result<Url> {
    LinkRequest::new(RECEIVER_SCHEME, fields)?.to_url()
}

/// Build the link the clock-in app uses to hand records back to `scheme`
pub fn build_response_link(scheme: &str, records: &[ClockIn]) -> Result<Url> {
    let mut url = Url::parse(&format!("{}://{}", scheme, RESPONSE_HOST))?;
    url.query_pairs_mut()
        .append_pair(DATA_PARAMETER, &payload::encode(records)?);
    Ok(url)
}

/// Whether `url` is addressed to the clock-in response host
pub fn is_response(url: &Url) -> bool {
    url.host_str() == Some(RESPONSE_HOST)
}

/// Extract the raw payload of an inbound link.
///
/// Links for any other host are not ours and yield `None`.
pub fn parse_link(url: &Url) -> Option<String> {
    if !is_response(url) {
        log::debug!("ignoring link for another host: {}", redact(url));
        return None;
    }

    url.query_pairs()
        .find(|(name, _)| name == DATA_PARAMETER)
        .map(|(_, value)| value.into_owned())
}

/// Link without its query, safe to log
pub(crate) fn redact(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Transport handle delivered by the OS, holding at most one link.
///
/// Taking the link empties the slot so a later re-entry with the same
/// request, e.g. on resume, does not process the link twice.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    link: Option<Url>,
}

impl InboundRequest {
    pub fn new(link: Url) -> Self {
        Self { link: Some(link) }
    }

    pub fn link(&self) -> Option<&Url> {
        self.link.as_ref()
    }

    pub fn take_link(&mut self) -> Option<Url> {
        self.link.take()
    }
}

impl From<Url> for InboundRequest {
    fn from(link: Url) -> Self {
        Self::new(link)
    }
}

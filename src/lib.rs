//! Deep-link handshake between two installed applications.
//!
//! The initiator encodes its credentials into a custom-scheme URI and hands
//! it to the OS; the receiver parses the inbound URI, decodes the clock-in
//! payload carried in its `data` parameter and caches it locally.

pub mod dispatch;
mod errors;
pub mod link;
pub mod payload;
pub mod resolve;
pub mod storage;

pub use dispatch::{Dispatcher, Inbound, Outbound, StorePage, Summary};
pub use errors::{LinkError, Result};
pub use link::{InboundRequest, LinkFields, LinkRequest, Tenancy};
pub use payload::{ClockIn, Coordinates};
pub use resolve::{Handler, HandlerRegistry, LaunchFlags, Launcher, Resolver};
pub use storage::preferences::{AppIdentity, Preferences, StoreKey};

pub const DEEPLINK_FOLDER: &str = ".deeplink";

// Persisted state
pub const PREFERENCES_FILE: &str = "preferences";
pub const HANDLERS_FILE: &str = "handlers";

// Package the install prompt points the store at
pub const STORE_PACKAGE: &str = "com.clockinfieldtools";

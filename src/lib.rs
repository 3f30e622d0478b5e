//! Language detection and locale-prefixed URLs for web routing layers.
//!
//! Incoming requests like `/de/site/page` are mapped to the route
//! `site/page` with the language `de`; requests without a language code are
//! redirected to the persisted or detected language. Generated URLs get the
//! active language inserted after the base URL.

pub mod config;
pub mod error;
pub mod events;
pub mod i18n;
pub mod persistence;
pub mod resolver;
pub mod routing;
pub mod server;
pub mod splice;

pub use config::{Config, IgnorePattern, ServerConfig};
pub use error::{LocaleError, Result};
pub use events::{ChangeNotifier, LanguageChanged};
pub use resolver::{Action, LocaleResolver, RequestContext, RequestSources};
pub use routing::{RouteBuilder, StaticRouteBuilder, UrlParams};
pub use server::{locale_router, LocaleState, LocaleUrls};

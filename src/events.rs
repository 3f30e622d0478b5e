//! Language change notifications.

use tracing::debug;

/// A persisted language changed from `old_language` to `language`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageChanged {
    /// Previously persisted language, `None` if nothing was persisted yet
    pub old_language: Option<String>,

    /// Newly persisted language
    pub language: String,
}

type Handler = Box<dyn Fn(&LanguageChanged) + Send + Sync>;

/// Observer list for [`LanguageChanged`] events.
///
/// Subscribers are registered while the resolver is being set up; after that
/// the notifier is shared read-only across requests.
#[derive(Default)]
pub struct ChangeNotifier {
    handlers: Vec<Handler>,
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, handler: F)
    where
        F: Fn(&LanguageChanged) + Send + Sync + 'static,
    {
        self.handlers.push(Box::new(handler));
    }

    pub fn has_subscribers(&self) -> bool {
        !self.handlers.is_empty()
    }

    /// Notify every subscriber, in subscription order.
    pub fn notify(&self, event: &LanguageChanged) {
        debug!(
            "Language changed: {:?} -> '{}' ({} subscribers)",
            event.old_language,
            event.language,
            self.handlers.len()
        );
        for handler in &self.handlers {
            handler(event);
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

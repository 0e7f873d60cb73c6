use std::collections::HashMap;
use std::sync::Arc;

use crate::channels::discord::DiscordNotifier;
use crate::channels::email::EmailNotifier;
use crate::channels::slack::SlackNotifier;
use crate::channels::webhook::WebhookNotifier;
use crate::Notifier;
use vigil_common::channel::ChannelType;

/// Lookup table from channel type to notifier implementation.
///
/// Built once at startup and handed to the dispatcher; callers that
/// need a custom transport register it before sharing the registry.
pub struct NotifierRegistry {
    notifiers: HashMap<ChannelType, Arc<dyn Notifier>>,
}

impl NotifierRegistry {
    pub fn new() -> Self {
        Self {
            notifiers: HashMap::new(),
        }
    }

    /// Registry preloaded with the built-in channel types.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(EmailNotifier));
        registry.register(Arc::new(SlackNotifier::new()));
        registry.register(Arc::new(DiscordNotifier::new()));
        registry.register(Arc::new(WebhookNotifier::new()));
        registry
    }

    /// Replaces any notifier previously registered for the same type.
    pub fn register(&mut self, notifier: Arc<dyn Notifier>) {
        self.notifiers.insert(notifier.channel_type(), notifier);
    }

    pub fn get(&self, channel_type: ChannelType) -> Option<Arc<dyn Notifier>> {
        self.notifiers.get(&channel_type).cloned()
    }

    pub fn len(&self) -> usize {
        self.notifiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notifiers.is_empty()
    }
}

impl Default for NotifierRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

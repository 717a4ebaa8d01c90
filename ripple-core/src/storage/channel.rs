//! Publish/subscribe channel backend.
//!
//! A [`MessageChannel`] delivers JSON messages published on named channels.
//! [`ChannelStorage`] subscribes a signal to one channel and turns every
//! message into a new value through a caller-supplied transform.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;

use super::{ChangeNotifier, StorageAdapter};
use crate::error::{ReactiveError, Result};

/// Callback receiving messages from a channel.
pub type MessageHandler = Rc<dyn Fn(serde_json::Value)>;

/// Callback receiving channel failures.
pub type ChannelErrorHandler = Rc<dyn Fn(&ReactiveError)>;

/// Which retained messages a new subscription receives first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReplayPosition {
    /// Only messages published after subscribing.
    #[default]
    Latest,
    /// Every retained message, then new ones.
    All,
    /// Retained messages with a replay id greater than the given one.
    After(u64),
}

/// Handle returned by [`MessageChannel::subscribe`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    pub channel: String,
    pub id: u64,
}

/// A publish/subscribe service.
pub trait MessageChannel {
    fn subscribe(
        &self,
        channel: &str,
        replay: ReplayPosition,
        on_message: MessageHandler,
    ) -> Result<SubscriptionId>;

    fn unsubscribe(&self, subscription: &SubscriptionId) -> Result<()>;

    /// Whether the service is available at all.
    fn is_enabled(&self) -> bool;

    /// Register a handler for failures reported by the service.
    fn on_error(&self, handler: ChannelErrorHandler);
}

#[derive(Default)]
struct ChannelState {
    subscriptions: IndexMap<String, Vec<(u64, MessageHandler)>>,
    retained: HashMap<String, Vec<serde_json::Value>>,
    error_handlers: Vec<ChannelErrorHandler>,
    next_id: u64,
}

/// Single-process [`MessageChannel`] that retains every published message.
///
/// Replay ids are 1-based positions in a channel's history.
#[derive(Clone)]
pub struct InMemoryChannel {
    state: Rc<RefCell<ChannelState>>,
    enabled: Rc<Cell<bool>>,
}

impl Default for InMemoryChannel {
    fn default() -> Self {
        Self {
            state: Rc::default(),
            enabled: Rc::new(Cell::new(true)),
        }
    }
}

impl InMemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
    }

    /// Publish `message` on `channel`, returning its replay id.
    pub fn publish(&self, channel: &str, message: serde_json::Value) -> u64 {
        let (replay_id, handlers) = {
            let mut state = self.state.borrow_mut();
            let retained = state.retained.entry(channel.to_owned()).or_default();
            retained.push(message.clone());
            let replay_id = retained.len() as u64;

            let handlers: Vec<MessageHandler> = state
                .subscriptions
                .get(channel)
                .map(|subs| subs.iter().map(|(_, h)| Rc::clone(h)).collect())
                .unwrap_or_default();
            (replay_id, handlers)
        };

        tracing::trace!(channel, replay_id, subscribers = handlers.len(), "publishing message");
        for handler in handlers {
            handler(message.clone());
        }
        replay_id
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.state
            .borrow()
            .subscriptions
            .get(channel)
            .map_or(0, Vec::len)
    }

    fn fail(&self, error: ReactiveError) -> ReactiveError {
        let handlers = self.state.borrow().error_handlers.clone();
        for handler in handlers {
            handler(&error);
        }
        error
    }
}

impl MessageChannel for InMemoryChannel {
    fn subscribe(
        &self,
        channel: &str,
        replay: ReplayPosition,
        on_message: MessageHandler,
    ) -> Result<SubscriptionId> {
        if !self.is_enabled() {
            return Err(self.fail(ReactiveError::Storage {
                backend: "channel",
                message: format!("cannot subscribe to \"{channel}\": service is disabled"),
            }));
        }

        let (id, backlog) = {
            let mut state = self.state.borrow_mut();
            let id = state.next_id;
            state.next_id += 1;
            state
                .subscriptions
                .entry(channel.to_owned())
                .or_default()
                .push((id, Rc::clone(&on_message)));

            let retained = state.retained.get(channel).map(Vec::as_slice).unwrap_or(&[]);
            let skip = match replay {
                ReplayPosition::Latest => retained.len(),
                ReplayPosition::All => 0,
                ReplayPosition::After(replay_id) => (replay_id as usize).min(retained.len()),
            };
            (id, retained[skip..].to_vec())
        };

        for message in backlog {
            on_message(message);
        }

        Ok(SubscriptionId {
            channel: channel.to_owned(),
            id,
        })
    }

    fn unsubscribe(&self, subscription: &SubscriptionId) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let removed = state
            .subscriptions
            .get_mut(&subscription.channel)
            .map(|subs| {
                let before = subs.len();
                subs.retain(|(id, _)| *id != subscription.id);
                before != subs.len()
            })
            .unwrap_or(false);
        drop(state);

        if removed {
            Ok(())
        } else {
            Err(self.fail(ReactiveError::Storage {
                backend: "channel",
                message: format!(
                    "unknown subscription {} on \"{}\"",
                    subscription.id, subscription.channel
                ),
            }))
        }
    }

    fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    fn on_error(&self, handler: ChannelErrorHandler) {
        self.state.borrow_mut().error_handlers.push(handler);
    }
}

/// Storage adapter fed by a channel subscription.
///
/// Writes only change the local value; nothing is published.
pub struct ChannelStorage<T> {
    service: Rc<dyn MessageChannel>,
    value: Rc<RefCell<T>>,
    on_change: Rc<RefCell<Option<ChangeNotifier>>>,
    subscription: RefCell<Option<SubscriptionId>>,
}

impl<T: Clone + 'static> ChannelStorage<T> {
    pub fn new(
        service: Rc<dyn MessageChannel>,
        channel: &str,
        replay: ReplayPosition,
        value: T,
        transform: impl Fn(serde_json::Value) -> T + 'static,
    ) -> Self {
        let value = Rc::new(RefCell::new(value));
        let on_change: Rc<RefCell<Option<ChangeNotifier>>> = Rc::new(RefCell::new(None));

        let subscription = if service.is_enabled() {
            let handler: MessageHandler = {
                let value = Rc::clone(&value);
                let on_change = Rc::clone(&on_change);
                Rc::new(move |message| {
                    *value.borrow_mut() = transform(message);
                    let notify = on_change.borrow().clone();
                    if let Some(notify) = notify {
                        notify();
                    }
                })
            };

            match service.subscribe(channel, replay, handler) {
                Ok(subscription) => Some(subscription),
                Err(error) => {
                    tracing::error!(channel, %error, "channel subscription failed");
                    None
                }
            }
        } else {
            tracing::warn!(channel, "channel service is disabled, value will not update");
            None
        };

        Self {
            service,
            value,
            on_change,
            subscription: RefCell::new(subscription),
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscription.borrow().is_some()
    }
}

impl<T: Clone + 'static> StorageAdapter<T> for ChannelStorage<T> {
    fn get(&self) -> T {
        self.value.borrow().clone()
    }

    fn set(&self, value: T) {
        *self.value.borrow_mut() = value;
    }

    fn register_on_change(&self, notify: ChangeNotifier) {
        *self.on_change.borrow_mut() = Some(notify);
    }

    fn unsubscribe(&self) {
        let Some(subscription) = self.subscription.borrow_mut().take() else {
            return;
        };
        if let Err(error) = self.service.unsubscribe(&subscription) {
            tracing::error!(channel = %subscription.channel, %error, "channel unsubscribe failed");
        }
    }
}

/// Storage factory subscribing a signal to `channel`.
pub fn use_channel<T, F>(
    service: Rc<dyn MessageChannel>,
    channel: impl Into<String>,
    transform: F,
) -> impl FnOnce(T) -> ChannelStorage<T>
where
    T: Clone + 'static,
    F: Fn(serde_json::Value) -> T + 'static,
{
    let channel = channel.into();
    move |value| ChannelStorage::new(service, &channel, ReplayPosition::Latest, value, transform)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{Signal, SignalOptions};
    use serde_json::json;

    fn message_text(message: serde_json::Value) -> String {
        message["data"]["payload"]["Message"]
            .as_str()
            .unwrap_or_default()
            .to_owned()
    }

    #[test]
    fn published_messages_update_the_signal() {
        let service = InMemoryChannel::new();
        let signal = Signal::with_options(
            String::new(),
            SignalOptions::new().storage(use_channel(
                Rc::new(service.clone()),
                "/event/Test",
                message_text,
            )),
        );
        assert_eq!(signal.peek(), "");

        service.publish("/event/Test", json!({"data": {"payload": {"Message": "Hello World!"}}}));
        assert_eq!(signal.peek(), "Hello World!");
    }

    #[test]
    fn replay_delivers_retained_messages() {
        let service = InMemoryChannel::new();
        service.publish("c", json!(1));
        service.publish("c", json!(2));
        service.publish("c", json!(3));

        let all = ChannelStorage::new(Rc::new(service.clone()), "c", ReplayPosition::All, 0, |m| {
            m.as_i64().unwrap_or(0)
        });
        let after = ChannelStorage::new(Rc::new(service.clone()), "c", ReplayPosition::After(1), 0, |m| {
            m.as_i64().unwrap_or(0) * 10
        });
        let latest = ChannelStorage::new(Rc::new(service.clone()), "c", ReplayPosition::Latest, 0, |m| {
            m.as_i64().unwrap_or(0)
        });

        assert_eq!(all.get(), 3);
        assert_eq!(after.get(), 30);
        assert_eq!(latest.get(), 0);
    }

    #[test]
    fn unsubscribe_tears_down_subscription() {
        let service = InMemoryChannel::new();
        let storage = ChannelStorage::new(Rc::new(service.clone()), "c", ReplayPosition::Latest, 0, |m| {
            m.as_i64().unwrap_or(0)
        });
        assert_eq!(service.subscriber_count("c"), 1);

        storage.unsubscribe();
        assert_eq!(service.subscriber_count("c"), 0);
        assert!(!storage.is_subscribed());

        service.publish("c", json!(4));
        assert_eq!(storage.get(), 0);
    }

    #[test]
    fn disabled_service_reports_errors() {
        let service = InMemoryChannel::new();
        let errors = Rc::new(Cell::new(0));
        service.on_error({
            let errors = errors.clone();
            Rc::new(move |_| errors.set(errors.get() + 1))
        });

        service.set_enabled(false);
        let result = service.subscribe("c", ReplayPosition::Latest, Rc::new(|_| {}));
        assert!(matches!(result, Err(ReactiveError::Storage { backend: "channel", .. })));
        assert_eq!(errors.get(), 1);

        let storage = ChannelStorage::new(Rc::new(service), "c", ReplayPosition::Latest, 1, |_| 2);
        assert!(!storage.is_subscribed());
        assert_eq!(storage.get(), 1);
    }
}

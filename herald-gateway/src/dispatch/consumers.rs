//! Ready-made consumers.

use herald_core::error::ConsumerError;
use herald_core::event::ServerEvent;
use tokio::sync::mpsc;

use super::EventConsumer;

type Callback = Box<dyn Fn(&ServerEvent) -> Result<(), ConsumerError> + Send + Sync>;

/// Runs a closure for every event.
pub struct CallbackConsumer {
    name: String,
    callback: Callback,
}

impl CallbackConsumer {
    /// Creates a new callback consumer.
    pub fn new<F>(name: impl Into<String>, callback: F) -> Self
    where
        F: Fn(&ServerEvent) -> Result<(), ConsumerError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            callback: Box::new(callback),
        }
    }
}

impl EventConsumer for CallbackConsumer {
    fn on_event(&self, event: &ServerEvent) -> Result<(), ConsumerError> {
        (self.callback)(event)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Forwards events into a bounded mpsc channel without waiting.
///
/// A full or closed channel is reported as a consumer failure.
pub struct ChannelConsumer {
    name: String,
    sender: mpsc::Sender<ServerEvent>,
}

impl ChannelConsumer {
    /// Creates a consumer writing into `sender`.
    #[must_use]
    pub fn new(name: impl Into<String>, sender: mpsc::Sender<ServerEvent>) -> Self {
        Self {
            name: name.into(),
            sender,
        }
    }

    /// Creates a consumer together with its receiver.
    #[must_use]
    pub fn with_channel(
        name: impl Into<String>,
        capacity: usize,
    ) -> (Self, mpsc::Receiver<ServerEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(name, tx), rx)
    }
}

impl EventConsumer for ChannelConsumer {
    fn on_event(&self, event: &ServerEvent) -> Result<(), ConsumerError> {
        self.sender
            .try_send(event.clone())
            .map_err(|_| ConsumerError::ChannelClosed {
                consumer: self.name.clone(),
            })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_consumer_forwards() {
        let (consumer, mut rx) = ChannelConsumer::with_channel("ui", 4);
        let event = ServerEvent::connection_status(true, None);
        consumer.on_event(&event).unwrap();
        assert_eq!(rx.try_recv().unwrap(), event);
    }

    #[test]
    fn test_channel_consumer_full() {
        let (consumer, _rx) = ChannelConsumer::with_channel("ui", 1);
        let event = ServerEvent::connection_status(false, None);
        consumer.on_event(&event).unwrap();
        assert!(matches!(
            consumer.on_event(&event),
            Err(ConsumerError::ChannelClosed { .. })
        ));
    }

    #[test]
    fn test_channel_consumer_closed() {
        let (consumer, rx) = ChannelConsumer::with_channel("ui", 1);
        drop(rx);
        assert!(consumer
            .on_event(&ServerEvent::connection_status(false, None))
            .is_err());
    }
}

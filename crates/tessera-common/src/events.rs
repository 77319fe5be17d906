use tokio::sync::broadcast;

/// Fan-out channel for out-of-band pushes (clicks, resizes, closes).
///
/// Publishing never blocks; with no subscribers the event is dropped.
pub struct EventBus<T: Clone> {
    sender: broadcast::Sender<T>,
}

impl<T: Clone> EventBus<T> {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<T> {
        self.sender.subscribe()
    }

    pub fn publish(&self, event: T) -> usize {
        self.sender.send(event).unwrap_or(0)
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl<T: Clone> Clone for EventBus<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq)]
    enum Ping {
        Tap(u32),
        Closed,
    }

    #[tokio::test]
    async fn publish_and_receive() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(Ping::Tap(1));

        assert_eq!(rx.recv().await.unwrap(), Ping::Tap(1));
    }

    #[tokio::test]
    async fn multiple_subscribers() {
        let bus = EventBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(Ping::Closed);

        assert_eq!(rx1.recv().await.unwrap(), Ping::Closed);
        assert_eq!(rx2.recv().await.unwrap(), Ping::Closed);
    }

    #[test]
    fn publish_returns_zero_with_no_subscribers() {
        let bus: EventBus<Ping> = EventBus::new(16);
        assert_eq!(bus.publish(Ping::Closed), 0);
    }

    #[tokio::test]
    async fn clones_share_one_channel() {
        let bus = EventBus::new(16);
        let other = bus.clone();
        let mut rx = bus.subscribe();

        assert_eq!(other.publish(Ping::Tap(7)), 1);
        assert_eq!(rx.recv().await.unwrap(), Ping::Tap(7));
        assert_eq!(bus.subscriber_count(), 1);
    }
}

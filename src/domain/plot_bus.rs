//! Broadcast channel for published plots.
//!
//! [`PlotBus`] wraps a [`tokio::sync::broadcast`] channel. Every published
//! [`Plot`] goes through the bus, and every Socket.IO session subscribes to
//! forward it as a `"plots"` event.

use std::sync::Arc;

use tokio::sync::broadcast;

use super::Plot;

/// Broadcast bus for [`Plot`]s.
///
/// Plots are shared behind an [`Arc`] so fan-out does not copy series data.
/// When the ring buffer is full, the oldest plots are dropped for lagging
/// receivers.
#[derive(Debug, Clone)]
pub struct PlotBus {
    sender: broadcast::Sender<Arc<Plot>>,
}

impl PlotBus {
    /// Creates a new `PlotBus` with the given channel capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes a plot to all subscribers.
    ///
    /// Returns the number of receivers that received the plot. If there
    /// are no active receivers, the plot is silently dropped.
    pub fn publish(&self, plot: Arc<Plot>) -> usize {
        self.sender.send(plot).unwrap_or(0)
    }

    /// Creates a new receiver that will receive all future plots.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<Plot>> {
        self.sender.subscribe()
    }

    /// Returns the current number of active receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn publish_without_receivers_returns_zero() {
        let bus = PlotBus::new(16);
        assert_eq!(bus.publish(Arc::new(Plot::demo())), 0);
    }

    #[tokio::test]
    async fn subscriber_receives_plot() {
        let bus = PlotBus::new(16);
        let mut rx = bus.subscribe();

        let plot = Arc::new(Plot::demo());
        bus.publish(Arc::clone(&plot));

        let Ok(received) = rx.recv().await else {
            panic!("expected to receive plot");
        };
        assert_eq!(received.id, plot.id);
    }

    #[tokio::test]
    async fn multiple_subscribers_receive_same_plot() {
        let bus = PlotBus::new(16);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        let count = bus.publish(Arc::new(Plot::demo()));
        assert_eq!(count, 2);

        let (Ok(p1), Ok(p2)) = (rx1.recv().await, rx2.recv().await) else {
            panic!("receivers failed");
        };
        assert!(Arc::ptr_eq(&p1, &p2));
    }

    #[test]
    fn receiver_count_tracks_subscribers() {
        let bus = PlotBus::new(16);
        assert_eq!(bus.receiver_count(), 0);

        let rx1 = bus.subscribe();
        let _rx2 = bus.subscribe();
        assert_eq!(bus.receiver_count(), 2);

        drop(rx1);
        assert_eq!(bus.receiver_count(), 1);
    }
}

//! In-process change notification for the transaction table.
//!
//! A [`Ledger`](crate::ledger::Ledger) owns one [`ChangeBus`]; every consumer
//! subscribes to that bus instead of opening its own store subscription.
//! Events carry no payload: a receiver re-fetches whatever it displays.

use tokio::sync::broadcast;

/// "Something in the transaction table changed."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedgerChanged;

/// Fan-out channel for [`LedgerChanged`] events.
#[derive(Debug, Clone)]
pub struct ChangeBus {
  sender: broadcast::Sender<LedgerChanged>,
}

/// A subscription to a [`ChangeBus`]. Dropping it unsubscribes.
pub struct ChangeSubscription {
  receiver: broadcast::Receiver<LedgerChanged>,
}

impl ChangeBus {
  pub fn new(capacity: usize) -> Self {
    let (sender, _) = broadcast::channel(capacity.max(1));
    Self { sender }
  }

  /// Publish a change. Having no subscribers is not an error.
  pub fn notify(&self) {
    let _ = self.sender.send(LedgerChanged);
  }

  pub fn subscribe(&self) -> ChangeSubscription {
    ChangeSubscription { receiver: self.sender.subscribe() }
  }

  /// The raw broadcast receiver, for adapters that need a stream.
  pub fn receiver(&self) -> broadcast::Receiver<LedgerChanged> {
    self.sender.subscribe()
  }

  pub fn subscriber_count(&self) -> usize { self.sender.receiver_count() }
}

impl Default for ChangeBus {
  fn default() -> Self { Self::new(64) }
}

impl ChangeSubscription {
  /// Wait for the next change. Returns `None` once the bus is gone.
  ///
  /// A receiver that fell behind gets a single event for everything it
  /// missed; the reaction (re-fetch) is the same either way.
  pub async fn changed(&mut self) -> Option<LedgerChanged> {
    match self.receiver.recv().await {
      Ok(event) => Some(event),
      Err(broadcast::error::RecvError::Lagged(skipped)) => {
        tracing::debug!(skipped, "change subscriber lagged");
        self.receiver = self.receiver.resubscribe();
        Some(LedgerChanged)
      }
      Err(broadcast::error::RecvError::Closed) => None,
    }
  }

  /// Non-blocking variant of [`changed`](Self::changed): `None` when nothing
  /// is pending.
  pub fn try_changed(&mut self) -> Option<LedgerChanged> {
    match self.receiver.try_recv() {
      Ok(event) => Some(event),
      Err(broadcast::error::TryRecvError::Lagged(_)) => {
        self.receiver = self.receiver.resubscribe();
        Some(LedgerChanged)
      }
      Err(_) => None,
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn every_subscriber_sees_each_change() {
    let bus = ChangeBus::default();
    let mut a = bus.subscribe();
    let mut b = bus.subscribe();
    assert_eq!(bus.subscriber_count(), 2);

    bus.notify();
    assert_eq!(a.changed().await, Some(LedgerChanged));
    assert_eq!(b.changed().await, Some(LedgerChanged));
    assert_eq!(a.try_changed(), None);
  }

  #[tokio::test]
  async fn lagged_subscriber_still_gets_one_change() {
    let bus = ChangeBus::new(1);
    let mut sub = bus.subscribe();
    for _ in 0..5 {
      bus.notify();
    }
    assert_eq!(sub.changed().await, Some(LedgerChanged));
  }

  #[tokio::test]
  async fn closed_bus_ends_subscription() {
    let bus = ChangeBus::default();
    let mut sub = bus.subscribe();
    drop(bus);
    assert_eq!(sub.changed().await, None);
  }

  #[test]
  fn notify_without_subscribers_is_fine() {
    let bus = ChangeBus::default();
    bus.notify();
    assert_eq!(bus.subscriber_count(), 0);
  }
}

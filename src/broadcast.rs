use crate::models::Goal;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

/// Partial state pushed to listeners right after a commit. Only the fields a
/// listener has to react to immediately travel here; everything else is picked
/// up from the data file on the next poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum TickerUpdate {
    #[serde(rename_all = "camelCase")]
    AmountChanged {
        current_amount: f64,
        last_added_amount: f64,
    },
    #[serde(rename_all = "camelCase")]
    GoalCompleted { goal: Goal },
}

#[derive(Clone)]
pub struct UpdateBus {
    tx: broadcast::Sender<TickerUpdate>,
}

impl Default for UpdateBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl UpdateBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Never blocks; with no subscribers the update is dropped.
    pub fn publish(&self, update: TickerUpdate) {
        if self.tx.send(update).is_err() {
            debug!("ticker update dropped: no subscribers");
        }
    }

    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

pub struct Subscription {
    rx: broadcast::Receiver<TickerUpdate>,
}

impl Subscription {
    /// Waits for the next update. A subscriber that fell behind skips the
    /// updates it missed. Returns `None` once the bus is gone.
    pub async fn recv(&mut self) -> Option<TickerUpdate> {
        loop {
            match self.rx.recv().await {
                Ok(update) => return Some(update),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "ticker subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    #[cfg(test)]
    pub fn try_recv(&mut self) -> Option<TickerUpdate> {
        loop {
            match self.rx.try_recv() {
                Ok(update) => return Some(update),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribers_receive_published_updates() {
        let bus = UpdateBus::default();
        let mut sub = bus.subscribe();
        bus.publish(TickerUpdate::AmountChanged {
            current_amount: 10.0,
            last_added_amount: 10.0,
        });

        assert_eq!(
            sub.recv().await,
            Some(TickerUpdate::AmountChanged {
                current_amount: 10.0,
                last_added_amount: 10.0,
            })
        );
    }

    #[test]
    fn unsubscribe_releases_the_slot() {
        let bus = UpdateBus::default();
        let first = bus.subscribe();
        let second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        first.unsubscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(second);
        assert_eq!(bus.subscriber_count(), 0);

        // no subscribers left: publishing is a no-op
        bus.publish(TickerUpdate::AmountChanged {
            current_amount: 1.0,
            last_added_amount: 1.0,
        });
    }

    #[test]
    fn lagging_subscriber_skips_to_newest() {
        let bus = UpdateBus::new(2);
        let mut sub = bus.subscribe();
        for amount in 1..=5 {
            bus.publish(TickerUpdate::AmountChanged {
                current_amount: amount as f64,
                last_added_amount: 1.0,
            });
        }

        let first = sub.try_recv();
        assert_eq!(
            first,
            Some(TickerUpdate::AmountChanged {
                current_amount: 4.0,
                last_added_amount: 1.0,
            })
        );
    }
}

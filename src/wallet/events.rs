//! Provider event subscription.
//!
//! Events are fanned out over a broadcast channel. A [`Subscription`] ends
//! when it is cancelled or dropped.

use solana_sdk::pubkey::Pubkey;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};

/// Capacity of the per-provider event channel.
const EVENT_CAPACITY: usize = 16;

/// Events emitted by a wallet provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    /// The provider connected with this public key.
    Connect(Pubkey),
    /// The provider disconnected.
    Disconnect,
    /// The user switched accounts; `None` when the new account is not yet trusted.
    AccountChanged(Option<Pubkey>),
}

/// Sender side of a provider's event stream.
#[derive(Debug, Clone)]
pub struct EventHub {
    tx: broadcast::Sender<WalletEvent>,
}

impl EventHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }

    /// Publish an event to every live subscription.
    pub fn emit(&self, event: WalletEvent) {
        tracing::debug!(event = ?event, "Wallet event");
        // No subscribers is not an error.
        let _ = self.tx.send(event);
    }

    /// Open a new subscription.
    pub fn subscribe(&self) -> Subscription {
        Subscription {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving side of a provider's event stream.
#[derive(Debug)]
pub struct Subscription {
    rx: broadcast::Receiver<WalletEvent>,
}

impl Subscription {
    /// Wait for the next event. `None` once the provider is gone.
    pub async fn recv(&mut self) -> Option<WalletEvent> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Wallet events dropped");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<WalletEvent> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(TryRecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Wallet events dropped");
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return None,
            }
        }
    }

    /// Stop receiving events. Dropping the subscription has the same effect.
    pub fn cancel(self) {
        drop(self.rx);
    }
}

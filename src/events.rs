use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, info};
use uuid::Uuid;

/// Domain events emitted by the services after a successful commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Deal events
    DealCreated {
        deal_id: Uuid,
        deal_number: String,
    },
    DealUpdated(Uuid),
    DealDeleted(Uuid),

    // Ledger events
    PaymentRecorded {
        payment_id: Uuid,
        deal_id: Uuid,
        amount: Decimal,
    },
    PaymentUpdated {
        payment_id: Uuid,
        deal_id: Uuid,
        old_amount: Decimal,
        new_amount: Decimal,
    },
    PaymentDeleted {
        payment_id: Uuid,
        deal_id: Uuid,
        amount: Decimal,
    },

    // Directory events
    CustomerCreated(Uuid),
    CustomerUpdated(Uuid),
    CustomerDeleted(Uuid),
    EmployeeCreated(Uuid),
    EmployeeDeleted(Uuid),

    // AMS events
    ServiceContractCreated(Uuid),
    ServiceContractUpdated(Uuid),
    ServiceContractDeleted(Uuid),
}

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

/// Consumes events from the channel and logs them. Runs until the channel
/// closes; spawned from main.
pub async fn process_events(mut receiver: mpsc::Receiver<Event>) {
    info!("Event processor started");
    while let Some(event) = receiver.recv().await {
        debug!(?event, "Processing event");
        match &event {
            Event::PaymentRecorded {
                payment_id,
                deal_id,
                amount,
            } => {
                info!(%payment_id, %deal_id, %amount, "Payment recorded against deal");
            }
            Event::DealCreated {
                deal_id,
                deal_number,
            } => {
                info!(%deal_id, %deal_number, "Deal created");
            }
            other => {
                debug!(?other, "Event processed");
            }
        }
    }
    info!("Event processor stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn event_sender_delivers_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        let deal_id = Uuid::new_v4();
        sender
            .send(Event::DealCreated {
                deal_id,
                deal_number: "ACME0608001".to_string(),
            })
            .await
            .unwrap();
        sender
            .send(Event::PaymentRecorded {
                payment_id: Uuid::new_v4(),
                deal_id,
                amount: dec!(500),
            })
            .await
            .unwrap();

        assert!(matches!(
            rx.recv().await,
            Some(Event::DealCreated { .. })
        ));
        assert!(matches!(
            rx.recv().await,
            Some(Event::PaymentRecorded { .. })
        ));
    }

    #[tokio::test]
    async fn send_fails_when_receiver_dropped() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        let result = sender.send(Event::DealDeleted(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}

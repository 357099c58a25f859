use std::sync::{Arc, Weak};

use tokio::sync::watch;

/// Confirmation status of one tracked publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishStatus {
    /// The broker has not confirmed the publish yet. This is the status of
    /// every receipt when it is handed back to the caller.
    Pending,
    /// The broker durably accepted the message.
    Ack,
    /// The broker rejected the message, or the channel became invalid before
    /// confirming it.
    Nack,
}

/// Client-side handle tracking the eventual confirm outcome of one publish.
///
/// Returned by
/// [`ConfirmingPublisher::publish_with_receipt`](super::ConfirmingPublisher::publish_with_receipt)
/// with status [`Pending`](PublishStatus::Pending). The status transitions
/// exactly once, to [`Ack`](PublishStatus::Ack) or
/// [`Nack`](PublishStatus::Nack), when the broker's confirm signal arrives (or
/// when the channel is invalidated). A receipt can simply be dropped if the
/// caller does not care about the outcome.
#[derive(Debug)]
pub struct PublishReceipt {
    sequence_number: u64,
    state: Arc<ReceiptState>,
}

#[derive(Debug)]
pub(super) struct ReceiptState {
    status: watch::Sender<PublishStatus>,
}

impl ReceiptState {
    /// Move the receipt out of `Pending`. A terminal status is never
    /// overwritten, no matter how many confirm signals arrive afterwards.
    pub(super) fn resolve(&self, outcome: PublishStatus) {
        debug_assert!(outcome != PublishStatus::Pending);
        self.status.send_if_modified(|status| {
            if *status == PublishStatus::Pending {
                *status = outcome;
                true
            } else {
                false
            }
        });
    }
}

impl PublishReceipt {
    /// A fresh pending receipt plus the weak handle the tracker uses to
    /// resolve it. The caller owns the receipt; the tracker never keeps it
    /// alive.
    pub(super) fn pending(sequence_number: u64) -> (Self, Weak<ReceiptState>) {
        let (status, _) = watch::channel(PublishStatus::Pending);
        let state = Arc::new(ReceiptState { status });
        let tracker_handle = Arc::downgrade(&state);
        (
            Self {
                sequence_number,
                state,
            },
            tracker_handle,
        )
    }

    /// The sequence number the broker assigned to this publish.
    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    /// Current confirmation status. Non-blocking snapshot; the status can
    /// change concurrently as broker signals arrive.
    pub fn status(&self) -> PublishStatus {
        *self.state.status.borrow()
    }

    /// Wait until the publish is confirmed and return the terminal status.
    pub async fn confirmed(&self) -> PublishStatus {
        let mut status = self.state.status.subscribe();
        let result = match status.wait_for(|status| *status != PublishStatus::Pending).await {
            Ok(status) => *status,
            // The sender lives inside `self`, so it cannot have been dropped.
            Err(_) => self.status(),
        };
        result
    }
}

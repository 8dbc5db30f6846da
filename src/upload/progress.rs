//! Upload progress channel
//!
//! Engines publish progress through a [`ProgressSender`]; the orchestrator
//! (or any observer) subscribes to the paired watch receiver. Deliveries are
//! maximum-seen monotonic: part completions may arrive out of numeric order,
//! but the observed value never decreases within one transfer.

use tokio::sync::watch;

/// Sending half of a progress channel, in percent [0, 100]
#[derive(Debug)]
pub struct ProgressSender {
    tx: watch::Sender<u8>,
}

/// Create a progress channel starting at 0.
pub fn channel() -> (ProgressSender, watch::Receiver<u8>) {
    let (tx, rx) = watch::channel(0);
    (ProgressSender { tx }, rx)
}

impl ProgressSender {
    /// Report a progress value.
    ///
    /// Values are clamped to 100 and only delivered when they exceed the
    /// maximum seen so far in this transfer.
    pub fn report(&self, percent: u8) {
        let clamped = percent.min(100);
        self.tx.send_if_modified(|current| {
            if clamped > *current {
                *current = clamped;
                true
            } else {
                false
            }
        });
    }

    /// Start a new transfer at 0.
    pub fn reset(&self) {
        self.tx.send_replace(0);
    }

    /// The maximum value reported so far
    pub fn current(&self) -> u8 {
        *self.tx.borrow()
    }

    /// A new receiver observing this channel
    pub fn subscribe(&self) -> watch::Receiver<u8> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_is_monotonic_max() {
        let (tx, rx) = channel();
        tx.report(75);
        // A later-but-lower report must not regress the observed value
        tx.report(50);
        assert_eq!(*rx.borrow(), 75);
        tx.report(100);
        assert_eq!(*rx.borrow(), 100);
    }

    #[test]
    fn test_progress_clamps_to_100() {
        let (tx, rx) = channel();
        tx.report(200);
        assert_eq!(*rx.borrow(), 100);
    }

    #[test]
    fn test_reset_starts_new_transfer() {
        let (tx, rx) = channel();
        tx.report(80);
        tx.reset();
        assert_eq!(*rx.borrow(), 0);
        tx.report(10);
        assert_eq!(*rx.borrow(), 10);
    }
}

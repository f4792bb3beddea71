//! Bounded channel for handing signals from a host thread to the engine.

use crate::signal::types::BrowserSignal;
use crossbeam_channel::{bounded, Receiver, Sender};

/// Sending half given to the host layer.
pub type SignalSender = Sender<BrowserSignal>;

/// Receiving half drained by the engine's owner.
pub type SignalReceiver = Receiver<BrowserSignal>;

/// Capacity of the host-to-engine signal channel.
const CHANNEL_CAPACITY: usize = 10_000;

/// Create a bounded signal channel pair.
pub fn signal_channel() -> (SignalSender, SignalReceiver) {
    bounded(CHANNEL_CAPACITY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_delivers_in_order() {
        let (tx, rx) = signal_channel();
        tx.send(BrowserSignal::RouteChange {
            path: "/services".to_string(),
        })
        .unwrap();
        tx.send(BrowserSignal::PageUnload).unwrap();

        assert!(matches!(
            rx.try_recv().unwrap(),
            BrowserSignal::RouteChange { .. }
        ));
        assert!(matches!(rx.try_recv().unwrap(), BrowserSignal::PageUnload));
        assert!(rx.try_recv().is_err());
    }
}

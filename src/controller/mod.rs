pub mod client;

use std::collections::BTreeMap;

use serde::Serialize;
use tokio::sync::{mpsc, watch};

use deconz::button::PressValue;

/// The controller's desired light states, keyed by light display name.
pub type PortMap = BTreeMap<String, bool>;

/// A decoded sensor press on its way to the controller.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct OutboundEvent {
    pub name: String,
    pub value: PressValue,
}

/// Channel ends held by the hub backend.
pub struct BridgeHandles {
    /// Latest desired port states; changing is the reconcile trigger.
    pub ports: watch::Receiver<PortMap>,
    /// Decoded presses toward the controller.
    pub events: mpsc::UnboundedSender<OutboundEvent>,
    /// Hub-connected status surfaced to the controller.
    pub connected: watch::Sender<bool>,
}

/// Channel ends held by the controller adapter.
pub struct AdapterHandles {
    pub ports: watch::Sender<PortMap>,
    pub events: mpsc::UnboundedReceiver<OutboundEvent>,
    pub connected: watch::Receiver<bool>,
}

/// The full boundary between the bridge core and whatever speaks to the
/// controller platform. The adapter side is deliberately thin and
/// replaceable; tests drive the bridge side directly.
#[must_use]
pub fn channels() -> (BridgeHandles, AdapterHandles) {
    let (ports_tx, ports_rx) = watch::channel(PortMap::new());
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let (connected_tx, connected_rx) = watch::channel(false);

    (
        BridgeHandles {
            ports: ports_rx,
            events: events_tx,
            connected: connected_tx,
        },
        AdapterHandles {
            ports: ports_tx,
            events: events_rx,
            connected: connected_rx,
        },
    )
}

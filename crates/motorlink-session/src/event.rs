use std::sync::mpsc;

use motorlink_frame::TelemetryRecord;

/// Notifications a session emits to the layer above it.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    /// A telemetry frame decoded successfully.
    Telemetry(TelemetryRecord),
    /// A non-fatal link problem, or a failed open.
    Error(String),
    /// The device went away; the session is now closed.
    Disconnected,
}

/// Receives [`LinkEvent`]s from a session.
///
/// Observers run on the thread driving the session, in emission order.
pub trait LinkObserver {
    fn notify(&mut self, event: &LinkEvent);
}

/// Forwards events into a channel. A dropped receiver is ignored.
impl LinkObserver for mpsc::Sender<LinkEvent> {
    fn notify(&mut self, event: &LinkEvent) {
        let _ = self.send(event.clone());
    }
}

/// Records events in order.
impl LinkObserver for Vec<LinkEvent> {
    fn notify(&mut self, event: &LinkEvent) {
        self.push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_observer_forwards() {
        let (mut tx, rx) = mpsc::channel();
        tx.notify(&LinkEvent::Disconnected);
        assert_eq!(rx.try_recv().unwrap(), LinkEvent::Disconnected);
    }

    #[test]
    fn channel_observer_ignores_closed_receiver() {
        let (mut tx, rx) = mpsc::channel();
        drop(rx);
        tx.notify(&LinkEvent::Error("late".to_string()));
    }
}

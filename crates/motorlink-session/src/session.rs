use std::io::{ErrorKind, Read};

use motorlink_frame::{
    CommandKind, CommandRequest, CommandWriter, ControlMode, DeframeEvent, DeframeStats,
    Deframer, FrameError, TelemetryRecord,
};
use motorlink_transport::{
    Connector, Direction, SerialConfig, SerialConnector, TransportError, TransportFault,
};
use tracing::{debug, info, warn};

use crate::error::{Result, SessionError};
use crate::event::{LinkEvent, LinkObserver};

const READ_CHUNK_SIZE: usize = 512;

/// Connection state of a [`LinkSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No transport held.
    Closed,
    /// Transport configuration is being applied.
    Opening,
    /// Receiving telemetry and accepting commands.
    Open,
}

struct Link<S> {
    port: String,
    writer: CommandWriter<S>,
}

/// One live connection to a motor controller.
///
/// Owns the transport, the receive buffer and the de-framing loop, and
/// reports telemetry, errors and disconnects to subscribed observers. All
/// methods take `&mut self`: the session is driven from a single thread.
pub struct LinkSession<C: Connector = SerialConnector> {
    connector: C,
    config: SerialConfig,
    state: LinkState,
    link: Option<Link<C::Stream>>,
    deframer: Deframer,
    latest: Option<TelemetryRecord>,
    observers: Vec<Box<dyn LinkObserver>>,
}

impl LinkSession<SerialConnector> {
    /// Session over the host's serial ports.
    pub fn new() -> Self {
        Self::with_connector(SerialConnector)
    }
}

impl Default for LinkSession<SerialConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Connector> LinkSession<C> {
    /// Session over an explicit connector.
    pub fn with_connector(connector: C) -> Self {
        Self {
            connector,
            config: SerialConfig::default(),
            state: LinkState::Closed,
            link: None,
            deframer: Deframer::new(),
            latest: None,
            observers: Vec::new(),
        }
    }

    /// Override the line configuration used by subsequent opens.
    ///
    /// The baud rate passed to [`LinkSession::open`] still takes precedence.
    pub fn with_config(mut self, config: SerialConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an observer for link events.
    pub fn subscribe(&mut self, observer: impl LinkObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    /// Open `port` at `baud_rate`, replacing any current connection.
    ///
    /// On failure the error is also reported as [`LinkEvent::Error`] and the
    /// session stays closed.
    pub fn open(&mut self, port: &str, baud_rate: u32) -> Result<()> {
        self.close();
        self.state = LinkState::Opening;

        let config = self.config.with_baud_rate(baud_rate);
        match self.connector.connect(port, &config) {
            Ok(stream) => {
                self.config = config;
                self.deframer.clear();
                self.link = Some(Link {
                    port: port.to_string(),
                    writer: CommandWriter::new(stream),
                });
                self.state = LinkState::Open;
                info!(port, baud = baud_rate, "link open");
                Ok(())
            }
            Err(err) => {
                self.state = LinkState::Closed;
                warn!(port, %err, "link open failed");
                self.emit(LinkEvent::Error(err.to_string()));
                Err(SessionError::Open(err))
            }
        }
    }

    /// Close the transport and drop buffered bytes. Safe to call repeatedly.
    pub fn close(&mut self) {
        if let Some(link) = self.link.take() {
            info!(port = %link.port, "link closed");
        }
        self.deframer.clear();
        self.latest = None;
        self.state = LinkState::Closed;
    }

    pub fn is_open(&self) -> bool {
        self.state == LinkState::Open
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Port the session is connected to, if open.
    pub fn port_name(&self) -> Option<&str> {
        self.link.as_ref().map(|link| link.port.as_str())
    }

    pub fn config(&self) -> &SerialConfig {
        &self.config
    }

    /// Most recent telemetry snapshot on this connection.
    pub fn latest(&self) -> Option<TelemetryRecord> {
        self.latest
    }

    /// Receive buffer counters.
    pub fn stats(&self) -> DeframeStats {
        self.deframer.stats()
    }

    /// Feed bytes that arrived from the transport.
    ///
    /// Every frame the buffer now yields is emitted as
    /// [`LinkEvent::Telemetry`], in stream order. Windows that fail
    /// validation are logged and skipped.
    pub fn on_bytes_available(&mut self, bytes: &[u8]) {
        if !self.is_open() {
            debug!(len = bytes.len(), "ignoring bytes on closed link");
            return;
        }

        self.deframer.push(bytes);
        while let Some(event) = self.deframer.next_event() {
            match event {
                DeframeEvent::Telemetry(record) => {
                    self.latest = Some(record);
                    self.emit(LinkEvent::Telemetry(record));
                }
                DeframeEvent::Rejected(err) => {
                    debug!(%err, "dropped telemetry window");
                }
            }
        }
    }

    /// Read whatever the transport has ready and feed it through the de-framer.
    ///
    /// A read timeout means no data yet. Read failures are classified and
    /// handled as in [`LinkSession::on_transport_error`], then returned.
    /// Returns the number of bytes consumed; a closed session reads nothing.
    pub fn poll(&mut self) -> Result<usize> {
        let Some(link) = self.link.as_mut() else {
            return Ok(0);
        };

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = link.writer.get_mut().read(&mut chunk);
        match read {
            Ok(n) => {
                self.on_bytes_available(&chunk[..n]);
                Ok(n)
            }
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::TimedOut | ErrorKind::WouldBlock | ErrorKind::Interrupted
                ) =>
            {
                Ok(0)
            }
            Err(err) => {
                let fault = TransportFault::from_io(&err, Direction::Read);
                self.handle_fault(fault, format!("read failed: {err}"));
                Err(SessionError::Transport(TransportError::Io(err)))
            }
        }
    }

    /// Send a command to the device.
    ///
    /// On a closed link this logs and does nothing. A write failure is
    /// reported through the observers like any other transport fault and
    /// returned.
    pub fn send(&mut self, kind: CommandKind, value: f32) -> Result<()> {
        let Some(link) = self.link.as_mut() else {
            warn!(%kind, value, "link not open, command dropped");
            return Ok(());
        };

        match link.writer.send(kind, value) {
            Ok(()) => Ok(()),
            Err(err) => {
                let fault = match &err {
                    FrameError::Io(io) => TransportFault::from_io(io, Direction::Write),
                    FrameError::ConnectionClosed => TransportFault::ResourceGone,
                    _ => TransportFault::Write,
                };
                self.handle_fault(fault, format!("write failed: {err}"));
                Err(err.into())
            }
        }
    }

    /// Send a prepared request.
    pub fn send_request(&mut self, request: CommandRequest) -> Result<()> {
        self.send(request.kind, request.value)
    }

    /// Change the controller mode, stopping the motor first.
    ///
    /// Sends the sequence from [`CommandRequest::switch_mode`] and stops at
    /// the first failed write.
    pub fn switch_mode(&mut self, mode: ControlMode) -> Result<()> {
        for request in CommandRequest::switch_mode(mode) {
            self.send_request(request)?;
        }
        info!(mode = mode.name(), "control mode switched");
        Ok(())
    }

    /// React to a transport error.
    ///
    /// [`TransportFault::ResourceGone`] closes the session and emits
    /// [`LinkEvent::Disconnected`]; everything else is emitted as
    /// [`LinkEvent::Error`] and leaves the state alone.
    pub fn on_transport_error(&mut self, fault: TransportFault) {
        self.handle_fault(fault, fault.to_string());
    }

    fn handle_fault(&mut self, fault: TransportFault, detail: String) {
        if !fault.is_fatal() {
            debug!(%fault, %detail, "transport error");
            self.emit(LinkEvent::Error(detail));
            return;
        }

        if !self.is_open() {
            debug!(%fault, "fatal fault on closed link ignored");
            return;
        }

        warn!(port = ?self.port_name(), %detail, "device disconnected");
        self.close();
        self.emit(LinkEvent::Disconnected);
    }

    fn emit(&mut self, event: LinkEvent) {
        for observer in &mut self.observers {
            observer.notify(&event);
        }
    }
}

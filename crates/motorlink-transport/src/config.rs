use std::time::Duration;

/// Baud rate the controller firmware uses out of the box.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default read timeout: one telemetry refresh tick.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(10);

/// Baud rates offered by the host tooling.
pub const STANDARD_BAUD_RATES: &[u32] = &[9_600, 19_200, 38_400, 57_600, 115_200];

/// Whether `baud_rate` is one the controller firmware is known to run at.
pub fn is_standard_baud(baud_rate: u32) -> bool {
    STANDARD_BAUD_RATES.contains(&baud_rate)
}

/// Serial line configuration.
///
/// Framing is fixed at 8 data bits, no parity, one stop bit and no flow
/// control; only the baud rate and read timeout are tunable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SerialConfig {
    /// Line speed in bits per second.
    pub baud_rate: u32,
    /// How long a read waits for bytes before reporting "nothing yet".
    pub read_timeout: Duration,
}

impl SerialConfig {
    pub fn new(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            ..Self::default()
        }
    }

    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
            read_timeout: DEFAULT_READ_TIMEOUT,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_firmware() {
        let cfg = SerialConfig::default();
        assert_eq!(cfg.baud_rate, 115_200);
        assert_eq!(cfg.read_timeout, Duration::from_millis(10));
        assert!(is_standard_baud(cfg.baud_rate));
    }

    #[test]
    fn builders_override_fields() {
        let cfg = SerialConfig::new(9_600).with_read_timeout(Duration::from_millis(250));
        assert_eq!(cfg.baud_rate, 9_600);
        assert_eq!(cfg.read_timeout, Duration::from_millis(250));
        assert_eq!(cfg.with_baud_rate(57_600).baud_rate, 57_600);
    }

    #[test]
    fn standard_baud_check() {
        assert!(is_standard_baud(9_600));
        assert!(is_standard_baud(57_600));
        assert!(!is_standard_baud(0));
        assert!(!is_standard_baud(250_000));
    }
}

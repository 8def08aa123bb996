use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use motorlink_session::{LinkEvent, LinkSession};
use tracing::{debug, info, warn};

use crate::cmd::MonitorArgs;
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS, TRANSPORT_ERROR};
use crate::output::{print_telemetry, OutputFormat};

/// Pause after the first failed read; doubles per consecutive failure.
const READ_BACKOFF: Duration = Duration::from_millis(20);
const MAX_READ_BACKOFF: Duration = Duration::from_secs(1);
/// Consecutive failed reads before the monitor gives up on the port.
const MAX_READ_FAILURES: u32 = 20;

pub fn run(args: MonitorArgs, format: OutputFormat) -> CliResult<i32> {
    crate::cmd::warn_unusual_baud(args.baud);

    let mut session = LinkSession::new();
    let (events, rx) = mpsc::channel();
    session.subscribe(events);
    session
        .open(&args.port, args.baud)
        .map_err(|err| session_error("open failed", err))?;

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;

    let mut printed = 0u64;
    let mut backoff = ReadBackoff::default();

    while running.load(Ordering::SeqCst) {
        // Failures also arrive as events below.
        let pause = match session.poll() {
            Ok(_) => {
                backoff.reset();
                None
            }
            Err(err) => {
                debug!(%err, "poll failed");
                match backoff.next_delay() {
                    Some(delay) => Some(delay),
                    None if session.is_open() => {
                        session.close();
                        return Err(CliError::new(
                            TRANSPORT_ERROR,
                            format!(
                                "{}: giving up after {MAX_READ_FAILURES} failed reads",
                                args.port
                            ),
                        ));
                    }
                    None => None,
                }
            }
        };

        for event in rx.try_iter() {
            match event {
                LinkEvent::Telemetry(record) => {
                    print_telemetry(&record, &args.port, printed, args.hex, format);
                    printed = printed.saturating_add(1);

                    if args.count.is_some_and(|count| printed >= count) {
                        session.close();
                        return Ok(SUCCESS);
                    }
                }
                LinkEvent::Error(message) => warn!(%message, "link error"),
                LinkEvent::Disconnected => {
                    return Err(CliError::new(
                        TRANSPORT_ERROR,
                        format!("{}: device disconnected", args.port),
                    ));
                }
            }
        }

        if let Some(delay) = pause {
            thread::sleep(delay);
        }
    }

    let stats = session.stats();
    info!(
        frames = stats.frames,
        rejected = stats.rejected,
        discarded = stats.discarded,
        "monitor stopped"
    );
    session.close();
    Ok(SUCCESS)
}

/// Tracks consecutive read failures.
#[derive(Debug, Default)]
struct ReadBackoff {
    failures: u32,
}

impl ReadBackoff {
    fn reset(&mut self) {
        self.failures = 0;
    }

    /// Delay before the next read, or `None` once the limit is reached.
    fn next_delay(&mut self) -> Option<Duration> {
        self.failures = self.failures.saturating_add(1);
        if self.failures > MAX_READ_FAILURES {
            return None;
        }
        let factor = 1u32 << (self.failures - 1).min(6);
        Some((READ_BACKOFF * factor).min(MAX_READ_BACKOFF))
    }
}

fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}

use motorlink_frame::{CommandKind, CommandRequest, ControlMode};
use motorlink_session::LinkSession;

use crate::cmd::SendArgs;
use crate::exit::{session_error, CliError, CliResult, SUCCESS, USAGE};
use crate::output::{print_sent, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let requests = build_requests(&args)?;
    crate::cmd::warn_unusual_baud(args.baud);

    let mut session = LinkSession::new();
    session
        .open(&args.port, args.baud)
        .map_err(|err| session_error("open failed", err))?;
    for request in &requests {
        session
            .send_request(*request)
            .map_err(|err| session_error("send failed", err))?;
    }
    session.close();

    for request in &requests {
        print_sent(request, &args.port, format);
    }
    Ok(SUCCESS)
}

/// Commands to write for one `send` invocation, in order.
///
/// A mode change expands to the full stop-then-switch sequence.
pub(crate) fn build_requests(args: &SendArgs) -> CliResult<Vec<CommandRequest>> {
    let kind = CommandKind::from(args.kind);

    if !args.value.is_finite() {
        return Err(CliError::new(
            USAGE,
            format!("value must be a finite number, got {}", args.value),
        ));
    }

    if args.percent {
        if kind != CommandKind::Pwm {
            return Err(CliError::new(USAGE, "--percent only applies to pwm"));
        }
        if !(0.0..=100.0).contains(&args.value) {
            return Err(CliError::new(
                USAGE,
                format!("pwm percent must be within 0-100, got {}", args.value),
            ));
        }
        return Ok(vec![CommandRequest::pwm_percent(args.value)]);
    }

    match kind {
        CommandKind::Mode => {
            let mode = whole_byte(args.value)
                .and_then(ControlMode::from_wire)
                .ok_or_else(|| {
                    CliError::new(
                        USAGE,
                        format!(
                            "mode must be 0 (manual) or 1 (automatic), got {}",
                            args.value
                        ),
                    )
                })?;
            Ok(CommandRequest::switch_mode(mode))
        }
        CommandKind::StartStop => match whole_byte(args.value) {
            Some(1) => Ok(vec![CommandRequest::start()]),
            Some(0) => Ok(vec![CommandRequest::stop()]),
            _ => Err(CliError::new(
                USAGE,
                format!("start-stop must be 1 or 0, got {}", args.value),
            )),
        },
        CommandKind::Kp | CommandKind::Ki | CommandKind::Kd if args.value < 0.0 => {
            Err(CliError::new(
                USAGE,
                format!("{kind} gain must not be negative, got {}", args.value),
            ))
        }
        _ => Ok(vec![CommandRequest::new(kind, args.value)]),
    }
}

fn whole_byte(value: f32) -> Option<u8> {
    (value.fract() == 0.0 && (0.0..=255.0).contains(&value)).then_some(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cmd::CommandArg;

    fn args(kind: CommandArg, value: f32, percent: bool) -> SendArgs {
        SendArgs {
            port: "/dev/ttyUSB0".to_string(),
            kind,
            value,
            baud: 115_200,
            percent,
        }
    }

    fn single(kind: CommandArg, value: f32) -> CommandRequest {
        let requests = build_requests(&args(kind, value, false)).unwrap();
        assert_eq!(requests.len(), 1);
        requests[0]
    }

    #[test]
    fn percent_scales_pwm_to_duty() {
        let requests = build_requests(&args(CommandArg::Pwm, 100.0, true)).unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].kind, CommandKind::Pwm);
        assert!((requests[0].value - 255.0).abs() < 1e-3);
    }

    #[test]
    fn percent_rejected_for_other_kinds() {
        let err = build_requests(&args(CommandArg::Rpm, 50.0, true)).unwrap_err();
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn percent_out_of_range_rejected() {
        assert!(build_requests(&args(CommandArg::Pwm, 120.0, true)).is_err());
    }

    #[test]
    fn mode_expands_to_safe_switch() {
        let requests = build_requests(&args(CommandArg::Mode, 1.0, false)).unwrap();
        assert_eq!(requests, CommandRequest::switch_mode(ControlMode::Automatic));

        let tags: Vec<u8> = build_requests(&args(CommandArg::Mode, 0.0, false))
            .unwrap()
            .iter()
            .map(|req| req.kind.tag())
            .collect();
        assert_eq!(tags, vec![0x01, 0x06]);
    }

    #[test]
    fn mode_accepts_only_known_modes() {
        assert!(build_requests(&args(CommandArg::Mode, 2.0, false)).is_err());
        assert!(build_requests(&args(CommandArg::Mode, 0.5, false)).is_err());
    }

    #[test]
    fn start_stop_maps_to_helpers() {
        assert_eq!(single(CommandArg::StartStop, 1.0), CommandRequest::start());
        assert_eq!(single(CommandArg::StartStop, 0.0), CommandRequest::stop());
    }

    #[test]
    fn gains_pass_through_unchanged() {
        assert_eq!(single(CommandArg::Kd, 0.125), CommandRequest::kd(0.125));
        assert_eq!(single(CommandArg::Kp, 0.0), CommandRequest::kp(0.0));
    }

    #[test]
    fn negative_gain_rejected() {
        let err = build_requests(&args(CommandArg::Kp, -3.0, false)).unwrap_err();
        assert_eq!(err.code, USAGE);
        assert!(err.message.contains("KP gain must not be negative"));
    }

    #[test]
    fn non_finite_values_rejected() {
        for (kind, value) in [
            (CommandArg::Ki, f32::NAN),
            (CommandArg::Kd, f32::INFINITY),
            (CommandArg::Rpm, f32::NEG_INFINITY),
            (CommandArg::Pwm, f32::NAN),
        ] {
            let err = build_requests(&args(kind, value, false)).unwrap_err();
            assert_eq!(err.code, USAGE, "{kind:?} {value}");
        }
    }
}

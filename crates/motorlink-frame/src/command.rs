//! Command kinds and control modes understood by the controller firmware.

use crate::error::FrameError;

/// Duty units per percent: the firmware drives PWM on a 0-255 scale.
pub const DUTY_PER_PERCENT: f32 = 2.55;

/// Outbound command type, carried in byte 1 of a command frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CommandKind {
    /// Manual PWM duty, 0-255.
    Pwm = 0x01,
    /// Target speed for the automatic (PID) mode.
    Rpm = 0x02,
    Kp = 0x03,
    Ki = 0x04,
    Kd = 0x05,
    /// Control mode, see [`ControlMode`].
    Mode = 0x06,
    /// 1.0 starts the motor, 0.0 stops it.
    StartStop = 0x07,
}

impl CommandKind {
    pub const ALL: [CommandKind; 7] = [
        CommandKind::Pwm,
        CommandKind::Rpm,
        CommandKind::Kp,
        CommandKind::Ki,
        CommandKind::Kd,
        CommandKind::Mode,
        CommandKind::StartStop,
    ];

    /// Wire tag for this kind.
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Whether the firmware reads this payload as a whole number 0-255.
    pub fn narrows_to_u8(self) -> bool {
        matches!(self, CommandKind::Pwm | CommandKind::Rpm)
    }

    pub fn name(self) -> &'static str {
        match self {
            CommandKind::Pwm => "PWM",
            CommandKind::Rpm => "RPM",
            CommandKind::Kp => "KP",
            CommandKind::Ki => "KI",
            CommandKind::Kd => "KD",
            CommandKind::Mode => "MODE",
            CommandKind::StartStop => "START_STOP",
        }
    }
}

impl TryFrom<u8> for CommandKind {
    type Error = FrameError;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        CommandKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or(FrameError::UnknownCommand(tag))
    }
}

impl std::fmt::Display for CommandKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Controller operating mode as reported in telemetry and set by [`CommandKind::Mode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ControlMode {
    Manual = 0,
    Automatic = 1,
}

impl ControlMode {
    /// Decode the telemetry mode byte. Values other than 0/1 are not a known mode.
    pub fn from_wire(byte: u8) -> Option<Self> {
        match byte {
            0 => Some(ControlMode::Manual),
            1 => Some(ControlMode::Automatic),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ControlMode::Manual => "manual",
            ControlMode::Automatic => "automatic",
        }
    }
}

/// An outbound instruction for the controller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CommandRequest {
    pub kind: CommandKind,
    pub value: f32,
}

impl CommandRequest {
    pub fn new(kind: CommandKind, value: f32) -> Self {
        Self { kind, value }
    }

    /// Manual duty from a 0-100 % slider position.
    pub fn pwm_percent(percent: f32) -> Self {
        Self::new(CommandKind::Pwm, percent * DUTY_PER_PERCENT)
    }

    pub fn target_rpm(rpm: f32) -> Self {
        Self::new(CommandKind::Rpm, rpm)
    }

    pub fn kp(value: f32) -> Self {
        Self::new(CommandKind::Kp, value)
    }

    pub fn ki(value: f32) -> Self {
        Self::new(CommandKind::Ki, value)
    }

    pub fn kd(value: f32) -> Self {
        Self::new(CommandKind::Kd, value)
    }

    pub fn mode(mode: ControlMode) -> Self {
        Self::new(CommandKind::Mode, f32::from(mode as u8))
    }

    /// Commands for a safe mode change, in send order.
    ///
    /// The motor is always stopped first (PWM 0) before the mode frame. A
    /// switch to automatic also resets the RPM target so the PID loop starts
    /// from rest.
    pub fn switch_mode(mode: ControlMode) -> Vec<Self> {
        let mut requests = vec![Self::new(CommandKind::Pwm, 0.0), Self::mode(mode)];
        if mode == ControlMode::Automatic {
            requests.push(Self::target_rpm(0.0));
        }
        requests
    }

    pub fn start() -> Self {
        Self::new(CommandKind::StartStop, 1.0)
    }

    pub fn stop() -> Self {
        Self::new(CommandKind::StartStop, 0.0)
    }
}

use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use motorlink_frame::{encode_telemetry, CommandRequest, HexBytes, TelemetryRecord};
use motorlink_transport::PortInfo;
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct TelemetryOutput<'a> {
    port: &'a str,
    seq: u64,
    rpm: f32,
    pwm: f32,
    pwm_percent: f32,
    current_ma: f32,
    voltage: f32,
    power: f32,
    kp: f32,
    ki: f32,
    kd: f32,
    mode: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    frame: Option<String>,
    timestamp: String,
}

#[derive(Serialize)]
struct PortOutput<'a> {
    name: &'a str,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    vid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pid: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    serial_number: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    manufacturer: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<&'a str>,
}

#[derive(Serialize)]
struct SentOutput<'a> {
    port: &'a str,
    command: &'static str,
    value: f32,
    frame: String,
    timestamp: String,
}

pub fn print_telemetry(
    record: &TelemetryRecord,
    port: &str,
    seq: u64,
    show_frame: bool,
    format: OutputFormat,
) {
    let frame = encode_telemetry(record);
    let hex = show_frame.then(|| HexBytes(&frame).to_string());

    match format {
        OutputFormat::Json => {
            let out = TelemetryOutput {
                port,
                seq,
                rpm: record.rpm,
                pwm: record.pwm,
                pwm_percent: record.pwm_percent(),
                current_ma: record.current,
                voltage: record.voltage,
                power: record.power,
                kp: record.kp,
                ki: record.ki,
                kd: record.kd,
                mode: mode_name(record),
                frame: hex,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec![
                    "SEQ", "RPM", "PWM %", "CURRENT mA", "VOLTAGE V", "POWER W", "KP", "KI", "KD",
                    "MODE",
                ])
                .add_row(vec![
                    seq.to_string(),
                    format!("{:.0}", record.rpm),
                    format!("{:.1}", record.pwm_percent()),
                    format!("{:.0}", record.current),
                    format!("{:.2}", record.voltage),
                    format!("{:.2}", record.power),
                    format!("{:.3}", record.kp),
                    format!("{:.3}", record.ki),
                    format!("{:.3}", record.kd),
                    mode_name(record).to_string(),
                ]);
            println!("{table}");
            if let Some(hex) = hex {
                println!("frame: {hex}");
            }
        }
        OutputFormat::Pretty => {
            print!(
                "#{seq} rpm={:.0} pwm={:.1}% current={:.0}mA voltage={:.2}V power={:.2}W \
                 kp={:.3} ki={:.3} kd={:.3} mode={}",
                record.rpm,
                record.pwm_percent(),
                record.current,
                record.voltage,
                record.power,
                record.kp,
                record.ki,
                record.kd,
                mode_name(record)
            );
            match hex {
                Some(hex) => println!(" frame=[{hex}]"),
                None => println!(),
            }
        }
        OutputFormat::Raw => print_raw(&frame),
    }
}

pub fn print_ports(ports: &[PortInfo], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out: Vec<PortOutput<'_>> = ports.iter().map(port_output).collect();
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "KIND", "VID:PID", "MANUFACTURER", "PRODUCT"]);
            for port in ports {
                table.add_row(vec![
                    port.name.clone(),
                    port.kind.as_str().to_string(),
                    usb_id(port).unwrap_or_default(),
                    port.manufacturer.clone().unwrap_or_default(),
                    port.product.clone().unwrap_or_default(),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            if ports.is_empty() {
                println!("no serial ports found");
            }
            for port in ports {
                match usb_id(port) {
                    Some(id) => println!("{} ({}, {id})", port.name, port.kind.as_str()),
                    None => println!("{} ({})", port.name, port.kind.as_str()),
                }
            }
        }
        OutputFormat::Raw => {
            for port in ports {
                println!("{}", port.name);
            }
        }
    }
}

pub fn print_sent(request: &CommandRequest, port: &str, format: OutputFormat) {
    let frame = request.to_frame();
    match format {
        OutputFormat::Json => {
            let out = SentOutput {
                port,
                command: request.kind.name(),
                value: request.value,
                frame: HexBytes(&frame).to_string(),
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "COMMAND", "VALUE", "FRAME"])
                .add_row(vec![
                    port.to_string(),
                    request.kind.name().to_string(),
                    request.value.to_string(),
                    HexBytes(&frame).to_string(),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "sent {} {} to {port} [{}]",
                request.kind.name(),
                request.value,
                HexBytes(&frame)
            );
        }
        OutputFormat::Raw => print_raw(&frame),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn port_output(port: &PortInfo) -> PortOutput<'_> {
    PortOutput {
        name: &port.name,
        kind: port.kind.as_str(),
        vid: port.vid.map(|vid| format!("{vid:04x}")),
        pid: port.pid.map(|pid| format!("{pid:04x}")),
        serial_number: port.serial_number.as_deref(),
        manufacturer: port.manufacturer.as_deref(),
        product: port.product.as_deref(),
    }
}

fn usb_id(port: &PortInfo) -> Option<String> {
    Some(format!("{:04x}:{:04x}", port.vid?, port.pid?))
}

fn mode_name(record: &TelemetryRecord) -> &'static str {
    record
        .control_mode()
        .map(|mode| mode.name())
        .unwrap_or("unknown")
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

#[cfg(test)]
mod tests {
    use motorlink_transport::PortKind;

    use super::*;

    fn usb_port() -> PortInfo {
        PortInfo {
            name: "/dev/ttyACM0".to_string(),
            kind: PortKind::Usb,
            vid: Some(0x2341),
            pid: Some(0x0043),
            serial_number: None,
            manufacturer: Some("Arduino".to_string()),
            product: None,
        }
    }

    #[test]
    fn usb_id_formats_as_hex_pair() {
        assert_eq!(usb_id(&usb_port()).as_deref(), Some("2341:0043"));
    }

    #[test]
    fn port_json_omits_missing_fields() {
        let port = usb_port();
        let json = serde_json::to_string(&port_output(&port)).unwrap();
        assert_eq!(
            json,
            r#"{"name":"/dev/ttyACM0","kind":"usb","vid":"2341","pid":"0043","manufacturer":"Arduino"}"#
        );
    }

    #[test]
    fn unknown_mode_byte_is_labelled() {
        let record = TelemetryRecord {
            mode: 9,
            ..TelemetryRecord::default()
        };
        assert_eq!(mode_name(&record), "unknown");
    }
}

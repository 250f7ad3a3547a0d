use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use upacket_frame::Frame;

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
struct ReceivedOutput<'a> {
    payload_size: usize,
    payload: String,
    payload_hex: String,
    peer: &'a str,
    timestamp: String,
}

/// Print a payload received from `peer`.
pub fn print_received(payload: &[u8], peer: &str, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = ReceivedOutput {
                payload_size: payload.len(),
                payload: payload_preview(payload),
                payload_hex: hex::encode_upper(payload),
                peer,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["SIZE", "PEER", "PAYLOAD", "HEX"])
                .add_row(vec![
                    payload.len().to_string(),
                    peer.to_string(),
                    payload_preview(payload),
                    hex::encode_upper(payload),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "size={} peer={} payload={} hex={}",
                payload.len(),
                peer,
                payload_preview(payload),
                hex::encode_upper(payload)
            );
        }
        OutputFormat::Raw => print_raw(payload),
    }
}

#[derive(Serialize)]
struct FrameOutput {
    payload_size: usize,
    payload: String,
    payload_hex: String,
    checksum: String,
    bitmap: String,
    frame: String,
    frame_size: usize,
}

impl FrameOutput {
    fn new(frame: &Frame, wire: &[u8]) -> Self {
        Self {
            payload_size: frame.payload.len(),
            payload: payload_preview(frame.payload.as_ref()),
            payload_hex: hex::encode_upper(frame.payload.as_ref()),
            checksum: format!("0x{:04X}", frame.checksum),
            bitmap: format!("0x{:08X}", frame.bitmap),
            frame: hex::encode_upper(wire),
            frame_size: wire.len(),
        }
    }
}

/// Print a frame together with its wire form.
///
/// `raw` selects what the raw format writes: the wire bytes after `encode`,
/// the payload after `decode`.
pub fn print_frame(frame: &Frame, wire: &[u8], raw: &[u8], format: OutputFormat) {
    let out = FrameOutput::new(frame, wire);
    match format {
        OutputFormat::Json => print_json(&out),
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["FIELD", "VALUE"])
                .add_row(vec!["payload".to_string(), out.payload])
                .add_row(vec!["payload hex".to_string(), out.payload_hex])
                .add_row(vec!["payload size".to_string(), out.payload_size.to_string()])
                .add_row(vec!["checksum".to_string(), out.checksum])
                .add_row(vec!["bitmap".to_string(), out.bitmap])
                .add_row(vec!["frame".to_string(), out.frame])
                .add_row(vec!["frame size".to_string(), out.frame_size.to_string()]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "frame={} size={} checksum={} bitmap={} payload={}",
                out.frame, out.frame_size, out.checksum, out.bitmap, out.payload
            );
        }
        OutputFormat::Raw => print_raw(raw),
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn print_json<T: Serialize>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) if !text.chars().any(|c| c.is_control()) => text.to_string(),
        _ => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}

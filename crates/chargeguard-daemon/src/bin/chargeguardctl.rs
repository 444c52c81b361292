//! Control client for the chargeguard daemon
//!
//! Thin wrapper over the control socket: builds one command from the
//! arguments, sends it as a JSON line, and prints the response.
//!
//! Usage:
//!   chargeguardctl start [--target N] [--message TEXT] [--number N]
//!   chargeguardctl stop
//!   chargeguardctl stop-alarm
//!   chargeguardctl close
//!   chargeguardctl status

use anyhow::{Context, Result, bail};
use serde_json::{Value, json};
use std::io::{BufRead, BufReader, Write};
use std::os::unix::net::UnixStream;
use std::path::PathBuf;

fn socket_path() -> PathBuf {
    dirs::runtime_dir()
        .map(|dir| dir.join("chargeguard.sock"))
        .unwrap_or_else(|| PathBuf::from("/tmp/chargeguard.sock"))
}

fn build_command(args: &[String]) -> Result<Value> {
    let Some(verb) = args.first() else {
        bail!("usage: chargeguardctl <start|stop|stop-alarm|close|status> [options]");
    };

    match verb.as_str() {
        "start" => {
            let mut cmd = json!({ "cmd": "start" });
            let mut rest = args[1..].iter();
            while let Some(flag) = rest.next() {
                let value = rest
                    .next()
                    .with_context(|| format!("{} requires a value", flag))?;
                match flag.as_str() {
                    "--target" => {
                        let level: u8 = value
                            .parse()
                            .with_context(|| format!("invalid target level {:?}", value))?;
                        cmd["target_level"] = json!(level);
                    }
                    "--message" => cmd["custom_message"] = json!(value),
                    "--number" => {
                        cmd["whatsapp_number"] = json!(value);
                        cmd["whatsapp_enabled"] = json!(true);
                    }
                    other => bail!("unknown option {}", other),
                }
            }
            Ok(cmd)
        }
        "stop" => Ok(json!({ "cmd": "stop" })),
        "stop-alarm" => Ok(json!({ "cmd": "stop_alarm" })),
        "close" => Ok(json!({ "cmd": "close_alarm" })),
        "status" => Ok(json!({ "cmd": "status" })),
        other => bail!("unknown command {}", other),
    }
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = build_command(&args)?;

    let path = socket_path();
    let mut stream = UnixStream::connect(&path)
        .with_context(|| format!("cannot reach daemon at {}", path.display()))?;

    let mut line = serde_json::to_vec(&command)?;
    line.push(b'\n');
    stream.write_all(&line)?;

    let mut response = String::new();
    BufReader::new(&stream).read_line(&mut response)?;
    let response: Value =
        serde_json::from_str(response.trim()).context("malformed daemon response")?;

    if response["ok"].as_bool() == Some(true) {
        if let Some(state) = response["state"].as_str() {
            println!("{}", state);
        } else {
            println!("ok");
        }
        Ok(())
    } else {
        bail!(
            "{}",
            response["error"].as_str().unwrap_or("unknown daemon error")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_build_plain_commands() {
        assert_eq!(build_command(&args(&["stop"])).unwrap()["cmd"], "stop");
        assert_eq!(
            build_command(&args(&["stop-alarm"])).unwrap()["cmd"],
            "stop_alarm"
        );
        assert_eq!(
            build_command(&args(&["close"])).unwrap()["cmd"],
            "close_alarm"
        );
        assert_eq!(build_command(&args(&["status"])).unwrap()["cmd"], "status");
    }

    #[test]
    fn test_build_start_with_options() {
        let cmd = build_command(&args(&[
            "start", "--target", "85", "--number", "15551234567",
        ]))
        .unwrap();
        assert_eq!(cmd["cmd"], "start");
        assert_eq!(cmd["target_level"], 85);
        assert_eq!(cmd["whatsapp_number"], "15551234567");
        assert_eq!(cmd["whatsapp_enabled"], true);
    }

    #[test]
    fn test_build_rejects_bad_input() {
        assert!(build_command(&args(&[])).is_err());
        assert!(build_command(&args(&["explode"])).is_err());
        assert!(build_command(&args(&["start", "--target"])).is_err());
        assert!(build_command(&args(&["start", "--target", "lots"])).is_err());
    }
}

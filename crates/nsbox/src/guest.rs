use std::ffi::OsString;
use std::io::{Read, Write};
use std::os::fd::IntoRawFd;
use std::os::unix::process::CommandExt;
use std::process::Command;
use std::time::Instant;

use nsbox::frame::{FrameError, IpcChannel, Packet, VersionPacket};
use nsbox::transport::{fail_fast, PipeReader, PipeWriter};
use serde::Serialize;
use tracing::info;

use crate::exit::{FAILURE, SUCCESS};
use crate::output::{print_json, OutputFormat};

/// Environment variable carrying the guest's read descriptor.
pub const READ_FD_ENV: &str = "NSBOX_IPC_READ_FD";
/// Environment variable carrying the guest's write descriptor.
pub const WRITE_FD_ENV: &str = "NSBOX_IPC_WRITE_FD";

#[derive(Debug, Serialize)]
pub struct ProbeReport {
    pub version: String,
    pub echoed: bool,
    pub echo_id: i32,
    pub round_trip_us: u64,
    pub pid: u32,
    pub uid: u32,
    pub gid: u32,
    pub hostname: String,
}

impl ProbeReport {
    pub fn print(&self, format: OutputFormat) {
        match format {
            OutputFormat::Json => print_json(self),
            OutputFormat::Text => {
                println!("nsbox probe\n");
                println!("  Sent version: {}", self.version);
                println!(
                    "  Echo:         {} (id {}, {} us)",
                    if self.echoed { "ok" } else { "unexpected" },
                    self.echo_id,
                    self.round_trip_us
                );
                println!("  Identity:     pid={} uid={} gid={}", self.pid, self.uid, self.gid);
                println!("  Hostname:     {}", self.hostname);
            }
        }
    }
}

/// Advertise our version to the host and wait for the echo.
pub fn probe<R: Read, W: Write>(channel: &IpcChannel<R, W>) -> Result<ProbeReport, FrameError> {
    let sent = VersionPacket::current();
    let started = Instant::now();
    channel.send(&Packet::from(sent))?;
    let reply = channel.receive()?;
    let round_trip = started.elapsed();

    // SAFETY: getuid/getgid cannot fail.
    let (uid, gid) = unsafe { (libc::getuid(), libc::getgid()) };

    Ok(ProbeReport {
        version: format!("{}.{}.{}", sent.major, sent.minor, sent.patch),
        echoed: matches!(reply, Packet::Version(_)),
        echo_id: reply.id(),
        round_trip_us: u64::try_from(round_trip.as_micros()).unwrap_or(u64::MAX),
        pid: std::process::id(),
        uid,
        gid,
        hostname: hostname(),
    })
}

/// Child role of `nsbox run`.
///
/// With a guest command the process is replaced by it and the descriptors
/// are announced in [`READ_FD_ENV`] and [`WRITE_FD_ENV`]; without one the
/// built-in probe runs instead.
pub fn enter(guest: &[OsString], read: PipeReader, write: PipeWriter, format: OutputFormat) -> i32 {
    let Some((program, args)) = guest.split_first() else {
        return run_probe(IpcChannel::new(read, write), format);
    };

    let read_fd = read.into_raw_fd();
    let write_fd = write.into_raw_fd();
    info!(program = ?program, read_fd, write_fd, "starting guest");

    let err = Command::new(program)
        .args(args)
        .env(READ_FD_ENV, read_fd.to_string())
        .env(WRITE_FD_ENV, write_fd.to_string())
        .exec();
    fail_fast("exec guest", &err)
}

pub fn run_probe<R: Read, W: Write>(channel: IpcChannel<R, W>, format: OutputFormat) -> i32 {
    match probe(&channel) {
        Ok(report) => {
            report.print(format);
            if report.echoed {
                SUCCESS
            } else {
                FAILURE
            }
        }
        Err(err) => {
            eprintln!("error: probe: {err}");
            FAILURE
        }
    }
}

fn hostname() -> String {
    let mut buf = [0u8; 256];
    // SAFETY: `buf` is writable for its full length.
    let rc = unsafe { libc::gethostname(buf.as_mut_ptr().cast(), buf.len()) };
    if rc != 0 {
        return "unknown".to_string();
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    String::from_utf8_lossy(&buf[..len]).into_owned()
}

#[cfg(test)]
mod tests {
    use std::thread;

    use nsbox::transport::pipe;

    use super::*;

    #[test]
    fn probe_reports_echo() {
        let (read_a, write_a) = pipe().unwrap();
        let (read_b, write_b) = pipe().unwrap();
        let host = IpcChannel::new(read_a, write_b);
        let guest = IpcChannel::new(read_b, write_a);

        let echo = thread::spawn(move || {
            let packet = host.receive().unwrap();
            host.send(&packet).unwrap();
        });

        let report = probe(&guest).unwrap();
        echo.join().unwrap();

        assert!(report.echoed);
        assert_eq!(report.echo_id, 1);
        assert_eq!(report.version, env!("CARGO_PKG_VERSION"));
        assert_eq!(report.pid, std::process::id());
    }

    #[test]
    fn probe_fails_when_host_is_gone() {
        let channel = IpcChannel::new(std::io::empty(), std::io::sink());
        assert!(matches!(probe(&channel), Err(FrameError::Disconnected)));
        assert_eq!(
            run_probe(IpcChannel::new(std::io::empty(), std::io::sink()), OutputFormat::Text),
            FAILURE
        );
    }

    #[test]
    fn report_serializes_identity() {
        let report = ProbeReport {
            version: "0.1.0".to_string(),
            echoed: true,
            echo_id: 1,
            round_trip_us: 12,
            pid: 1,
            uid: 0,
            gid: 0,
            hostname: "sandbox".to_string(),
        };
        let json = serde_json::to_string(&report).expect("report should serialize");
        assert!(json.contains("\"echoed\":true"));
        assert!(json.contains("\"pid\":1"));
    }
}

use std::os::fd::RawFd;

use nsbox::frame::IpcChannel;

use crate::cmd::ProbeArgs;
use crate::exit::{frame_error, CliError, CliResult, FAILURE, SUCCESS, USAGE};
use crate::guest;
use crate::output::OutputFormat;

pub fn run(args: ProbeArgs, format: OutputFormat) -> CliResult<i32> {
    if args.read_fd == args.write_fd {
        return Err(CliError::new(
            USAGE,
            "read and write descriptors must differ",
        ));
    }
    ensure_open(args.read_fd)?;
    ensure_open(args.write_fd)?;

    // SAFETY: both descriptors are open and were handed to this process for
    // its exclusive use by the launcher.
    let channel = unsafe { IpcChannel::from_raw_fds(args.read_fd, args.write_fd) };
    let report = guest::probe(&channel).map_err(|err| frame_error("probe", err))?;
    report.print(format);

    Ok(if report.echoed { SUCCESS } else { FAILURE })
}

fn ensure_open(fd: RawFd) -> CliResult<()> {
    // SAFETY: F_GETFD only inspects the descriptor table.
    if fd < 0 || unsafe { libc::fcntl(fd, libc::F_GETFD) } == -1 {
        return Err(CliError::new(USAGE, format!("descriptor {fd} is not open")));
    }
    Ok(())
}

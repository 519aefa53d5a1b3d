use std::sync::Arc;

use nsbox::frame::IpcChannel;
use nsbox::launch::{LaunchConfig, Launcher, Namespaces};
use nsbox::pool::{PoolConfig, WorkerPool};
use nsbox::service::serve;
use nsbox::transport::{OrFailFast, PipeReader, PipeWriter};
use tracing::info;

use crate::cmd::RunArgs;
use crate::exit::{launch_error, pool_error, CliError, CliResult, SANDBOX_UNAVAILABLE, SUCCESS};
use crate::guest;
use crate::output::OutputFormat;

pub fn run(args: RunArgs, format: OutputFormat) -> CliResult<i32> {
    if !Launcher::is_supported() {
        return Err(CliError::new(
            SANDBOX_UNAVAILABLE,
            "user namespaces are not available on this host (try `nsbox doctor`)",
        ));
    }

    let pool_config = PoolConfig::new(args.workers, args.queue_capacity);
    pool_config
        .validate()
        .map_err(|err| pool_error("worker pool", err))?;

    let launch_config = launch_config(&args);
    launch_config
        .validate()
        .map_err(|err| launch_error("sandbox", err))?;

    let command = args.guest;
    Launcher::new(launch_config).launch(
        |child, read, write| host(child, read, write, pool_config),
        |read, write| guest::enter(&command, read, write, format),
    )
}

fn launch_config(args: &RunArgs) -> LaunchConfig {
    LaunchConfig {
        namespaces: Namespaces {
            uts: args.uts,
            ..Namespaces::default()
        },
        hostname: args.hostname.clone(),
        ..LaunchConfig::default()
    }
}

/// Parent role: serve the guest until it hangs up.
fn host(child: i32, read: PipeReader, write: PipeWriter, config: PoolConfig) -> i32 {
    let pool = WorkerPool::new(config).or_fail_fast("worker pool");
    let channel = Arc::new(IpcChannel::new(read, write));

    let served = serve(&channel, &pool).or_fail_fast("service loop");
    pool.shutdown().or_fail_fast("worker pool shutdown");

    info!(child, served, "sandbox finished");
    SUCCESS
}

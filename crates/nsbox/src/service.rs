use std::io::{Read, Write};
use std::sync::Arc;

use nsbox_frame::{FrameError, IpcChannel, Packet};
use nsbox_pool::{PoolError, WorkerPool};
use nsbox_transport::OrFailFast;
use tracing::{debug, info};

/// Errors that end the service loop.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Receiving or decoding a packet failed.
    #[error("receive failed: {0}")]
    Receive(#[source] FrameError),

    /// The pool refused a packet.
    #[error("dispatch failed: {0}")]
    Submit(#[from] PoolError),
}

pub type Result<T> = std::result::Result<T, ServiceError>;

/// Serve the guest until it disconnects on a frame boundary.
///
/// Each packet is handed to `pool`; responses go out from the worker thread
/// that handled it. A failed send aborts the process. Returns the number of
/// packets dispatched.
pub fn serve<R, W>(channel: &Arc<IpcChannel<R, W>>, pool: &WorkerPool) -> Result<u64>
where
    R: Read + Send + 'static,
    W: Write + Send + 'static,
{
    let mut served = 0;
    loop {
        let packet = match channel.receive() {
            Ok(packet) => packet,
            Err(FrameError::Disconnected) => {
                info!(served, "guest disconnected");
                return Ok(served);
            }
            Err(err) => return Err(ServiceError::Receive(err)),
        };

        debug!(id = packet.id(), "dispatching packet");
        let channel = Arc::clone(channel);
        pool.submit(move || dispatch(&channel, packet).or_fail_fast("send response"))?;
        served += 1;
    }
}

/// Handle a single packet.
pub fn dispatch<R: Read, W: Write>(
    channel: &IpcChannel<R, W>,
    packet: Packet,
) -> std::result::Result<(), FrameError> {
    match packet {
        // Echo the advertisement back unchanged.
        Packet::Version(version) => channel.send(&Packet::Version(version)),
    }
}

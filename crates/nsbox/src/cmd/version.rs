use nsbox::frame::{VersionPacket, MAX_PAYLOAD, VERSION_PACKET_ID};
use serde::Serialize;

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};
use crate::output::{print_json, OutputFormat};

#[derive(Serialize)]
struct VersionOutput {
    name: &'static str,
    version: &'static str,
    target: &'static str,
    protocol: ProtocolInfo,
}

#[derive(Serialize)]
struct ProtocolInfo {
    version_packet_id: i32,
    advertised: [i32; 3],
    max_payload: usize,
}

pub fn run(args: VersionArgs, format: OutputFormat) -> CliResult<i32> {
    let advertised = VersionPacket::current();
    let output = VersionOutput {
        name: "nsbox",
        version: env!("CARGO_PKG_VERSION"),
        target: option_env!("NSBOX_BUILD_TARGET").unwrap_or("unknown"),
        protocol: ProtocolInfo {
            version_packet_id: VERSION_PACKET_ID,
            advertised: [advertised.major, advertised.minor, advertised.patch],
            max_payload: MAX_PAYLOAD,
        },
    };

    match (format, args.extended) {
        (OutputFormat::Json, _) => print_json(&output),
        (OutputFormat::Text, false) => println!("{} {}", output.name, output.version),
        (OutputFormat::Text, true) => {
            println!("name: {}", output.name);
            println!("version: {}", output.version);
            println!("target: {}", output.target);
            println!("target_os: {}", std::env::consts::OS);
            println!("target_arch: {}", std::env::consts::ARCH);
            println!("version_packet_id: {}", output.protocol.version_packet_id);
            println!("max_payload: {}", output.protocol.max_payload);
        }
    }

    Ok(SUCCESS)
}

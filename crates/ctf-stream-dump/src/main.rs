#![forbid(unsafe_code)]

use std::fmt::Write as _;
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use ctf_packet::{DecodedPacket, PacketReader};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "ctf-stream-dump",
    about = "Print the packets of a trace stream file written by the file platform backend."
)]
struct Args {
    /// Stream file to read
    stream: PathBuf,

    /// Print one JSON object per packet
    #[arg(long, action = clap::ArgAction::SetTrue)]
    json: bool,

    /// Skip the per-event lines
    #[arg(long, action = clap::ArgAction::SetTrue)]
    headers_only: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let file = File::open(&args.stream)
        .with_context(|| format!("failed to open {}", args.stream.display()))?;
    let mut reader = PacketReader::new(BufReader::new(file));

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut packets = 0u64;
    while let Some(packet) = reader
        .next_packet()
        .with_context(|| format!("failed to decode packet #{packets}"))?
    {
        if args.json {
            serde_json::to_writer(&mut out, &packet)?;
            writeln!(out)?;
        } else {
            write_packet(&mut out, &packet, args.headers_only)?;
        }
        packets += 1;
    }

    tracing::info!(packets, path = %args.stream.display(), "stream dumped");
    Ok(())
}

fn write_packet(out: &mut impl Write, packet: &DecodedPacket, headers_only: bool) -> io::Result<()> {
    let h = &packet.header;
    writeln!(
        out,
        "packet {}: stream={} size={} content={} ts=[{}, {}] discarded={} events={}",
        h.sequence_number,
        h.stream_id,
        h.packet_size(),
        h.content_size(),
        h.beginning_timestamp,
        h.end_timestamp,
        h.events_discarded,
        packet.events.len()
    )?;
    if headers_only {
        return Ok(());
    }
    for event in &packet.events {
        let mut payload = String::with_capacity(event.payload.len() * 2);
        for b in &event.payload {
            let _ = write!(payload, "{b:02x}");
        }
        writeln!(
            out,
            "  event id={} ts={} payload={}",
            event.id, event.timestamp, payload
        )?;
    }
    Ok(())
}

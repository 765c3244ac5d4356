//! Dissect hex encoded packets given on the command line, or one per line on stdin.
//!
//! ```sh
//! cargo run --example dissect_hex -- --pretty 333300000001000c29a1b2c386dd...
//! ```

use std::io::BufRead;

use clap::Parser;

use lancet::transactions::TransactionTracker;
use lancet::{EncapType, Packet, Registry, ENCAP_TYPE_ETH};

#[derive(Parser, Debug)]
struct Cli {
    /// Encapsulation type of the packets (libpcap link type).
    #[arg(short, long, default_value_t = ENCAP_TYPE_ETH)]
    encap: EncapType,

    /// Pretty print the JSON output.
    #[arg(short, long)]
    pretty: bool,

    /// Print request/response matches of DNS and ICMPv6 echo transactions.
    #[arg(short, long)]
    transactions: bool,

    /// Hex encoded packets. Read from stdin when none are given.
    packets: Vec<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let registry = Registry::with_defaults()?;
    let tracker = TransactionTracker::new();

    let packets = if cli.packets.is_empty() {
        std::io::stdin()
            .lock()
            .lines()
            .collect::<Result<Vec<_>, _>>()?
    } else {
        cli.packets
    };

    for (frame, packet) in packets.iter().enumerate() {
        let packet = packet.trim();
        if packet.is_empty() {
            continue;
        }

        let bytes = hex::decode(packet)?;
        let p = Packet::from_bytes(&registry, &bytes, cli.encap)?.with_frame(frame as u64 + 1);

        let output = if cli.pretty {
            serde_json::to_string_pretty(&p)?
        } else {
            serde_json::to_string(&p)?
        };
        println!("{}", output);

        if cli.transactions {
            for transaction in p.track_transactions(&tracker) {
                println!("{}", serde_json::to_string(&transaction)?);
            }
        }
    }

    Ok(())
}

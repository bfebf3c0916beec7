//! pgpcore packet inspector
//!
//! Prints one line per packet of a binary or ASCII-armored OpenPGP file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use pgpcore::armor::{self, DecodeOptions};
use pgpcore::{CryptoEngine, Message, Packet, Result, RustCryptoEngine};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Command line arguments
struct Args {
    file: PathBuf,
    verify_crc: bool,
}

fn parse_args() -> Args {
    let args: Vec<String> = env::args().collect();

    let mut file = None;
    let mut verify_crc = true;
    for arg in &args[1..] {
        match arg.as_str() {
            "-h" | "--help" => {
                print_usage();
                process::exit(0);
            }
            "--no-crc" => verify_crc = false,
            flag if flag.starts_with('-') => {
                eprintln!("Error: Unknown option '{}'", flag);
                print_usage();
                process::exit(1);
            }
            path if file.is_none() => file = Some(PathBuf::from(path)),
            _ => {
                eprintln!("Error: expected a single file");
                process::exit(1);
            }
        }
    }

    let Some(file) = file else {
        print_usage();
        process::exit(1);
    };
    Args { file, verify_crc }
}

fn print_usage() {
    println!("pgpcore - OpenPGP packet inspector");
    println!();
    println!("Usage: pgpcore [--no-crc] <file>");
    println!();
    println!("Options:");
    println!("  --no-crc    Do not verify the armor checksum");
    println!();
    println!("Set RUST_LOG=pgpcore=debug to trace packet headers.");
}

fn read_message(path: &Path, verify_crc: bool) -> Result<Message> {
    let data = fs::read(path)?;
    if !armor::is_armored(&data) {
        return Message::parse(&data);
    }

    let options = DecodeOptions {
        verify_crc,
        ..DecodeOptions::default()
    };
    let armored = armor::decode(&String::from_utf8_lossy(&data), &options)?;
    info!(
        armor_type = %armored.armor_type,
        bytes = armored.data.len(),
        "dearmored input"
    );
    Message::parse(&armored.data)
}

fn describe_key(packet: &Packet, engine: &dyn CryptoEngine) -> Result<Option<String>> {
    let Some(key) = packet.public_key() else {
        return Ok(None);
    };
    Ok(Some(format!(
        "key id {}, fingerprint {}",
        key.key_id(engine)?,
        key.fingerprint(engine)?
    )))
}

fn run(args: &Args) -> Result<()> {
    let message = read_message(&args.file, args.verify_crc)?;
    let engine = RustCryptoEngine::new();

    for (index, packet) in message.iter().enumerate() {
        println!("{:>3}: {}", index, packet);
        if let Some(details) = describe_key(packet, &engine)? {
            println!("     {}", details);
        }
    }
    info!(packets = message.len(), file = %args.file.display(), "done");
    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "pgpcore=info".into()),
        )
        .init();

    let args = parse_args();
    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

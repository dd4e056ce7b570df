//! Anchor CLI.
//!
//! Initializes an in-memory anchor, inserts leaves `sha256(i as u64 LE)` for
//! `i` in `0..N` and checks an inclusion proof for the first one.
//!
//! Usage:
//!   cargo run --bin anchor-cli -- --leaves 5 [--max-leaves 256] [--config anchor.json] [--json]

use std::env;
use std::sync::mpsc;

use merkle_anchor::anchor::AnchorEvent;
use merkle_anchor::runtime::{AnchorService, AuthorityOnly, MemoryStore};
use merkle_anchor::utils::sha256;
use merkle_anchor::{Address, AnchorConfig, Leaf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct Args {
    leaves: usize,
    max_leaves: Option<usize>,
    config_path: Option<String>,
    json: bool,
}

fn parse_args() -> Result<Args, String> {
    let args: Vec<String> = env::args().collect();
    let mut parsed = Args {
        leaves: 5,
        max_leaves: None,
        config_path: None,
        json: false,
    };

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--leaves" => {
                i += 1;
                parsed.leaves = parse_number(args.get(i), "--leaves")?;
            }
            "--max-leaves" => {
                i += 1;
                parsed.max_leaves = Some(parse_number(args.get(i), "--max-leaves")?);
            }
            "--config" => {
                i += 1;
                parsed.config_path = Some(args.get(i).ok_or("--config needs a path")?.clone());
            }
            "--json" => parsed.json = true,
            other => return Err(format!("unknown argument: {}", other)),
        }
        i += 1;
    }
    Ok(parsed)
}

fn parse_number(value: Option<&String>, flag: &str) -> Result<usize, String> {
    value
        .ok_or_else(|| format!("{} needs a value", flag))?
        .parse()
        .map_err(|e| format!("{}: {}", flag, e))
}

/// Distinct, non-zero leaf for every index.
fn leaf_for(index: usize) -> Leaf {
    sha256(&(index as u64).to_le_bytes())
}

fn main() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = match parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("{}", e);
            eprintln!("Usage: anchor-cli [--leaves N] [--max-leaves M] [--config PATH] [--json]");
            std::process::exit(2);
        }
    };

    if let Err(e) = run(args) {
        eprintln!("anchor-cli failed: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> merkle_anchor::Result<()> {
    let mut config = match &args.config_path {
        Some(path) => AnchorConfig::from_file(path)?,
        None => AnchorConfig::default(),
    };
    if let Some(max) = args.max_leaves {
        config.max_leaves = max;
    }

    let (tx, rx) = mpsc::channel::<AnchorEvent>();
    let service = AnchorService::with_parts(MemoryStore::new(), AuthorityOnly, config, tx)?;

    let authority = Address::new([0xA1; 32]);
    let record = Address::new([0x01; 32]);
    tracing::info!(record = %record, max_leaves = service.config().max_leaves, "creating anchor");
    service.initialize(record, authority)?;

    for i in 0..args.leaves {
        service.insert_leaf(&record, &authority, leaf_for(i))?;

        for event in rx.try_iter() {
            if args.json {
                println!("{}", event.to_json()?);
            } else {
                let AnchorEvent::LeafInserted(e) = event;
                println!("leaf {}: index={} root={}", i, e.index, hex::encode(e.root));
            }
        }
    }

    let state = service.state(&record)?;
    println!("final root:  {}", hex::encode(state.root()));
    println!("leaf count:  {}", state.leaf_count());

    if state.leaf_count() > 0 {
        let proof = service.prove(&record, 0)?;
        service.verify(&record, &proof)?;
        println!("proof for leaf 0 ({} steps): valid", proof.depth());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_leaves_stay_distinct_past_one_byte() {
        let leaves: HashSet<Leaf> = (0..1024).map(leaf_for).collect();
        assert_eq!(leaves.len(), 1024);
        assert!(!leaves.contains(&merkle_anchor::ZERO_DIGEST));
    }

    #[test]
    fn test_strict_config_accepts_many_leaves() {
        let config = AnchorConfig {
            max_leaves: 300,
            reject_zero_leaf: true,
        };
        let service = AnchorService::new(MemoryStore::new(), config).unwrap();
        let authority = Address::new([0xA1; 32]);
        let record = Address::new([0x01; 32]);
        service.initialize(record, authority).unwrap();

        for i in 0..300 {
            service.insert_leaf(&record, &authority, leaf_for(i)).unwrap();
        }
        assert_eq!(service.state(&record).unwrap().leaf_count(), 300);
    }
}

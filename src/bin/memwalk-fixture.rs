//! Test fixture: holds known byte sequences in its heap until stdin closes.
//!
//! Usage: `memwalk-fixture <needle-hex> <block-len>`
//!
//! Prints one line per planted buffer, `<label> 0x<address> <len>`, then
//! `ready`, and blocks until stdin reaches end of file.

use anyhow::{bail, Context, Result};
use std::hint::black_box;
use std::io::{self, BufRead, Write};
use tracing::info;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(needle_hex), Some(block_len)) = (args.next(), args.next()) else {
        bail!("usage: memwalk-fixture <needle-hex> <block-len>");
    };

    // Decoded at runtime so the only copy of the raw bytes lives on the heap
    let needle = hex::decode(&needle_hex).context("needle is not valid hex")?;
    let block_len: usize = block_len.parse().context("block length is not a number")?;
    let block: Vec<u8> = (0..block_len).map(|i| (i % 251) as u8).collect();

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "needle {:#x} {}", needle.as_ptr() as usize, needle.len())?;
    writeln!(stdout, "block {:#x} {}", block.as_ptr() as usize, block.len())?;
    writeln!(stdout, "ready")?;
    stdout.flush()?;
    drop(stdout);
    info!(needle = %needle_hex, block_len, "fixture ready");

    let mut line = String::new();
    let stdin = io::stdin();
    while stdin.lock().read_line(&mut line)? > 0 {
        line.clear();
    }

    black_box(&needle);
    black_box(&block);
    Ok(())
}

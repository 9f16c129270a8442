//! Shared helpers for tests that inspect a live fixture process

#![allow(dead_code)]

use anyhow::{anyhow, bail, Context, Result};
use memwalk::Address;
use std::collections::HashMap;
use std::io::{BufRead, BufReader};
use std::process::{Child, ChildStdin, Command, Stdio};

/// Running `memwalk-fixture`, killed when dropped
pub struct Fixture {
    child: Child,
    _stdin: ChildStdin,
    buffers: HashMap<String, (Address, usize)>,
}

impl Fixture {
    /// Spawns the fixture and waits for its `ready` line
    pub fn spawn(needle: &[u8], block_len: usize) -> Result<Self> {
        let mut child = Command::new(env!("CARGO_BIN_EXE_memwalk-fixture"))
            .arg(hex::encode(needle))
            .arg(block_len.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .spawn()
            .context("spawning memwalk-fixture")?;

        let stdin = child.stdin.take().ok_or_else(|| anyhow!("no stdin pipe"))?;
        let stdout = child.stdout.take().ok_or_else(|| anyhow!("no stdout pipe"))?;

        let mut fixture = Fixture {
            child,
            _stdin: stdin,
            buffers: HashMap::new(),
        };
        for line in BufReader::new(stdout).lines() {
            let line = line?;
            if line == "ready" {
                return Ok(fixture);
            }
            let mut fields = line.split_whitespace();
            let (Some(label), Some(address), Some(len)) = (fields.next(), fields.next(), fields.next())
            else {
                bail!("unexpected fixture output: {line}");
            };
            let address = usize::from_str_radix(address.trim_start_matches("0x"), 16)?;
            fixture
                .buffers
                .insert(label.to_string(), (Address::new(address), len.parse()?));
        }
        bail!("fixture exited before becoming ready")
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Address and length of a planted buffer
    pub fn buffer(&self, label: &str) -> (Address, usize) {
        self.buffers[label]
    }
}

impl Drop for Fixture {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// A needle unlikely to occur anywhere else in the fixture
pub fn unique_needle() -> Vec<u8> {
    let mut needle = vec![0x0c, 0x0a, 0x0f, 0x0e];
    needle.extend_from_slice(&std::process::id().to_le_bytes());
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    needle.extend_from_slice(&nanos.to_le_bytes());
    needle.extend_from_slice(&[0xde, 0xad, 0xbe, 0xef]);
    needle
}

//! Network topology: the static set of miners and who forwards blocks to whom.
//!
//! The topology file has one miner per line: a name, a hash rate, then pairs of peer name
//! and delay (time to send a block to that peer). Blank lines and lines whose first field
//! is `#` are ignored.

use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use rand::Rng;

use super::{BlockId, MinerIndex, GENESIS_ID};

/// Outbound link: blocks are forwarded to `miner` after `delay`.
#[derive(Debug, Clone, PartialEq)]
pub struct Peer {
    pub miner: MinerIndex,
    pub delay: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Miner {
    pub name: String,
    /// Position in the topology file.
    pub index: MinerIndex,
    pub hashrate: f64,
    /// Total blocks mined, including the ones lost to reorgs.
    pub mined: u64,
    /// Blocks mined that ended up in the best chain.
    pub credit: u64,
    pub peers: Vec<Peer>,
    /// Block this miner is trying to mine onto.
    pub tip: BlockId,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    pub miners: Vec<Miner>,
    pub total_hashrate: f64,
}

impl Network {
    /// Reads topology from file at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open failed: {}", path.display()))?;
        Self::parse(BufReader::new(file))
    }

    /// Parses topology from `input`.
    pub fn parse<B: BufRead>(input: B) -> Result<Self> {
        let mut lines: Vec<Vec<String>> = Vec::new();
        let mut index: HashMap<String, MinerIndex> = HashMap::new();
        for line in input.lines() {
            let line = line?;
            let fields: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            if fields.is_empty() || fields[0] == "#" {
                continue;
            }
            if index.contains_key(&fields[0]) {
                bail!("duplicate miner name: {}", fields[0]);
            }
            index.insert(fields[0].clone(), lines.len());
            lines.push(fields);
        }
        ensure!(!lines.is_empty(), "no miners");

        // Peers may name miners defined further down, so indices are resolved in a second pass.
        let mut miners = Vec::with_capacity(lines.len());
        let mut total_hashrate = 0.0;
        for (i, fields) in lines.iter().enumerate() {
            let name = &fields[0];
            let rate = fields
                .get(1)
                .ok_or_else(|| anyhow!("missing hashrate: {}", name))?;
            let hashrate: f64 = rate
                .parse()
                .with_context(|| format!("bad hashrate: {}", rate))?;
            ensure!(hashrate > 0.0, "hashrate must be greater than zero: {}", rate);
            total_hashrate += hashrate;

            let pairs = &fields[2..];
            ensure!(pairs.len() % 2 == 0, "bad peer delay pairs: {} {:?}", name, pairs);
            let mut peers = Vec::with_capacity(pairs.len() / 2);
            for pair in pairs.chunks(2) {
                let miner = *index
                    .get(&pair[0])
                    .ok_or_else(|| anyhow!("no such miner: {}", pair[0]))?;
                let delay: f64 = pair[1]
                    .parse()
                    .with_context(|| format!("bad delay: {}", pair[1]))?;
                peers.push(Peer { miner, delay });
            }

            miners.push(Miner {
                name: name.clone(),
                index: i,
                hashrate,
                mined: 0,
                credit: 0,
                peers,
                tip: GENESIS_ID,
            });
        }
        debug!("{} miners, total hashrate {}", miners.len(), total_hashrate);

        Ok(Network { miners, total_hashrate })
    }
}

/// Writes a random fully connected topology in the file format read by [`Network::parse`].
/// Hash rates are whole numbers in 1..=100, delays are in [0, max_delay].
pub fn write_random_topology<W: Write, R: Rng + ?Sized>(
    out: &mut W,
    miners: usize,
    max_delay: f64,
    rng: &mut R,
) -> io::Result<()> {
    for m in 0..miners {
        write!(out, "m{} {}", m, rng.gen_range(1..=100u32))?;
        for p in (0..miners).filter(|p| *p != m) {
            write!(out, " m{} {:.2}", p, rng.gen_range(0.0..=max_delay))?;
        }
        writeln!(out)?;
    }
    Ok(())
}
